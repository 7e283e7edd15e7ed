use std::path::PathBuf;

use clap::Parser;

use crate::ai::{ResponseMode, ResponseSettings};
use crate::config::CowpilotConfig;

/// Ask an LLM a question and let a cow say the answer.
#[derive(Parser, Debug)]
#[command(name = "cowpilot", version, about)]
pub struct Cli {
    /// Path to a custom .cow file
    #[arg(long, value_name = "PATH")]
    pub cow: Option<PathBuf>,

    /// Model identifier sent to the chat completion API
    #[arg(long)]
    pub model: Option<String>,

    /// Maximum number of tokens in the response
    #[arg(long, value_name = "N")]
    pub max_tokens: Option<u32>,

    /// Sampling temperature
    #[arg(long, value_name = "T")]
    pub temperature: Option<f32>,

    /// Bubble width in characters
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub width: Option<u16>,

    /// Wait for the full response instead of streaming tokens
    #[arg(long)]
    pub no_stream: bool,

    /// Prompt to send to the LLM (asked interactively when omitted)
    pub prompt: Vec<String>,
}

/// CLI 引数と設定ファイルをマージした実行時オプション
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    pub settings: ResponseSettings,
    pub mode: ResponseMode,
    pub width: usize,
    /// 使用する .cow ファイル。`None` ならデフォルトの牛
    pub cow: Option<PathBuf>,
    pub api_base: Option<String>,
}

impl Cli {
    /// 位置引数を半角スペースで連結したプロンプト。位置引数が無ければ `None`。
    pub fn prompt_text(&self) -> Option<String> {
        if self.prompt.is_empty() {
            None
        } else {
            Some(self.prompt.join(" "))
        }
    }

    /// CLI 引数 > 設定ファイル > デフォルト値 の優先順位でオプションを決定する。
    pub fn resolve(&self, config: &CowpilotConfig) -> RunOptions {
        let settings = ResponseSettings {
            model: self.model.clone().unwrap_or_else(|| config.ai.model.clone()),
            max_tokens: self.max_tokens.unwrap_or(config.ai.max_tokens),
            temperature: self.temperature.unwrap_or(config.ai.temperature),
        };

        RunOptions {
            settings,
            mode: ResponseMode::from_stream_flag(config.ai.stream && !self.no_stream),
            width: self
                .width
                .map(usize::from)
                .unwrap_or(config.bubble.width)
                .max(1),
            cow: self.cow.clone().or_else(|| config.bubble.cow.clone()),
            api_base: config.ai.api_base.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("cowpilot").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn positional_args_are_joined_with_spaces() {
        let cli = parse(&["tell", "me", "a", "joke"]);
        assert_eq!(cli.prompt_text().as_deref(), Some("tell me a joke"));
    }

    #[test]
    fn no_positional_args_means_interactive() {
        let cli = parse(&[]);
        assert!(cli.prompt_text().is_none());
    }

    #[test]
    fn cow_flag_is_parsed() {
        let cli = parse(&["--cow", "/tmp/tux.cow", "hello"]);
        assert_eq!(cli.cow, Some(PathBuf::from("/tmp/tux.cow")));
        assert_eq!(cli.prompt_text().as_deref(), Some("hello"));
    }

    #[test]
    fn zero_width_is_rejected() {
        let result = Cli::try_parse_from(["cowpilot", "--width", "0", "hi"]);
        assert!(result.is_err());
    }

    #[test]
    fn defaults_come_from_config() {
        let cli = parse(&["hi"]);
        let options = cli.resolve(&CowpilotConfig::default());

        assert_eq!(options.settings.model, "gpt-4o");
        assert_eq!(options.settings.max_tokens, 100);
        assert_eq!(options.mode, ResponseMode::Incremental);
        assert_eq!(options.width, 40);
        assert!(options.cow.is_none());
        assert!(options.api_base.is_none());
    }

    #[test]
    fn flags_override_config() {
        let mut config = CowpilotConfig::default();
        config.bubble.cow = Some(PathBuf::from("/config/default.cow"));
        config.bubble.width = 60;

        let cli = parse(&[
            "--cow",
            "/cli/tux.cow",
            "--model",
            "gpt-4o-mini",
            "--max-tokens",
            "300",
            "--temperature",
            "0.2",
            "--width",
            "20",
            "--no-stream",
            "hi",
        ]);
        let options = cli.resolve(&config);

        assert_eq!(options.settings.model, "gpt-4o-mini");
        assert_eq!(options.settings.max_tokens, 300);
        assert!((options.settings.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(options.width, 20);
        assert_eq!(options.mode, ResponseMode::SingleShot);
        assert_eq!(options.cow, Some(PathBuf::from("/cli/tux.cow")));
    }

    #[test]
    fn config_can_disable_streaming_and_set_cow() {
        let mut config = CowpilotConfig::default();
        config.ai.stream = false;
        config.bubble.cow = Some(PathBuf::from("/config/default.cow"));
        config.bubble.width = 0;

        let options = parse(&["hi"]).resolve(&config);
        assert_eq!(options.mode, ResponseMode::SingleShot);
        assert_eq!(options.cow, Some(PathBuf::from("/config/default.cow")));
        // 設定ファイルの幅 0 は 1 に丸める
        assert_eq!(options.width, 1);
    }
}
