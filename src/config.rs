//! 設定ファイル管理
//!
//! `~/.config/cowpilot/config.toml` から TOML 形式の設定を読み込む。
//! ファイルが存在しない場合はデフォルト値を使用する。
//!
//! # 設定ファイル例
//!
//! ```toml
//! [ai]
//! model = "gpt-4o"
//! max_tokens = 100
//! temperature = 0.7
//! stream = true
//!
//! [bubble]
//! width = 40
//! cow = "/usr/share/cowsay/cows/tux.cow"
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::bubble::DEFAULT_WIDTH;

/// cowpilot の設定全体
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CowpilotConfig {
    /// AI 関連設定
    pub ai: AiConfig,
    /// 吹き出し関連設定
    pub bubble: BubbleConfig,
}

/// AI 関連の設定
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// 使用する AI モデル名
    pub model: String,
    /// 応答の最大トークン数
    pub max_tokens: u32,
    pub temperature: f32,
    /// ストリーミングで逐次表示するかどうか
    pub stream: bool,
    /// OpenAI 互換エンドポイントを使う場合のベース URL
    pub api_base: Option<String>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            max_tokens: 100,
            temperature: 0.7,
            stream: true,
            api_base: None,
        }
    }
}

/// 吹き出し関連の設定
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BubbleConfig {
    /// 折り返し幅（文字数）
    pub width: usize,
    /// デフォルトで使う .cow ファイル
    pub cow: Option<PathBuf>,
}

impl Default for BubbleConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            cow: None,
        }
    }
}

/// 初回起動時に書き出す設定テンプレート。値はすべてコメントアウトしてある
const TEMPLATE: &str = r#"# cowpilot configuration
#
# Command line flags take precedence over these values.

[ai]
# model = "gpt-4o"
# max_tokens = 100
# temperature = 0.7
# stream = true
# api_base = "https://api.openai.com/v1"

[bubble]
# width = 40
# cow = "/path/to/custom.cow"
"#;

/// 設定ファイルを使えなかった理由
#[derive(Error, Debug)]
enum ConfigFileError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid TOML in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl CowpilotConfig {
    /// `~/.config/cowpilot/config.toml` の設定を返す。
    ///
    /// 設定ファイルの不備で起動を止めることはせず、常に何らかの設定を返す。
    pub fn load() -> Self {
        Self::load_or_default(&Self::config_path())
    }

    /// `$HOME/.config/cowpilot/config.toml`。`$HOME` が無ければカレントディレクトリ基準。
    pub fn config_path() -> PathBuf {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(".config/cowpilot/config.toml")
    }

    /// `path` の設定を読む。
    ///
    /// - ファイルが無い: テンプレートを書き出し、デフォルト値
    /// - 読めない・TOML として不正: stderr に警告し、デフォルト値
    fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            match write_template(path) {
                Ok(()) => info!(path = %path.display(), "Wrote config template"),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Could not write config template");
                    eprintln!("cowpilot: warning: could not write {}: {e}", path.display());
                }
            }
            return Self::default();
        }

        match Self::from_file(path) {
            Ok(config) => {
                info!(
                    path = %path.display(),
                    model = %config.ai.model,
                    max_tokens = config.ai.max_tokens,
                    stream = config.ai.stream,
                    width = config.bubble.width,
                    custom_cow = config.bubble.cow.is_some(),
                    "Config loaded"
                );
                config
            }
            Err(e) => {
                warn!(error = %e, "Config file ignored, using defaults");
                eprintln!("cowpilot: warning: {e} (using defaults)");
                Self::default()
            }
        }
    }

    fn from_file(path: &Path) -> Result<Self, ConfigFileError> {
        debug!(path = %path.display(), "Reading config file");
        let content = fs::read_to_string(path).map_err(|source| ConfigFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigFileError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// テンプレートを `path` に書き出す。親ディレクトリが無ければ作る。
fn write_template(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, TEMPLATE)
}
