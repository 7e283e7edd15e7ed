mod ai;
mod bubble;
mod cli;
mod config;
mod error;
mod figure;
mod logging;

use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, info, warn};

use ai::{CowpilotAI, ResponseMode};
use cli::args::{Cli, RunOptions};
use config::CowpilotConfig;
use error::CowError;
use figure::Figure;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // .env ファイルから環境変数を読み込む
    dotenvy::dotenv().ok();

    // ログシステムの初期化（_guard は main 終了まで保持する必要がある）
    let _guard = logging::init_logging();
    info!("cowpilot started");

    let args = Cli::parse();
    let config = CowpilotConfig::load();
    let options = args.resolve(&config);
    debug!(options = ?options, "Options resolved");

    // 解決済みのフィギュア。解決前に失敗した場合はデフォルトの牛でエラーを表示する
    let mut figure: Option<Figure> = None;

    match run(&args, &options, &mut figure).await {
        Ok(()) => {
            info!("cowpilot finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            warn!(error = %e, figure_resolved = figure.is_some(), "cowpilot failed");
            let stdout = io::stdout();
            if let Err(write_err) = present_error(&mut stdout.lock(), &e, figure, options.width) {
                warn!(error = %write_err, "Failed to write error bubble to stdout");
            }
            ExitCode::FAILURE
        }
    }
}

/// プロンプト取得 → フィギュア解決 → AI 応答 → 吹き出し表示 を行う。
///
/// フィギュアを解決した時点で `resolved` に格納し、以降のエラー表示に使わせる。
async fn run(
    args: &Cli,
    options: &RunOptions,
    resolved: &mut Option<Figure>,
) -> Result<(), CowError> {
    let prompt = match args.prompt_text() {
        Some(p) => p,
        None => cli::cow::ask_prompt()?,
    };
    debug!(prompt_length = prompt.len(), interactive = args.prompt.is_empty(), "Prompt resolved");

    let figure = resolved.insert(match options.cow {
        Some(ref path) => Figure::load(path)?,
        None => Figure::default(),
    });

    let ai = CowpilotAI::from_env(options.api_base.as_deref())?;
    let response = ai.respond(&prompt, &options.settings, options.mode).await?;

    if options.mode == ResponseMode::Incremental {
        cli::cow::print_stream_gap();
    }
    bubble::print_bubble(&response, figure, options.width);
    Ok(())
}

/// エラーを吹き出しとして書き出す。フィギュア未解決ならデフォルトの牛を使う。
fn present_error<W: Write>(
    out: &mut W,
    err: &CowError,
    resolved: Option<Figure>,
    width: usize,
) -> io::Result<()> {
    let figure = resolved.unwrap_or_default();
    bubble::write_bubble(out, &err.bubble_text(), &figure, width)
}
