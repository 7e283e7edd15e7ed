use std::io::{self, BufRead, IsTerminal, Write};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use super::color::{cyan, white};
use crate::error::CowError;

/// プロンプト未指定時に表示する質問
const QUESTION: &str = "What would you like to ask the AI? ";

/// AI の応答待ちに表示するスピナーを生成・開始する。
/// indicatif のスピナーは stderr に描画されるため、stdout の吹き出しを汚さない。
pub fn cow_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("🐮 {spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(white("thinking..."));
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// 質問を表示して 1 行読み取る。末尾の改行は取り除く。
///
/// `colored` が false のときは ANSI エスケープを付けずに質問を出す。
/// EOF の場合は空文字列を返す。
pub fn read_prompt<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    colored: bool,
) -> Result<String, CowError> {
    let question = if colored {
        cyan(QUESTION)
    } else {
        QUESTION.to_string()
    };
    write!(output, "{question}").map_err(CowError::Input)?;
    output.flush().map_err(CowError::Input)?;

    let mut line = String::new();
    input.read_line(&mut line).map_err(CowError::Input)?;
    Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

/// 標準入力から対話的にプロンプトを読み取る。
/// stdout がパイプやファイルの場合は色を付けない。
pub fn ask_prompt() -> Result<String, CowError> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    let colored = output.is_terminal();
    read_prompt(&mut input, &mut output, colored)
}

/// ストリーミング表示と吹き出しの間に空行を入れる。
pub fn print_stream_gap() {
    println!();
}
