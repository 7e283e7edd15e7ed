//! 吹き出しレンダラー
//!
//! テキストを指定幅で折り返し、cowsay 風の吹き出しで囲んで
//! その下にフィギュア（AA）を出力する。
//!
//! ```text
//!   ____
//! < hi >
//!   ----
//!         \   ^__^
//! ```

use std::io::{self, Write};

use tracing::{debug, warn};

use crate::figure::Figure;

/// 吹き出しのデフォルト幅（文字数）
pub const DEFAULT_WIDTH: usize = 40;

/// 1 行を単語単位で貪欲に折り返す。
///
/// 単語は空白区切りで、出力では半角スペース 1 つで連結する。
/// `width` より長い単語は分割せず、その単語だけで 1 行とする。
fn wrap_line(line: &str, width: usize) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in line.split_whitespace() {
        let word_len = word.chars().count();
        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= width {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            segments.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        }
    }

    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// テキストを吹き出しの中身となる行に変換する。
///
/// - 改行で分割し、空行は空行として残す
/// - 各行を `width` 文字以内に折り返す（0 以下は 1 として扱う）
/// - 結果が空なら空行 1 つにする
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);

    let mut wrapped: Vec<String> = Vec::new();
    for line in text.lines() {
        let segments = wrap_line(line, width);
        if segments.is_empty() {
            // 空行（空白のみの行を含む）は保持する
            wrapped.push(String::new());
        } else {
            wrapped.extend(segments);
        }
    }

    if wrapped.is_empty() {
        wrapped.push(String::new());
    }
    wrapped
}

/// 吹き出し部分（上枠・本文・下枠）の行を組み立てる。フィギュアは含まない。
pub fn render_lines(text: &str, width: usize) -> Vec<String> {
    let wrapped = wrap_text(text, width);
    let max_length = wrapped
        .iter()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0);

    let mut lines = Vec::with_capacity(wrapped.len() + 2);
    lines.push(format!("  {}", "_".repeat(max_length + 2)));
    for line in &wrapped {
        // `{:<width$}` は文字数でパディングする
        lines.push(format!("< {line:<max_length$} >"));
    }
    lines.push(format!("  {}", "-".repeat(max_length + 2)));

    debug!(
        content_lines = wrapped.len(),
        max_length = max_length,
        width = width,
        "Bubble rendered"
    );
    lines
}

/// 吹き出しとフィギュアを任意の Writer に書き出す。
pub fn write_bubble<W: Write>(
    out: &mut W,
    text: &str,
    figure: &Figure,
    width: usize,
) -> io::Result<()> {
    for line in render_lines(text, width) {
        writeln!(out, "{line}")?;
    }
    writeln!(out, "{figure}")?;
    out.flush()
}

/// 吹き出しとフィギュアを標準出力に表示する。
pub fn print_bubble(text: &str, figure: &Figure, width: usize) {
    let stdout = io::stdout();
    let mut lock = stdout.lock();
    if let Err(e) = write_bubble(&mut lock, text, figure, width) {
        // stdout が閉じられている場合（パイプ先の終了など）は表示しようがない
        warn!(error = %e, "Failed to write bubble to stdout");
    }
}
