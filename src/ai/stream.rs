//! AI ストリーミングレスポンス処理
//!
//! OpenAI API からのストリーミングレスポンスをテキスト片の列に変換し、
//! 受信順に表示しながら全文を組み立てる。

use std::io::{self, Write};

use async_openai::types::CreateChatCompletionStreamResponse;
use futures_util::{Stream, StreamExt};
use indicatif::ProgressBar;
use tracing::{debug, warn};

use crate::error::CowError;

/// ストリームの 1 チャンクからテキスト片を取り出す。
///
/// 先頭の choice の `delta.content` を使い、無ければ空文字列とする。
pub fn fragment_of(response: &CreateChatCompletionStreamResponse) -> String {
    response
        .choices
        .first()
        .and_then(|choice| choice.delta.content.clone())
        .unwrap_or_default()
}

/// テキスト片を書き出してすぐに flush する。
fn emit<W: Write>(out: &mut W, text: &str) -> io::Result<()> {
    out.write_all(text.as_bytes())?;
    out.flush()
}

/// 表示用 Writer。書き込みに失敗しても応答の受信は続けるため、最初の失敗だけを記録する。
struct EchoWriter<'a, W: Write> {
    out: &'a mut W,
    failed: bool,
}

impl<'a, W: Write> EchoWriter<'a, W> {
    fn new(out: &'a mut W) -> Self {
        Self { out, failed: false }
    }

    fn echo(&mut self, text: &str) {
        if self.failed {
            return;
        }
        if let Err(e) = emit(&mut *self.out, text) {
            warn!(error = %e, "Failed to write streamed text, continuing without echo");
            self.failed = true;
        }
    }
}

/// テキスト片のストリームを最後まで消費し、前後の空白を除いた全文を返す。
///
/// 各テキスト片は受信した順に `out` へ書き出してすぐに flush する。
/// 最初の空でないテキスト片が届いた時点でスピナーを消す。
/// 途中でエラーが発生した場合、表示済みの出力はそのままにして改行だけ入れ、エラーを返す。
/// `out` への書き込みに失敗した場合は以降の表示を止め、全文の組み立ては続ける。
pub async fn accumulate_fragments<S, W>(
    mut fragments: S,
    out: &mut W,
    spinner: &ProgressBar,
) -> Result<String, CowError>
where
    S: Stream<Item = Result<String, CowError>> + Unpin,
    W: Write,
{
    let mut echo = EchoWriter::new(out);
    let mut full_text = String::new();
    let mut started_text = false;
    let mut fragment_count: u32 = 0;

    while let Some(result) = fragments.next().await {
        fragment_count += 1;
        let fragment = match result {
            Ok(f) => f,
            Err(e) => {
                warn!(
                    error = %e,
                    fragments_received = fragment_count,
                    text_so_far_len = full_text.len(),
                    "Stream error occurred"
                );
                spinner.finish_and_clear();
                if started_text {
                    echo.echo("\n");
                }
                return Err(e);
            }
        };

        if fragment.is_empty() {
            debug!(fragment = fragment_count, "Received empty fragment");
            continue;
        }

        if !started_text {
            spinner.finish_and_clear();
            started_text = true;
        }

        echo.echo(&fragment);
        full_text.push_str(&fragment);
    }

    spinner.finish_and_clear();
    if started_text {
        echo.echo("\n");
    }

    debug!(
        total_fragments = fragment_count,
        full_text_length = full_text.len(),
        echo_failed = echo.failed,
        "Stream processing completed"
    );

    Ok(full_text.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    fn ok_fragments(parts: &[&str]) -> Vec<Result<String, CowError>> {
        parts.iter().map(|p| Ok(p.to_string())).collect()
    }

    #[tokio::test]
    async fn concatenates_fragments_in_arrival_order() {
        let fragments = stream::iter(ok_fragments(&["  Moo", "", ", ", "said", " the", " cow. \n"]));
        let mut out = Vec::new();

        let text = accumulate_fragments(fragments, &mut out, &ProgressBar::hidden())
            .await
            .unwrap();

        assert_eq!(text, "Moo, said the cow.");
        // 表示はトリムせず受信したまま、最後に改行を 1 つ足す
        assert_eq!(String::from_utf8(out).unwrap(), "  Moo, said the cow. \n\n");
    }

    #[tokio::test]
    async fn matches_single_shot_text_for_same_completion() {
        let completion = "\nWhy do cows wear bells?\n\nBecause their horns don't work.\n";
        let single_shot = completion.trim().to_string();

        // 同じ完了テキストを任意の位置で分割して流す
        let parts: Vec<&str> = vec![&completion[..5], &completion[5..17], &completion[17..]];
        let mut out = Vec::new();
        let streamed = accumulate_fragments(
            stream::iter(ok_fragments(&parts)),
            &mut out,
            &ProgressBar::hidden(),
        )
        .await
        .unwrap();

        assert_eq!(streamed, single_shot);
    }

    #[tokio::test]
    async fn duplicate_fragments_are_kept() {
        let fragments = stream::iter(ok_fragments(&["ha", "ha", "ha"]));
        let mut out = Vec::new();
        let text = accumulate_fragments(fragments, &mut out, &ProgressBar::hidden())
            .await
            .unwrap();
        assert_eq!(text, "hahaha");
    }

    #[tokio::test]
    async fn empty_stream_yields_empty_text_and_no_output() {
        let fragments = stream::iter(Vec::<Result<String, CowError>>::new());
        let mut out = Vec::new();
        let text = accumulate_fragments(fragments, &mut out, &ProgressBar::hidden())
            .await
            .unwrap();
        assert!(text.is_empty());
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn mid_stream_error_keeps_partial_output() {
        let fragments = stream::iter(vec![
            Ok("Hello".to_string()),
            Ok(" there".to_string()),
            Err(CowError::Upstream("connection reset".to_string())),
            Ok("never seen".to_string()),
        ]);
        let mut out = Vec::new();

        let err = accumulate_fragments(fragments, &mut out, &ProgressBar::hidden())
            .await
            .unwrap_err();

        assert!(matches!(err, CowError::Upstream(ref m) if m == "connection reset"));
        assert_eq!(String::from_utf8(out).unwrap(), "Hello there\n");
    }

    #[tokio::test]
    async fn error_before_any_text_writes_nothing() {
        let fragments = stream::iter(vec![Err(CowError::Upstream("401".to_string()))]);
        let mut out = Vec::new();
        let result = accumulate_fragments(fragments, &mut out, &ProgressBar::hidden()).await;
        assert!(result.is_err());
        assert!(out.is_empty());
    }

    /// 書き込みのたびに失敗する Writer
    struct BrokenPipe {
        attempts: usize,
    }

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            self.attempts += 1;
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn write_failure_stops_echo_but_keeps_accumulating() {
        let fragments = stream::iter(ok_fragments(&["one", " two", " three"]));
        let mut out = BrokenPipe { attempts: 0 };

        let text = accumulate_fragments(fragments, &mut out, &ProgressBar::hidden())
            .await
            .unwrap();

        assert_eq!(text, "one two three");
        // 最初の失敗以降は書き込みを試みない
        assert_eq!(out.attempts, 1);
    }
}
