//! ログ初期化モジュール
//!
//! `tracing` + `tracing-subscriber` を使用して、デバッグログを外部ファイルに出力する。
//! 標準出力は吹き出し専用なので、ログは端末には一切出さない。
//! ログファイルはプラットフォームの状態ディレクトリに日次ローテーション（ローカル時刻基準）で保存される。

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use directories::ProjectDirs;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::{fmt, EnvFilter};

/// ログファイル名のプレフィックス
const LOG_PREFIX: &str = "cowpilot.log";

// ---------------------------------------------------------------------------
// ローカル時刻タイマー
// ---------------------------------------------------------------------------

/// ログ行のタイムスタンプをローカル時刻（オフセット付き）で出力するタイマー
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z"))
    }
}

// ---------------------------------------------------------------------------
// 日次ローリングファイルアペンダー
// ---------------------------------------------------------------------------

/// ローカル日付で日次ローテーションするファイルアペンダー。
///
/// 書き込み時に現在の日付を確認し、日付が変わっていれば新しいファイルを開く。
/// `tracing_appender::non_blocking` と組み合わせて使用する。
struct DailyAppender {
    dir: PathBuf,
    prefix: String,
    current_date: NaiveDate,
    file: File,
}

impl DailyAppender {
    fn new(dir: PathBuf, prefix: &str) -> std::io::Result<Self> {
        let today = Local::now().date_naive();
        let file = Self::open_log_file(&dir, prefix, today)?;
        Ok(Self {
            dir,
            prefix: prefix.to_string(),
            current_date: today,
            file,
        })
    }

    /// 指定した日付のログファイルを開く（なければ作成）。
    fn open_log_file(dir: &Path, prefix: &str, date: NaiveDate) -> std::io::Result<File> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(log_file_name(prefix, date)))
    }
}

impl Write for DailyAppender {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let today = Local::now().date_naive();
        if today != self.current_date {
            self.file = Self::open_log_file(&self.dir, &self.prefix, today)?;
            self.current_date = today;
        }
        self.file.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.file.flush()
    }
}

fn log_file_name(prefix: &str, date: NaiveDate) -> String {
    format!("{}.{}", prefix, date.format("%Y-%m-%d"))
}

// ---------------------------------------------------------------------------
// ログ初期化
// ---------------------------------------------------------------------------

/// ログの出力先ディレクトリを決定する。
///
/// Linux では `$XDG_STATE_HOME/cowpilot/logs`、それ以外の OS ではローカルデータディレクトリ配下の `logs/`。
/// ホームディレクトリが解決できない場合はカレントディレクトリの `.cowpilot/logs` を使う。
fn log_dir() -> PathBuf {
    match ProjectDirs::from("", "", "cowpilot") {
        Some(dirs) => dirs
            .state_dir()
            .unwrap_or_else(|| dirs.data_local_dir())
            .join("logs"),
        None => PathBuf::from(".cowpilot").join("logs"),
    }
}

/// ログシステムを初期化する。
///
/// - ログレベルは `COWPILOT_LOG` 環境変数で制御（デフォルト: `info`）
/// - ログファイルは `cowpilot.log.YYYY-MM-DD` に日次ローテーションで出力
///
/// ログファイルを作成できない場合は警告を表示して `None` を返す（ログなしで続行する）。
/// 返したガードは `main()` で保持し続ける必要がある（ドロップするとログ出力が停止する）。
pub fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_dir = log_dir();

    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!(
            "cowpilot: warning: failed to create log directory {}: {e}",
            log_dir.display()
        );
        return None;
    }

    let file_appender = match DailyAppender::new(log_dir.clone(), LOG_PREFIX) {
        Ok(appender) => appender,
        Err(e) => {
            eprintln!(
                "cowpilot: warning: failed to create log file in {}: {e}",
                log_dir.display()
            );
            return None;
        }
    };

    // 非ブロッキング書き込み用のワーカーを作成
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter =
        EnvFilter::try_from_env("COWPILOT_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(env_filter)
        .with_writer(non_blocking)
        .with_timer(LocalTimer)
        .with_ansi(false) // ファイル出力には ANSI カラーコードを含めない
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .with_file(true)
        .init();

    Some(guard)
}
