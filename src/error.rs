//! cowpilot のエラー型
//!
//! 失敗はすべて `CowError` として `main` まで伝播し、
//! そこで一度だけ吹き出しとして表示される。

use std::path::PathBuf;

use thiserror::Error;

/// cowpilot 全体で扱うエラー
#[derive(Error, Debug)]
pub enum CowError {
    /// API キーが未設定、または無効。
    #[error("{0}")]
    Configuration(String),

    /// .cow ファイルを読み込めなかった。
    #[error("Could not load .cow file {}: {source}", path.display())]
    FigureLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// LLM 側（通信・認証・レート制限・不正なレスポンス）の失敗。
    #[error("{0}")]
    Upstream(String),

    /// 対話入力からプロンプトを読み取れなかった。
    #[error("Failed to read prompt from stdin: {0}")]
    Input(#[source] std::io::Error),
}

impl CowError {
    /// 吹き出しに表示するテキストを返す。
    ///
    /// .cow ファイルの読み込み失敗はメッセージをそのまま、
    /// それ以外は `Error: ` を前置する。
    pub fn bubble_text(&self) -> String {
        match self {
            CowError::FigureLoad { .. } => self.to_string(),
            _ => format!("Error: {self}"),
        }
    }
}

impl From<async_openai::error::OpenAIError> for CowError {
    fn from(err: async_openai::error::OpenAIError) -> Self {
        CowError::Upstream(err.to_string())
    }
}
