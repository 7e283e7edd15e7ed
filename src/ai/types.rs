//! AI モジュールの公開型定義

/// 応答の取得方法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    /// 1 回のリクエストで全文を受け取る。途中経過は表示しない。
    SingleShot,
    /// テキスト片を受信するたびに標準出力へ逐次表示し、最後に全文を返す。
    Incremental,
}

impl ResponseMode {
    pub fn from_stream_flag(stream: bool) -> Self {
        if stream {
            ResponseMode::Incremental
        } else {
            ResponseMode::SingleShot
        }
    }
}

/// リクエストごとの生成パラメータ
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_flag_selects_mode() {
        assert_eq!(ResponseMode::from_stream_flag(true), ResponseMode::Incremental);
        assert_eq!(ResponseMode::from_stream_flag(false), ResponseMode::SingleShot);
    }
}
