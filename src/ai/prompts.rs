//! システムプロンプト

/// 全リクエスト共通のシステムロール
pub const SYSTEM_PROMPT: &str = "You are a helpful, witty assistant.";
