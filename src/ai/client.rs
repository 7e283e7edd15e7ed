//! OpenAI API クライアント
//!
//! プロンプトを Chat Completions API に送信し、応答テキストを返す。
//! `ResponseMode` に応じて一括取得とストリーミングを切り替える。

use std::io;

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
        ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
        CreateChatCompletionResponse,
    },
    Client,
};
use futures_util::StreamExt;
use tracing::{debug, info, warn};

use crate::cli::cow::cow_spinner;
use crate::error::CowError;

use super::prompts::SYSTEM_PROMPT;
use super::stream::{accumulate_fragments, fragment_of};
use super::types::{ResponseMode, ResponseSettings};

/// API キーを読み取る環境変数
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// .env テンプレートのままのプレースホルダ値
const PLACEHOLDER_KEY: &str = "your_openai_api_key";

/// cowpilot の AI クライアント
pub struct CowpilotAI {
    client: Client<OpenAIConfig>,
}

impl CowpilotAI {
    /// `OPENAI_API_KEY` 環境変数から AI クライアントを初期化する。
    pub fn from_env(api_base: Option<&str>) -> Result<Self, CowError> {
        Self::new(std::env::var(API_KEY_ENV).ok(), api_base)
    }

    /// API キーを検証してクライアントを作成する。ネットワークには接続しない。
    ///
    /// キーが無い、空、またはプレースホルダのままの場合は `CowError::Configuration` を返す。
    pub fn new(api_key: Option<String>, api_base: Option<&str>) -> Result<Self, CowError> {
        let api_key = match api_key {
            Some(key) if !key.trim().is_empty() => key,
            _ => {
                return Err(CowError::Configuration(format!(
                    "Missing {API_KEY_ENV} environment variable."
                )))
            }
        };

        if api_key == PLACEHOLDER_KEY {
            return Err(CowError::Configuration(format!(
                "{API_KEY_ENV} is not configured. Please set a valid API key in .env"
            )));
        }

        let mut config = OpenAIConfig::new().with_api_key(api_key);
        if let Some(base) = api_base {
            debug!(api_base = %base, "Using custom API base");
            config = config.with_api_base(base);
        }

        Ok(Self {
            client: Client::with_config(config),
        })
    }

    /// プロンプトを送信し、前後の空白を除いた応答テキストを返す。
    ///
    /// `Incremental` の場合は受信したテキスト片を標準出力へ逐次表示する。
    pub async fn respond(
        &self,
        prompt: &str,
        settings: &ResponseSettings,
        mode: ResponseMode,
    ) -> Result<String, CowError> {
        debug!(
            prompt_length = prompt.len(),
            model = %settings.model,
            max_tokens = settings.max_tokens,
            temperature = settings.temperature,
            mode = ?mode,
            "respond() called"
        );

        let request = build_request(prompt, settings, mode == ResponseMode::Incremental);

        let text = match mode {
            ResponseMode::SingleShot => self.respond_single_shot(request).await?,
            ResponseMode::Incremental => self.respond_incremental(request).await?,
        };

        info!(
            mode = ?mode,
            response_length = text.len(),
            "AI response received"
        );
        Ok(text)
    }

    async fn respond_single_shot(
        &self,
        request: CreateChatCompletionRequest,
    ) -> Result<String, CowError> {
        let spinner = cow_spinner();
        let result = self.client.chat().create(request).await;
        spinner.finish_and_clear();

        let response = result.map_err(|e| {
            warn!(error = %e, "Chat completion request failed");
            CowError::from(e)
        })?;

        let text = text_of(&response);
        if text.is_empty() {
            warn!(choices = response.choices.len(), "AI returned empty response");
        }
        Ok(text)
    }

    async fn respond_incremental(
        &self,
        request: CreateChatCompletionRequest,
    ) -> Result<String, CowError> {
        let spinner = cow_spinner();

        let stream = match self.client.chat().create_stream(request).await {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "Failed to create chat stream");
                spinner.finish_and_clear();
                return Err(e.into());
            }
        };

        debug!("Stream created successfully, starting to process chunks");

        let fragments = stream.map(|chunk| chunk.map(|r| fragment_of(&r)).map_err(CowError::from));
        let mut stdout = io::stdout();
        accumulate_fragments(fragments, &mut stdout, &spinner).await
    }
}

/// 一括レスポンスから先頭の choice の本文を取り出し、前後の空白を除いて返す。
///
/// choice が無い、または本文が無い場合は空文字列。
fn text_of(response: &CreateChatCompletionResponse) -> String {
    response
        .choices
        .first()
        .and_then(|choice| choice.message.content.as_deref())
        .map(str::trim)
        .unwrap_or_default()
        .to_string()
}

/// Chat Completions のリクエストを組み立てる。
///
/// OpenAI 互換エンドポイントの多くは `max_completion_tokens` を解釈しないため、上限は `max_tokens` で送る。
#[allow(deprecated)]
fn build_request(
    prompt: &str,
    settings: &ResponseSettings,
    stream: bool,
) -> CreateChatCompletionRequest {
    let messages = vec![
        ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
            content: ChatCompletionRequestSystemMessageContent::Text(SYSTEM_PROMPT.to_string()),
            name: None,
        }),
        ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
            content: ChatCompletionRequestUserMessageContent::Text(prompt.to_string()),
            name: None,
        }),
    ];

    CreateChatCompletionRequest {
        model: settings.model.clone(),
        messages,
        max_tokens: Some(settings.max_tokens),
        temperature: Some(settings.temperature),
        stream: Some(stream),
        ..Default::default()
    }
}
