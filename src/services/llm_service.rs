//! LLM 服务 - 业务能力层
//!
//! 只负责"文本清理"能力，不关心批次和流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Mistral, Azure, Gemini 等）

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{AppError, AppResult, LlmError};
use crate::services::capability::TextCleaner;
use crate::services::retry::{retry_with_backoff, RetryPolicy};

/// LLM 服务
///
/// 职责：
/// - 调用 LLM API 清理 OCR 原始文本
/// - 自己负责重试和退避
/// - 不出现文件名 / 批次编号
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
    retry: RetryPolicy,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.api.api_key)
            .with_api_base(&config.api.base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.api.llm_model.clone(),
            retry: RetryPolicy::new(
                config.processing.max_retries,
                config.processing.retry_backoff_base,
            ),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// 构建清理请求
    pub fn build_request(
        &self,
        raw_text: &str,
        style_directive: &str,
        temperature: f32,
    ) -> AppResult<CreateChatCompletionRequest> {
        let build_failed = |e: async_openai::error::OpenAIError| {
            AppError::Llm(LlmError::RequestBuildFailed {
                model: self.model_name.clone(),
                source: Box::new(e),
            })
        };

        let mut messages = Vec::new();

        if !style_directive.trim().is_empty() {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(style_directive)
                .build()
                .map_err(build_failed)?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message(raw_text))
            .build()
            .map_err(build_failed)?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(temperature)
            .build()
            .map_err(build_failed)
    }

    /// 单次调用，不重试
    async fn send_once(&self, request: CreateChatCompletionRequest) -> AppResult<String> {
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| AppError::llm_api_failed(&self.model_name, e))?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| LlmError::EmptyContent {
                model: self.model_name.clone(),
            })?;

        Ok(content.trim().to_string())
    }
}

#[async_trait]
impl TextCleaner for LlmService {
    async fn clean(
        &self,
        text: &str,
        style_directive: &str,
        temperature: f32,
    ) -> AppResult<String> {
        debug!(
            "调用 LLM 清理，模型: {}，输入长度: {} 字符",
            self.model_name,
            text.chars().count()
        );

        let request = self.build_request(text, style_directive, temperature)?;
        let cleaned = retry_with_backoff(&self.retry, "LLM 清理", || {
            self.send_once(request.clone())
        })
        .await?;

        info!("✓ LLM 清理完成，输出 {} 字符", cleaned.chars().count());
        Ok(cleaned)
    }
}

/// 清理请求的用户消息
pub fn user_message(raw_text: &str) -> String {
    format!("Raw text to clean:\n\n{}", raw_text)
}
