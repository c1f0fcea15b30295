//! OCR 服务 - 业务能力层
//!
//! 只负责"一个文件 → 文本"能力，不关心批次和流程
//!
//! ## 技术栈
//! - 使用 `reqwest` 调用 Mistral OCR REST 接口
//! - 文件以 base64 data URL 的形式上传

use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, OcrError};
use crate::services::capability::TextExtractor;
use crate::utils::truncate_text;

/// OCR 接口响应
#[derive(Debug, Default, Deserialize)]
pub struct OcrResponse {
    #[serde(default)]
    pub pages: Vec<OcrPage>,
}

/// 单页识别结果
#[derive(Debug, Default, Deserialize)]
pub struct OcrPage {
    #[serde(default)]
    pub markdown: String,
}

impl OcrResponse {
    /// 合并所有页面的 markdown
    pub fn into_text(self) -> String {
        self.pages
            .iter()
            .map(|page| page.markdown.as_str())
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    }
}

/// OCR 服务
///
/// 职责：
/// - 读取并编码单个文件
/// - 调用 OCR 接口
/// - 不关心批次、统计和输出
pub struct OcrService {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model_name: String,
}

impl OcrService {
    /// 创建新的 OCR 服务
    pub fn new(config: &Config) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/ocr", config.api.base_url.trim_end_matches('/')),
            api_key: config.api.api_key.clone(),
            model_name: config.api.ocr_model.clone(),
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// 构建请求体
    pub fn build_request(&self, mime: &str, bytes: &[u8]) -> JsonValue {
        json!({
            "model": self.model_name,
            "document": document_payload(mime, bytes),
        })
    }
}

#[async_trait]
impl TextExtractor for OcrService {
    async fn extract(&self, path: &Path) -> AppResult<String> {
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        let mime = mime_type(path).ok_or_else(|| OcrError::UnsupportedFileType {
            path: path.display().to_string(),
        })?;

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;

        info!("🔄 调用 OCR 接口: {}", name);
        let start = Instant::now();

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.build_request(mime, &bytes))
            .send()
            .await
            .map_err(|e| AppError::ocr_request_failed(&self.endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OcrError::BadResponse {
                endpoint: self.endpoint.clone(),
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let parsed: OcrResponse = response
            .json()
            .await
            .map_err(|e| OcrError::JsonParseFailed { source: Box::new(e) })?;
        let text = parsed.into_text();

        if text.is_empty() {
            warn!("OCR 结果为空: {}", name);
        } else {
            info!(
                "⏱️  OCR 完成，用时 {:.1}s - {} 字符 ({})",
                start.elapsed().as_secs_f64(),
                text.chars().count(),
                name
            );
        }
        debug!("OCR 预览 ({}): {}", self.model_name, truncate_text(&text, 80));

        Ok(text)
    }
}

/// 根据扩展名确定 MIME 类型（不支持的类型返回 None）
pub fn mime_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some("application/pdf"),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// PDF 以 document_url 上传，图片以 image_url 上传
fn document_payload(mime: &str, bytes: &[u8]) -> JsonValue {
    let data_url = format!("data:{};base64,{}", mime, STANDARD.encode(bytes));
    if mime == "application/pdf" {
        json!({ "type": "document_url", "document_url": data_url })
    } else {
        json!({ "type": "image_url", "image_url": data_url })
    }
}
