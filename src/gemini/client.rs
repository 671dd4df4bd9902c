//! Gemini API クライアント
//!
//! generateContent へ JSON を POST し、最初のインライン画像を返す。

use crate::config::Config;
use crate::error::{GenerationError, Result, StudioError};
use genai_studio_common::{GenerateRequest, GenerateResponse, Mode};
use std::time::Duration;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// 生成呼び出しの境界
///
/// 本番は GeminiClient、テストでは台本どおりに返す実装を差し込む
#[allow(async_fn_in_trait)]
pub trait ImageGenerator {
    /// リクエストを送り、画像のBase64を返す
    async fn generate(
        &self,
        mode: Mode,
        request: &GenerateRequest,
    ) -> std::result::Result<String, GenerationError>;
}

pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| StudioError::Config(format!("HTTPクライアント初期化失敗: {}", e)))?;

        Ok(Self {
            http,
            endpoint: config.endpoint(),
            api_key: config.api_key.clone(),
        })
    }
}

impl ImageGenerator for GeminiClient {
    async fn generate(
        &self,
        mode: Mode,
        request: &GenerateRequest,
    ) -> std::result::Result<String, GenerationError> {
        log::debug!(
            "{}: POST {} (parts={}, images={})",
            mode,
            self.endpoint,
            request.parts().len(),
            request.image_count()
        );

        let response = self
            .http
            .post(&self.endpoint)
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(request)
            .send()
            .await
            .map_err(|source| transport_error(mode, source))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| transport_error(mode, source))?;

        if !status.is_success() {
            return Err(GenerationError::Api {
                mode,
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = serde_json::from_str(&body).map_err(|e| {
            GenerationError::Response {
                mode,
                source: e.into(),
            }
        })?;

        match parsed.first_image() {
            Ok(data) => Ok(data.to_string()),
            Err(source) => {
                let text = parsed.text();
                if !text.is_empty() {
                    log::warn!("{}: 画像なし、テキスト応答: {}", mode, text);
                }
                Err(GenerationError::Response { mode, source })
            }
        }
    }
}

/// 通信エラー（URLはログに出さない）
fn transport_error(mode: Mode, source: reqwest::Error) -> GenerationError {
    GenerationError::Transport {
        mode,
        source: source.without_url(),
    }
}
