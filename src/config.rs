use crate::error::{Result, StudioError};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

const API_KEY_VARS: &[&str] = &["GEMINI_API_KEY", "VITE_GEMINI_API_KEY"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip_serializing, default)]
    pub api_key: String,
    pub model: String,
    pub api_base: String,
    pub timeout_seconds: u64,
    /// 一括ダウンロード時のファイル間隔
    pub download_delay_ms: u64,
}

impl Config {
    /// 環境変数から読み込む。APIキーがなければ起動できない
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 変数の取得元を差し替えて読み込む
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = API_KEY_VARS
            .iter()
            .filter_map(|&name| lookup(name))
            .map(|key| key.trim().to_string())
            .find(|key| !key.is_empty())
            .ok_or(StudioError::MissingApiKey)?;

        let mut config = Self::with_api_key(api_key);

        if let Some(model) = lookup("GENAI_STUDIO_MODEL").filter(|m| !m.trim().is_empty()) {
            config.model = model.trim().to_string();
        }
        if let Some(base) = lookup("GENAI_STUDIO_API_BASE").filter(|b| !b.trim().is_empty()) {
            config.api_base = base.trim().trim_end_matches('/').to_string();
        }
        if let Some(raw) = lookup("GENAI_STUDIO_TIMEOUT") {
            config.timeout_seconds = parse_u64("GENAI_STUDIO_TIMEOUT", &raw)?;
        }
        if let Some(raw) = lookup("GENAI_STUDIO_DOWNLOAD_DELAY_MS") {
            config.download_delay_ms = parse_u64("GENAI_STUDIO_DOWNLOAD_DELAY_MS", &raw)?;
        }

        Ok(config)
    }

    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.into(),
            api_base: DEFAULT_API_BASE.into(),
            timeout_seconds: 120,
            download_delay_ms: 200,
        }
    }

    /// generateContent エンドポイント（キーは含まない）
    pub fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }
}

fn parse_u64(name: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse()
        .map_err(|_| StudioError::Config(format!("{} は整数で指定してください: {}", name, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_missing_api_key_is_fatal() {
        let result = Config::from_lookup(lookup_from(&[]));
        assert!(matches!(result, Err(StudioError::MissingApiKey)));

        let result = Config::from_lookup(lookup_from(&[("GEMINI_API_KEY", "   ")]));
        assert!(matches!(result, Err(StudioError::MissingApiKey)));
    }

    #[test]
    fn test_vite_key_fallback() {
        let config = Config::from_lookup(lookup_from(&[("VITE_GEMINI_API_KEY", "vite-key")])).unwrap();
        assert_eq!(config.api_key, "vite-key");
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[("GEMINI_API_KEY", "k")])).unwrap();
        assert_eq!(config.model, "gemini-2.5-flash-image");
        assert_eq!(config.download_delay_ms, 200);
        assert_eq!(
            config.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash-image:generateContent"
        );
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "k"),
            ("GENAI_STUDIO_MODEL", "gemini-3-pro-image-preview"),
            ("GENAI_STUDIO_API_BASE", "http://localhost:8080/v1beta/"),
            ("GENAI_STUDIO_TIMEOUT", "30"),
            ("GENAI_STUDIO_DOWNLOAD_DELAY_MS", "0"),
        ]))
        .unwrap();
        assert_eq!(config.endpoint(), "http://localhost:8080/v1beta/models/gemini-3-pro-image-preview:generateContent");
        assert_eq!(config.timeout_seconds, 30);
        assert_eq!(config.download_delay_ms, 0);
    }

    #[test]
    fn test_invalid_number() {
        let result = Config::from_lookup(lookup_from(&[("GEMINI_API_KEY", "k"), ("GENAI_STUDIO_TIMEOUT", "soon")]));
        assert!(matches!(result, Err(StudioError::Config(_))));
    }

    #[test]
    fn test_api_key_not_serialized() {
        let config = Config::with_api_key("secret");
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }
}
