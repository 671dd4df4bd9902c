use genai_studio_common::{Mode, Notice, ValidationError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StudioError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("APIキーが設定されていません。環境変数 GEMINI_API_KEY を設定してください")]
    MissingApiKey,

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("画像読み込みエラー: {0}")]
    ImageLoad(String),

    #[error("Base64デコードエラー: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("入力エラー: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// 1枚も生成できなかった（ストーリー以外）
    #[error("{0}")]
    BatchFailed(Notice),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

pub type Result<T> = std::result::Result<T, StudioError>;

/// 生成呼び出し1件の失敗
///
/// 原因に関係なくこの型で包んで返す（リトライしない）
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("{mode}: API呼び出しエラー: {source}")]
    Transport {
        mode: Mode,
        #[source]
        source: reqwest::Error,
    },

    #[error("{mode}: APIエラー {status}: {body}")]
    Api { mode: Mode, status: u16, body: String },

    #[error("{mode}: {source}")]
    Response {
        mode: Mode,
        #[source]
        source: genai_studio_common::Error,
    },
}

impl GenerationError {
    pub fn mode(&self) -> Mode {
        match self {
            GenerationError::Transport { mode, .. }
            | GenerationError::Api { mode, .. }
            | GenerationError::Response { mode, .. } => *mode,
        }
    }

    /// 画像パートなしの失敗か
    pub fn is_missing_image(&self) -> bool {
        matches!(
            self,
            GenerationError::Response {
                source: genai_studio_common::Error::NoImageData,
                ..
            }
        )
    }
}
