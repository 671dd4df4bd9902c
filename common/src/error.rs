//! エラー型定義

use thiserror::Error;

/// 送信前チェックの失敗
///
/// Displayはそのままユーザー通知の文言として使う
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter at least one prompt.")]
    EmptyPrompts,

    #[error("Please upload and select at least one character reference image.")]
    NoCharacterSelected,

    #[error("Please upload both a base image and an item image.")]
    MissingSwapImages,

    #[error("Please enter a prompt for the swap.")]
    EmptySwapPrompt,

    #[error("Please upload both a target image and a face source image.")]
    MissingFaceImages,

    #[error("Please upload an image to remove the background from.")]
    MissingBackgroundImage,

    #[error("A generation is already in progress.")]
    Busy,
}

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no image data in response")]
    NoImageData,

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
