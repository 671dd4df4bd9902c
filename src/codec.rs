//! 画像ファイル ⇔ Base64 変換
//!
//! - load_image: 画像ファイル → Base64 + MIMEタイプ
//! - save_png: Base64 → PNGファイル
//! - formatted_date: ファイル名用の日時文字列

use crate::error::{Result, StudioError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Local, TimeZone};
use genai_studio_common::ImageAsset;
use image::ImageFormat;
use std::path::{Path, PathBuf};

const FALLBACK_MIME_TYPE: &str = "image/png";

/// 画像ファイルを読み込んでBase64化
///
/// MIMEタイプは中身から判定し、判定できなければ拡張子、最後に image/png
pub fn load_image(path: &Path) -> Result<ImageAsset> {
    if !path.is_file() {
        return Err(StudioError::FileNotFound(path.display().to_string()));
    }

    let bytes = std::fs::read(path)?;
    if bytes.is_empty() {
        return Err(StudioError::ImageLoad(format!("空のファイル: {}", path.display())));
    }

    let mime_type = detect_mime_type(&bytes, path);
    Ok(ImageAsset::new(STANDARD.encode(&bytes), mime_type))
}

/// MIMEタイプ判定
pub fn detect_mime_type(bytes: &[u8], path: &Path) -> String {
    image::guess_format(bytes)
        .ok()
        .or_else(|| ImageFormat::from_path(path).ok())
        .map(|format| format.to_mime_type().to_string())
        .unwrap_or_else(|| FALLBACK_MIME_TYPE.to_string())
}

/// Base64画像をデコードして保存
pub fn save_png(dir: &Path, file_name: &str, base64: &str) -> Result<PathBuf> {
    let bytes = STANDARD.decode(base64.trim())?;
    std::fs::create_dir_all(dir)?;

    let path = dir.join(file_name);
    std::fs::write(&path, bytes)?;
    Ok(path)
}

/// ファイル名用の日時（YYYYMMDD-HHMMSS）
pub fn formatted_date<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%Y%m%d-%H%M%S").to_string()
}

/// 現在時刻のファイル名用日時
pub fn current_date() -> String {
    formatted_date(&Local::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    #[test]
    fn test_detect_mime_from_bytes() {
        assert_eq!(detect_mime_type(PNG_HEADER, Path::new("photo.jpg")), "image/png");
        assert_eq!(
            detect_mime_type(&[0xFF, 0xD8, 0xFF, 0xE0, 0, 0], Path::new("x.bin")),
            "image/jpeg"
        );
    }

    #[test]
    fn test_detect_mime_from_extension() {
        assert_eq!(detect_mime_type(b"????", Path::new("face.webp")), "image/webp");
    }

    #[test]
    fn test_detect_mime_fallback() {
        assert_eq!(detect_mime_type(b"????", Path::new("noext")), "image/png");
    }

    #[test]
    fn test_formatted_date() {
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 7, 5, 3).unwrap();
        assert_eq!(formatted_date(&at), "20261019-070503");
    }
}
