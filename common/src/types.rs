//! スタジオの型定義
//!
//! CLIと対話セッションで共有される型:
//! - Character: ストーリーモードのキャラクター参照スロット
//! - ImageAsset: 1スロット1枚の入力画像
//! - GeneratedImage: 生成結果
//! - AspectRatio / CustomRatio: アスペクト比の選択
//! - Mode / ImageStyle: 生成モードとスタイル

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// キャラクタースロット数（固定）
pub const CHARACTER_SLOTS: u32 = 4;

/// 1回の送信で指定できる最大枚数
pub const MAX_IMAGES_PER_SUBMIT: u32 = 4;

/// キャラクター参照スロット
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: u32,
    pub name: String,
    /// Base64画像
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub selected: bool,
}

impl Character {
    /// 起動時のプレースホルダ（"Character N"、未選択、画像なし）
    pub fn placeholder(id: u32) -> Self {
        Self {
            id,
            name: format!("Character {}", id),
            image: None,
            mime_type: None,
            selected: false,
        }
    }

    /// 選択済みかつ画像あり
    pub fn is_usable(&self) -> bool {
        self.selected && self.image.is_some()
    }

    /// 参照画像をImageAssetとして取り出す
    pub fn reference(&self) -> Option<ImageAsset> {
        let base64 = self.image.clone()?;
        Some(ImageAsset {
            base64,
            mime_type: self
                .mime_type
                .clone()
                .unwrap_or_else(|| "image/png".to_string()),
        })
    }
}

/// 入力画像（Base64 + MIMEタイプ）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAsset {
    pub base64: String,
    pub mime_type: String,
}

impl ImageAsset {
    pub fn new(base64: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            base64: base64.into(),
            mime_type: mime_type.into(),
        }
    }
}

/// 生成結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub id: u64,
    /// 表示用ラベル
    pub prompt: String,
    pub base64: String,
}

/// 生成モード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    Story,
    ItemSwap,
    FaceSwap,
    BackgroundRemoval,
}

impl Mode {
    pub const ALL: [Mode; 4] = [
        Mode::Story,
        Mode::ItemSwap,
        Mode::FaceSwap,
        Mode::BackgroundRemoval,
    ];

    /// タブ名
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Story => "Story",
            Mode::ItemSwap => "Item Swapper",
            Mode::FaceSwap => "Face Swapper",
            Mode::BackgroundRemoval => "BG Remover",
        }
    }

    /// 結果一覧の見出し
    pub fn results_title(&self) -> &'static str {
        match self {
            Mode::Story => "Story Results",
            Mode::ItemSwap => "Item Swap Results",
            Mode::FaceSwap => "Face Swap Results",
            Mode::BackgroundRemoval => "Background Removal Results",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// アスペクト比の選択肢
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    Square,
    Landscape,
    Portrait,
    Standard,
    Custom,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 5] = [
        AspectRatio::Square,
        AspectRatio::Landscape,
        AspectRatio::Portrait,
        AspectRatio::Standard,
        AspectRatio::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
            AspectRatio::Standard => "4:3",
            AspectRatio::Custom => "Custom",
        }
    }

    /// APIへ渡す比率文字列（Customは "W:H"）
    pub fn ratio_string(&self, custom: CustomRatio) -> String {
        match self {
            AspectRatio::Custom => custom.to_string(),
            preset => preset.as_str().to_string(),
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AspectRatio::ALL
            .iter()
            .copied()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "Unknown aspect ratio: {}. Use 1:1, 16:9, 9:16, 4:3 or Custom",
                    s
                )
            })
    }
}

/// Customアスペクト比の幅:高さ（常に1以上）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomRatio {
    pub width: u32,
    pub height: u32,
}

impl Default for CustomRatio {
    fn default() -> Self {
        Self { width: 1, height: 1 }
    }
}

impl CustomRatio {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// 入力文字列から生成（各辺は parse_dimension で補正）
    pub fn from_inputs(width: &str, height: &str) -> Self {
        Self {
            width: parse_dimension(width),
            height: parse_dimension(height),
        }
    }
}

impl fmt::Display for CustomRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

/// 幅・高さの入力を整数に変換する
///
/// 先頭の空白と符号に続く数字だけを読む。数字がない、または1未満なら1。
pub fn parse_dimension(raw: &str) -> u32 {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if negative || digits.is_empty() {
        return 1;
    }

    match digits.parse::<u64>() {
        Ok(0) => 1,
        Ok(value) => value.min(u32::MAX as u64) as u32,
        // 桁あふれは上限に丸める
        Err(_) => u32::MAX,
    }
}

/// 生成スタイル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImageStyle {
    #[default]
    Default,
    Cyberpunk,
    Anime,
    WatercolorPainting,
    Cinematic,
    GlitchArt,
    PopSurrealism,
    ArtDecoRevival,
    AbstractDataArt,
    KineticArt,
    AsciiArtOverlay,
    SynesthesiaArt,
    SumiE,
    LowPoly3d,
}

impl ImageStyle {
    pub const ALL: [ImageStyle; 14] = [
        ImageStyle::Default,
        ImageStyle::Cyberpunk,
        ImageStyle::Anime,
        ImageStyle::WatercolorPainting,
        ImageStyle::Cinematic,
        ImageStyle::GlitchArt,
        ImageStyle::PopSurrealism,
        ImageStyle::ArtDecoRevival,
        ImageStyle::AbstractDataArt,
        ImageStyle::KineticArt,
        ImageStyle::AsciiArtOverlay,
        ImageStyle::SynesthesiaArt,
        ImageStyle::SumiE,
        ImageStyle::LowPoly3d,
    ];

    /// 表示名
    pub fn name(&self) -> &'static str {
        match self {
            ImageStyle::Default => "Default",
            ImageStyle::Cyberpunk => "Cyberpunk",
            ImageStyle::Anime => "Anime",
            ImageStyle::WatercolorPainting => "Watercolor Painting",
            ImageStyle::Cinematic => "Cinematic",
            ImageStyle::GlitchArt => "Glitch Art",
            ImageStyle::PopSurrealism => "Pop Surrealism",
            ImageStyle::ArtDecoRevival => "Art Deco Revival",
            ImageStyle::AbstractDataArt => "Abstract Data Art",
            ImageStyle::KineticArt => "Kinetic Art",
            ImageStyle::AsciiArtOverlay => "ASCII Art Overlay",
            ImageStyle::SynesthesiaArt => "Synesthesia Art",
            ImageStyle::SumiE => "Sumi-e Art",
            ImageStyle::LowPoly3d => "Low Poly 3D",
        }
    }

    /// 表示名から解決（不明な名前はDefault）
    pub fn from_name(name: &str) -> Self {
        let name = name.trim();
        ImageStyle::ALL
            .iter()
            .copied()
            .find(|s| s.name().eq_ignore_ascii_case(name))
            .unwrap_or_default()
    }
}

impl fmt::Display for ImageStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_character_placeholder() {
        let c = Character::placeholder(3);
        assert_eq!(c.id, 3);
        assert_eq!(c.name, "Character 3");
        assert!(c.image.is_none());
        assert!(!c.selected);
        assert!(!c.is_usable());
    }

    #[test]
    fn test_character_usable_requires_both() {
        let mut c = Character::placeholder(1);
        c.selected = true;
        assert!(!c.is_usable());
        c.image = Some("abc".to_string());
        assert!(c.is_usable());
        c.selected = false;
        assert!(!c.is_usable());
    }

    #[test]
    fn test_parse_dimension() {
        assert_eq!(parse_dimension("16"), 16);
        assert_eq!(parse_dimension("  21"), 21);
        assert_eq!(parse_dimension("7px"), 7);
        assert_eq!(parse_dimension("3.9"), 3);
        assert_eq!(parse_dimension("abc"), 1);
        assert_eq!(parse_dimension(""), 1);
        assert_eq!(parse_dimension("0"), 1);
        assert_eq!(parse_dimension("-5"), 1);
        assert_eq!(parse_dimension("99999999999999"), u32::MAX);
    }

    #[test]
    fn test_custom_ratio_from_inputs() {
        let ratio = CustomRatio::from_inputs("21", "x");
        assert_eq!(ratio, CustomRatio { width: 21, height: 1 });
        assert_eq!(ratio.to_string(), "21:1");
    }

    #[test]
    fn test_custom_ratio_new_clamps() {
        assert_eq!(CustomRatio::new(0, 0), CustomRatio::default());
    }

    #[test]
    fn test_aspect_ratio_string() {
        let custom = CustomRatio::new(5, 4);
        assert_eq!(AspectRatio::Landscape.ratio_string(custom), "16:9");
        assert_eq!(AspectRatio::Custom.ratio_string(custom), "5:4");
    }

    #[test]
    fn test_aspect_ratio_from_str() {
        assert_eq!("9:16".parse::<AspectRatio>().unwrap(), AspectRatio::Portrait);
        assert_eq!("custom".parse::<AspectRatio>().unwrap(), AspectRatio::Custom);
        assert!("3:2".parse::<AspectRatio>().is_err());
    }

    #[test]
    fn test_image_style_from_name() {
        assert_eq!(ImageStyle::from_name("Sumi-e Art"), ImageStyle::SumiE);
        assert_eq!(ImageStyle::from_name("low poly 3d"), ImageStyle::LowPoly3d);
        assert_eq!(ImageStyle::from_name("Vaporwave"), ImageStyle::Default);
    }

    #[test]
    fn test_generated_image_serialize() {
        let image = GeneratedImage {
            id: 42,
            prompt: "cat jumping".to_string(),
            base64: "AAAA".to_string(),
        };
        let json = serde_json::to_string(&image).expect("シリアライズ失敗");
        assert!(json.contains("\"prompt\":\"cat jumping\""));
    }
}
