//! Gemini generateContent のリクエスト/レスポンス型
//!
//! パート順序はモードごとに固定:
//! - シーン生成: テキスト → 参照画像(0..4)
//! - アイテム差し替え: ベース画像 → アイテム画像 → テキスト
//! - 顔差し替え: テキスト → ターゲット画像 → 顔画像
//! - 背景除去: 画像 → テキスト（imageConfigなし）

use crate::error::{Error, Result};
use crate::prompts::{
    build_background_removal_prompt, build_face_swap_prompt, build_item_swap_prompt,
    build_scene_prompt, is_supported_aspect_ratio,
};
use crate::types::{Character, ImageAsset, ImageStyle};
use serde::{Deserialize, Serialize};

/// generateContent リクエスト
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    pub generation_config: GenerationConfig,
}

impl GenerateRequest {
    pub fn new(parts: Vec<Part>, generation_config: GenerationConfig) -> Self {
        Self {
            contents: vec![Content { parts }],
            generation_config,
        }
    }

    /// 単一コンテンツのパート列
    pub fn parts(&self) -> &[Part] {
        self.contents
            .first()
            .map(|c| c.parts.as_slice())
            .unwrap_or(&[])
    }

    /// 添付画像の枚数
    pub fn image_count(&self) -> usize {
        self.parts()
            .iter()
            .filter(|p| matches!(p, Part::InlineData { .. }))
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

/// テキストかインライン画像のどちらか
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn image(asset: &ImageAsset) -> Self {
        Part::InlineData {
            inline_data: InlineData {
                mime_type: asset.mime_type.clone(),
                data: asset.base64.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    #[serde(alias = "mime_type")]
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_config: Option<ImageConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfig {
    pub aspect_ratio: String,
}

impl GenerationConfig {
    /// 画像出力のみ。比率がサポート対象のときだけ imageConfig を付ける
    pub fn image_only(aspect_ratio: Option<&str>) -> Self {
        let image_config = aspect_ratio
            .filter(|r| is_supported_aspect_ratio(r))
            .map(|r| ImageConfig {
                aspect_ratio: r.to_string(),
            });

        Self {
            response_modalities: vec!["IMAGE".to_string()],
            image_config,
        }
    }
}

/// シーン生成リクエスト
///
/// 選択済みかつ画像ありのキャラクターだけを参照として添付する
pub fn scene_request(
    scene: &str,
    characters: &[Character],
    aspect_ratio: &str,
    style: ImageStyle,
) -> GenerateRequest {
    let references: Vec<&Character> = characters.iter().filter(|c| c.is_usable()).collect();
    let names: Vec<&str> = references.iter().map(|c| c.name.as_str()).collect();
    let prompt = build_scene_prompt(scene, &names, aspect_ratio, style);

    let mut parts = vec![Part::text(prompt)];
    parts.extend(
        references
            .iter()
            .filter_map(|c| c.reference())
            .map(|asset| Part::image(&asset)),
    );

    GenerateRequest::new(parts, GenerationConfig::image_only(Some(aspect_ratio)))
}

/// アイテム差し替えリクエスト
pub fn item_swap_request(
    instruction: &str,
    base: &ImageAsset,
    item: &ImageAsset,
    aspect_ratio: &str,
) -> GenerateRequest {
    let parts = vec![
        Part::image(base),
        Part::image(item),
        Part::text(build_item_swap_prompt(instruction, aspect_ratio)),
    ];
    GenerateRequest::new(parts, GenerationConfig::image_only(Some(aspect_ratio)))
}

/// 顔差し替えリクエスト
pub fn face_swap_request(
    target: &ImageAsset,
    source_face: &ImageAsset,
    aspect_ratio: &str,
) -> GenerateRequest {
    let parts = vec![
        Part::text(build_face_swap_prompt(aspect_ratio)),
        Part::image(target),
        Part::image(source_face),
    ];
    GenerateRequest::new(parts, GenerationConfig::image_only(Some(aspect_ratio)))
}

/// 背景除去リクエスト
pub fn background_removal_request(image: &ImageAsset) -> GenerateRequest {
    let parts = vec![
        Part::image(image),
        Part::text(build_background_removal_prompt()),
    ];
    GenerateRequest::new(parts, GenerationConfig::image_only(None))
}

/// generateContent レスポンス
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<ResponseContent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponsePart {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, rename = "inlineData", alias = "inline_data")]
    pub inline_data: Option<InlineData>,
}

impl GenerateResponse {
    /// 最初のインライン画像のBase64を返す
    pub fn first_image(&self) -> Result<&str> {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
            .find_map(|p| p.inline_data.as_ref())
            .map(|d| d.data.as_str())
            .ok_or(Error::NoImageData)
    }

    /// テキストパートを連結（画像なし時のログ用）
    pub fn text(&self) -> String {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
            .filter_map(|p| p.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// レスポンスJSONから画像を取り出す
pub fn parse_image_response(body: &str) -> Result<String> {
    let response: GenerateResponse = serde_json::from_str(body)?;
    response.first_image().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(tag: &str) -> ImageAsset {
        ImageAsset::new(tag, "image/png")
    }

    fn inline_data_of(part: &Part) -> Option<&str> {
        match part {
            Part::InlineData { inline_data } => Some(inline_data.data.as_str()),
            Part::Text { .. } => None,
        }
    }

    fn character(id: u32, selected: bool, image: Option<&str>) -> Character {
        Character {
            image: image.map(str::to_string),
            mime_type: image.map(|_| "image/jpeg".to_string()),
            selected,
            ..Character::placeholder(id)
        }
    }

    // =============================================
    // シリアライズ
    // =============================================

    #[test]
    fn test_part_text_serialize() {
        let json = serde_json::to_string(&Part::text("Hello")).expect("シリアライズ失敗");
        assert_eq!(json, r#"{"text":"Hello"}"#);
    }

    #[test]
    fn test_part_inline_data_serialize() {
        let json = serde_json::to_string(&Part::image(&asset("b64"))).expect("シリアライズ失敗");
        assert_eq!(json, r#"{"inlineData":{"mimeType":"image/png","data":"b64"}}"#);
    }

    #[test]
    fn test_request_serialize_with_ratio_hint() {
        let request = face_swap_request(&asset("t"), &asset("s"), "16:9");
        let json = serde_json::to_value(&request).expect("シリアライズ失敗");
        assert_eq!(json["generationConfig"]["responseModalities"][0], "IMAGE");
        assert_eq!(json["generationConfig"]["imageConfig"]["aspectRatio"], "16:9");
    }

    #[test]
    fn test_request_serialize_without_ratio_hint() {
        let request = item_swap_request("swap", &asset("b"), &asset("i"), "21:9");
        let json = serde_json::to_value(&request).expect("シリアライズ失敗");
        assert!(json["generationConfig"].get("imageConfig").is_none());
        let text = json["contents"][0]["parts"][2]["text"].as_str().unwrap();
        assert!(text.contains("MANDATORY ASPECT RATIO: 21:9"));
    }

    // =============================================
    // パート順序
    // =============================================

    #[test]
    fn test_scene_request_order_and_filter() {
        let characters = vec![
            character(1, true, Some("img1")),
            character(2, false, Some("img2")),
            character(3, true, None),
            character(4, true, Some("img4")),
        ];
        let request = scene_request("cat jumping", &characters, "1:1", ImageStyle::Anime);
        let parts = request.parts();

        assert_eq!(parts.len(), 3);
        match &parts[0] {
            Part::Text { text } => {
                assert!(text.contains("Character 1, Character 4"));
                assert!(!text.contains("Character 2"));
            }
            other => panic!("先頭はテキストのはず: {:?}", other),
        }
        assert_eq!(inline_data_of(&parts[1]), Some("img1"));
        assert_eq!(inline_data_of(&parts[2]), Some("img4"));
        assert_eq!(request.image_count(), 2);
    }

    #[test]
    fn test_item_swap_request_order() {
        let request = item_swap_request("wear it", &asset("base"), &asset("item"), "1:1");
        let parts = request.parts();
        assert_eq!(inline_data_of(&parts[0]), Some("base"));
        assert_eq!(inline_data_of(&parts[1]), Some("item"));
        assert!(matches!(parts[2], Part::Text { .. }));
    }

    #[test]
    fn test_face_swap_request_order() {
        let request = face_swap_request(&asset("target"), &asset("face"), "4:3");
        let parts = request.parts();
        assert!(matches!(parts[0], Part::Text { .. }));
        assert_eq!(inline_data_of(&parts[1]), Some("target"));
        assert_eq!(inline_data_of(&parts[2]), Some("face"));
    }

    #[test]
    fn test_background_removal_request() {
        let request = background_removal_request(&asset("photo"));
        let parts = request.parts();
        assert_eq!(parts.len(), 2);
        assert_eq!(inline_data_of(&parts[0]), Some("photo"));
        assert!(matches!(parts[1], Part::Text { .. }));
        assert!(request.generation_config.image_config.is_none());
    }

    #[test]
    fn test_unsupported_ratio_omits_hint() {
        for ratio in ["21:9", "2:3", "5:4", "1:2", "Custom"] {
            let request = face_swap_request(&asset("t"), &asset("s"), ratio);
            assert!(request.generation_config.image_config.is_none(), "{}", ratio);
        }
    }

    // =============================================
    // レスポンス
    // =============================================

    #[test]
    fn test_parse_image_response_first_inline() {
        let body = r#"{
            "candidates": [{
                "content": {
                    "parts": [
                        {"text": "Here is your image"},
                        {"inlineData": {"mimeType": "image/png", "data": "FIRST"}},
                        {"inlineData": {"mimeType": "image/png", "data": "SECOND"}}
                    ]
                }
            }]
        }"#;
        assert_eq!(parse_image_response(body).unwrap(), "FIRST");
    }

    #[test]
    fn test_parse_image_response_snake_case() {
        let body = r#"{"candidates":[{"content":{"parts":[{"inline_data":{"mime_type":"image/png","data":"X"}}]}}]}"#;
        assert_eq!(parse_image_response(body).unwrap(), "X");
    }

    #[test]
    fn test_parse_image_response_text_only() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"I cannot do that"}]}}]}"#;
        let err = parse_image_response(body).unwrap_err();
        assert!(matches!(err, Error::NoImageData));
        assert_eq!(err.to_string(), "no image data in response");
    }

    #[test]
    fn test_parse_image_response_no_candidates() {
        assert!(matches!(parse_image_response("{}"), Err(Error::NoImageData)));
        assert!(matches!(
            parse_image_response(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#),
            Err(Error::NoImageData)
        ));
    }

    #[test]
    fn test_parse_image_response_invalid_json() {
        assert!(matches!(parse_image_response("not json"), Err(Error::Json(_))));
    }
}
