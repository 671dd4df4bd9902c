//! プロンプト生成モジュール
//!
//! CLIと対話セッションで共有されるプロンプト生成ロジック:
//! - SUPPORTED_ASPECT_RATIOS: APIが直接受け付ける比率
//! - style_instruction: スタイル名 → 指示文
//! - build_*_prompt: 各モードの指示テキスト
//! - parse_scene_prompts / variant_label: 送信時の分割とラベル付け

use crate::types::ImageStyle;

/// APIの imageConfig.aspectRatio が受け付ける比率
pub const SUPPORTED_ASPECT_RATIOS: &[&str] = &["1:1", "3:4", "4:3", "9:16", "16:9"];

/// 出力枚数の指示（全モード共通）
const SINGLE_OUTPUT_DIRECTIVE: &str = "OUTPUT: Produce exactly ONE image. Do not return a grid, collage, or multiple variations.";

/// 比率がAPIのヒントとして渡せるか
pub fn is_supported_aspect_ratio(ratio: &str) -> bool {
    SUPPORTED_ASPECT_RATIOS.contains(&ratio)
}

/// スタイル → 指示文（全域関数、未知はDefault扱い）
pub fn style_instruction(style: ImageStyle) -> &'static str {
    match style {
        ImageStyle::Cyberpunk => "Generate the image in a vibrant, high-contrast cyberpunk style with neon lights, futuristic cityscapes, and cybernetic elements.",
        ImageStyle::Anime => "Generate the image in a classic 90s anime style, with detailed hand-drawn aesthetics, film grain, and expressive characters.",
        ImageStyle::WatercolorPainting => "Generate the image as a beautiful watercolor painting with soft edges, blended colors, and a textured paper look.",
        ImageStyle::Cinematic => "Generate the image in a cinematic style with dramatic lighting, a shallow depth of field, and a widescreen aspect ratio feel. The colors should be rich and moody.",
        ImageStyle::GlitchArt => "Generate the image in a glitch art style, with digital artifacts, scan lines, color aberrations, and a distorted, chaotic aesthetic.",
        ImageStyle::PopSurrealism => "Generate the image in a Pop Surrealism (or Lowbrow) style, featuring cartoonish, big-eyed figures in a whimsical or bizarre, dream-like setting. The colors should be vibrant and saturated.",
        ImageStyle::ArtDecoRevival => "Generate the image in an elegant Art Deco Revival style, characterized by bold geometric patterns, symmetrical designs, rich colors, and a glamorous, vintage 1920s feel.",
        ImageStyle::AbstractDataArt => "Generate the image in an Abstract Data Art style, using algorithms and data visualization principles to create complex, geometric, and colorful compositions.",
        ImageStyle::KineticArt => "Generate the image in a Kinetic Art style, creating a sense of movement, vibration, or optical illusion through patterns, lines, and composition.",
        ImageStyle::AsciiArtOverlay => "Generate the image with a creative ASCII art overlay. The underlying image should be clear, but with a stylized layer of text characters forming the visual details.",
        ImageStyle::SynesthesiaArt => "Generate the image in a Synesthesia Art style, translating abstract concepts or emotions into a vibrant explosion of interconnected colors, shapes, and textures.",
        ImageStyle::SumiE => "Generate the image in a traditional Japanese Sumi-e (ink wash) style, emphasizing minimalist beauty, flowing brushstrokes, and a monochromatic palette with subtle gradients.",
        ImageStyle::LowPoly3d => "Generate the image in a Low Poly 3D style, featuring a faceted, geometric look as if constructed from a 3D mesh with flat-shaded polygons. Colors should be clean and vibrant.",
        ImageStyle::Default => "Generate the image in a consistent, high-quality cartoon style.",
    }
}

/// 比率指定ブロック
fn aspect_ratio_block(aspect_ratio: &str) -> String {
    format!(
        r#"[SYSTEM CONFIGURATION]
MANDATORY ASPECT RATIO: {aspect_ratio}
- The final output image MUST strictly adhere to the {aspect_ratio} aspect ratio.
- If the generated content does not fit, EXTEND the background (outpaint) to fill the ratio. Do not crop important details."#
    )
}

/// シーン生成（ストーリーモード）用プロンプト
///
/// # Arguments
/// * `scene` - シーンプロンプト1件
/// * `character_names` - 選択中キャラクター名
/// * `aspect_ratio` - "W:H" またはプリセット
/// * `style` - 生成スタイル
pub fn build_scene_prompt(
    scene: &str,
    character_names: &[&str],
    aspect_ratio: &str,
    style: ImageStyle,
) -> String {
    let ratio_block = aspect_ratio_block(aspect_ratio);
    let characters = if character_names.is_empty() {
        "the character(s) described".to_string()
    } else {
        character_names.join(", ")
    };
    let style_text = style_instruction(style);

    format!(
        r#"{ratio_block}

You are an AI assistant creating a set of story images with consistent characters.
Reference the following characters: {characters}.

Scene Prompt: "{scene}"

Style instructions:
- {style_text}
- Ensure the characters look the same as in the provided reference images.
- The image must be in 4K resolution and highly detailed.

{SINGLE_OUTPUT_DIRECTIVE}"#
    )
}

/// アイテム差し替え用プロンプト
///
/// IMAGE 1 = 人物、IMAGE 2 = アイテム（画像が先、テキストが後）
pub fn build_item_swap_prompt(instruction: &str, aspect_ratio: &str) -> String {
    let ratio_block = aspect_ratio_block(aspect_ratio);

    format!(
        r#"{ratio_block}

TASK: Generative Fashion Integration.

INPUTS:
- IMAGE 1 (First image): Model/Person (Mannequin).
- IMAGE 2 (Second image): Clothing/Item (Apparel).

INSTRUCTION:
{instruction}

Generate a single photorealistic image of the person from IMAGE 1, but wearing the item/clothing from IMAGE 2.

GUIDELINES:
- Maintain the pose, body shape, and the background scene of IMAGE 1 exactly.
- Drape the item from IMAGE 2 naturally over the person.
- Adapt the lighting of the item to match the scene in IMAGE 1.

{SINGLE_OUTPUT_DIRECTIVE}"#
    )
}

/// 顔差し替え用プロンプト
///
/// テキストを先に置き、IMAGE 1 = ターゲット、IMAGE 2 = 顔ソース
pub fn build_face_swap_prompt(aspect_ratio: &str) -> String {
    let ratio_block = aspect_ratio_block(aspect_ratio);

    format!(
        r#"{ratio_block}

TASK: ABSOLUTE FACE REPLACEMENT

INPUTS:
- IMAGE 1 (First Image): The TARGET Scene. Keep body, pose, hair, clothes, and background.
- IMAGE 2 (Second Image): The SOURCE Face. Use this identity.

INSTRUCTION:
You are an expert digital editor. Your task is to replace the face of the person in IMAGE 1 with the face of the person in IMAGE 2.

EXECUTION RULES:
1. OVERWRITE IDENTITY: The facial features (eyes, nose, mouth, eyebrows, jaw structure) in the output MUST match IMAGE 2.
2. FORBIDDEN: Do NOT output the original face from IMAGE 1. The identity must change.
3. INTEGRATION: Map the face from IMAGE 2 onto the head angle and lighting conditions of IMAGE 1.
4. PRESERVATION: Do not change the hair style, hair color, ears, neck, clothing, or background of IMAGE 1.

If the resulting face looks like the person in IMAGE 1, you have failed.
The resulting face MUST look like the person in IMAGE 2.

{SINGLE_OUTPUT_DIRECTIVE}"#
    )
}

/// 背景除去用プロンプト（比率指定なし）
pub fn build_background_removal_prompt() -> String {
    format!(
        r#"[SYSTEM CONFIGURATION]
TASK: Background Removal.

INPUT: One reference image.

INSTRUCTION:
Identify the main subject in the provided image. Generate a new image containing ONLY that subject.

RULES:
1. The background MUST be perfectly plain white (#FFFFFF).
2. The subject must remain EXACTLY as they appear in the source image (same pose, lighting, details).
3. Do not add any new elements.
4. Do not crop the subject.

{SINGLE_OUTPUT_DIRECTIVE}"#
    )
}

/// シーンプロンプト入力を分割
///
/// 改行とカンマで区切り、前後の空白を除去して空要素を捨てる
pub fn parse_scene_prompts(text: &str) -> Vec<String> {
    text.split(['\n', ','])
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// バリアントのラベル（count > 1 のとき "(vN)" を付与、N は1始まり）
pub fn variant_label(base: &str, variant: u32, count: u32) -> String {
    if count > 1 {
        format!("{} (v{})", base, variant + 1)
    } else {
        base.to_string()
    }
}
