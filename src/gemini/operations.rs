//! モード別の生成呼び出し
//!
//! 各関数はリクエストを組み立てて1回だけ呼び出す。失敗はそのまま返す。

use super::client::ImageGenerator;
use crate::error::GenerationError;
use genai_studio_common::request::{
    background_removal_request, face_swap_request, item_swap_request, scene_request,
};
use genai_studio_common::{Character, GenerationTask, ImageAsset, ImageStyle, Mode};

type Result<T> = std::result::Result<T, GenerationError>;

/// シーン生成（ストーリーモード）
pub async fn generate_scene<G: ImageGenerator>(
    generator: &G,
    scene: &str,
    characters: &[Character],
    aspect_ratio: &str,
    style: ImageStyle,
) -> Result<String> {
    let request = scene_request(scene, characters, aspect_ratio, style);
    generator.generate(Mode::Story, &request).await
}

/// アイテム差し替え
pub async fn generate_item_swap<G: ImageGenerator>(
    generator: &G,
    instruction: &str,
    base: &ImageAsset,
    item: &ImageAsset,
    aspect_ratio: &str,
) -> Result<String> {
    let request = item_swap_request(instruction, base, item, aspect_ratio);
    generator.generate(Mode::ItemSwap, &request).await
}

/// 顔差し替え
pub async fn generate_face_swap<G: ImageGenerator>(
    generator: &G,
    target: &ImageAsset,
    source_face: &ImageAsset,
    aspect_ratio: &str,
) -> Result<String> {
    let request = face_swap_request(target, source_face, aspect_ratio);
    generator.generate(Mode::FaceSwap, &request).await
}

/// 背景除去
pub async fn remove_background<G: ImageGenerator>(generator: &G, image: &ImageAsset) -> Result<String> {
    let request = background_removal_request(image);
    generator.generate(Mode::BackgroundRemoval, &request).await
}

/// 送信計画のタスクを実行
pub async fn run_task<G: ImageGenerator>(generator: &G, task: &GenerationTask) -> Result<String> {
    match task {
        GenerationTask::Scene { scene, characters, aspect_ratio, style } => {
            generate_scene(generator, scene, characters, aspect_ratio, *style).await
        }
        GenerationTask::ItemSwap { instruction, base, item, aspect_ratio } => {
            generate_item_swap(generator, instruction, base, item, aspect_ratio).await
        }
        GenerationTask::FaceSwap { target, source_face, aspect_ratio } => {
            generate_face_swap(generator, target, source_face, aspect_ratio).await
        }
        GenerationTask::BackgroundRemoval { image } => remove_background(generator, image).await,
    }
}
