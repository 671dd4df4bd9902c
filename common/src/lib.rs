//! GenAI Studio Common Library
//!
//! CLIと対話セッションで共有される型・プロンプト生成・状態遷移

pub mod types;
pub mod error;
pub mod prompts;
pub mod request;
pub mod state;

pub use types::{
    AspectRatio, Character, CustomRatio, GeneratedImage, ImageAsset, ImageStyle, Mode,
    parse_dimension,
};
pub use error::{Error, Result, ValidationError};
pub use prompts::{
    build_background_removal_prompt, build_face_swap_prompt, build_item_swap_prompt,
    build_scene_prompt, is_supported_aspect_ratio, parse_scene_prompts, style_instruction,
    variant_label, SUPPORTED_ASPECT_RATIOS,
};
pub use request::{GenerateRequest, GenerateResponse, GenerationConfig, Part, parse_image_response};
pub use state::{
    reduce, plan_submission, download_filename, download_plan, Action, BatchOutcome,
    GenerationTask, ImageSlot, Job, Notice, StudioState, Submission, SubmissionPlan,
};
