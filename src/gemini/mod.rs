mod client;
mod operations;

pub use client::{GeminiClient, ImageGenerator};
pub use operations::{
    generate_face_swap, generate_item_swap, generate_scene, remove_background, run_task,
};
