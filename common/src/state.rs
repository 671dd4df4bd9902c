//! スタジオ状態とリデューサ
//!
//! 状態は StudioState の不変スナップショットとして扱い、
//! 変更はすべて `reduce(&state, action)` で新しいスナップショットを作る。
//!
//! - モードごとに入力と結果一覧を独立して保持（切替で消えない）
//! - 送信は Idle → Submitting → Idle の順に遷移
//! - plan_* は送信前チェックを行い、並列実行するジョブ一覧を返す

use crate::error::ValidationError;
use crate::prompts::{parse_scene_prompts, variant_label};
use crate::request::{
    background_removal_request, face_swap_request, item_swap_request, scene_request,
    GenerateRequest,
};
use crate::types::{
    parse_dimension, AspectRatio, Character, CustomRatio, GeneratedImage, ImageAsset, ImageStyle,
    Mode, CHARACTER_SLOTS, MAX_IMAGES_PER_SUBMIT,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// アイテム差し替えの初期指示
pub const DEFAULT_SWAP_INSTRUCTION: &str = "Put the item on the person";

/// 顔差し替え結果のラベル
pub const FACE_SWAP_LABEL: &str = "Face Swap";

/// 背景除去結果のラベル
pub const BACKGROUND_REMOVAL_LABEL: &str = "Background Removal";

/// アスペクト比の設定（プリセット + Custom値）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RatioSetting {
    pub ratio: AspectRatio,
    pub custom: CustomRatio,
}

impl RatioSetting {
    /// APIへ渡す比率文字列
    pub fn ratio_string(&self) -> String {
        self.ratio.ratio_string(self.custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryState {
    pub characters: Vec<Character>,
    pub style: ImageStyle,
    pub ratio: RatioSetting,
    pub prompts: String,
    pub results: Vec<GeneratedImage>,
}

impl Default for StoryState {
    fn default() -> Self {
        Self {
            characters: (1..=CHARACTER_SLOTS).map(Character::placeholder).collect(),
            style: ImageStyle::Default,
            ratio: RatioSetting::default(),
            prompts: String::new(),
            results: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSwapState {
    pub base_image: Option<ImageAsset>,
    pub item_image: Option<ImageAsset>,
    pub instruction: String,
    pub ratio: RatioSetting,
    pub results: Vec<GeneratedImage>,
}

impl Default for ItemSwapState {
    fn default() -> Self {
        Self {
            base_image: None,
            item_image: None,
            instruction: DEFAULT_SWAP_INSTRUCTION.to_string(),
            ratio: RatioSetting::default(),
            results: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceSwapState {
    pub target_image: Option<ImageAsset>,
    pub source_image: Option<ImageAsset>,
    pub ratio: RatioSetting,
    pub results: Vec<GeneratedImage>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundRemovalState {
    pub input_image: Option<ImageAsset>,
    pub results: Vec<GeneratedImage>,
}

/// 単一画像の入力スロット
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSlot {
    SwapBase,
    SwapItem,
    FaceTarget,
    FaceSource,
    BackgroundInput,
}

impl ImageSlot {
    pub fn label(&self) -> &'static str {
        match self {
            ImageSlot::SwapBase => "Person/Target",
            ImageSlot::SwapItem => "Item/Clothing",
            ImageSlot::FaceTarget => "Body/Scene",
            ImageSlot::FaceSource => "Face to Use",
            ImageSlot::BackgroundInput => "Image to Process",
        }
    }
}

/// 送信状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Submission {
    #[default]
    Idle,
    /// 結果グリッドに placeholders 個のスケルトンを出す
    Submitting { mode: Mode, placeholders: u32 },
}

/// ユーザーへの通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Validation(ValidationError),
    BatchFailed(Mode),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Validation(e) => write!(f, "{}", e),
            Notice::BatchFailed(Mode::ItemSwap) => f.write_str("Failed to generate swap image."),
            Notice::BatchFailed(Mode::FaceSwap) => {
                f.write_str("Failed to generate face swap image.")
            }
            Notice::BatchFailed(Mode::BackgroundRemoval) => {
                f.write_str("Failed to remove background.")
            }
            Notice::BatchFailed(Mode::Story) => f.write_str("Failed to generate story images."),
        }
    }
}

/// スタジオ全体の状態スナップショット
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudioState {
    pub active_mode: Mode,
    /// 全モード共通の生成枚数（1..=4）
    pub number_of_images: u32,
    pub story: StoryState,
    pub item_swap: ItemSwapState,
    pub face_swap: FaceSwapState,
    pub background_removal: BackgroundRemovalState,
    pub submission: Submission,
    pub notice: Option<Notice>,
    next_image_id: u64,
}

impl Default for StudioState {
    fn default() -> Self {
        Self::new(1)
    }
}

impl StudioState {
    /// 初期状態。id_seed は生成結果IDの開始値（通常は起動時刻のミリ秒）
    pub fn new(id_seed: u64) -> Self {
        Self {
            active_mode: Mode::Story,
            number_of_images: 1,
            story: StoryState::default(),
            item_swap: ItemSwapState::default(),
            face_swap: FaceSwapState::default(),
            background_removal: BackgroundRemovalState::default(),
            submission: Submission::Idle,
            notice: None,
            next_image_id: id_seed,
        }
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.submission, Submission::Submitting { .. })
    }

    /// モードの結果一覧（新しい順）
    pub fn results(&self, mode: Mode) -> &[GeneratedImage] {
        match mode {
            Mode::Story => &self.story.results,
            Mode::ItemSwap => &self.item_swap.results,
            Mode::FaceSwap => &self.face_swap.results,
            Mode::BackgroundRemoval => &self.background_removal.results,
        }
    }

    /// 現在表示中の結果一覧
    pub fn displayed_images(&self) -> &[GeneratedImage] {
        self.results(self.active_mode)
    }

    fn results_mut(&mut self, mode: Mode) -> &mut Vec<GeneratedImage> {
        match mode {
            Mode::Story => &mut self.story.results,
            Mode::ItemSwap => &mut self.item_swap.results,
            Mode::FaceSwap => &mut self.face_swap.results,
            Mode::BackgroundRemoval => &mut self.background_removal.results,
        }
    }

    /// 比率設定（背景除去は持たない）
    pub fn ratio_setting(&self, mode: Mode) -> Option<&RatioSetting> {
        match mode {
            Mode::Story => Some(&self.story.ratio),
            Mode::ItemSwap => Some(&self.item_swap.ratio),
            Mode::FaceSwap => Some(&self.face_swap.ratio),
            Mode::BackgroundRemoval => None,
        }
    }

    fn ratio_setting_mut(&mut self, mode: Mode) -> Option<&mut RatioSetting> {
        match mode {
            Mode::Story => Some(&mut self.story.ratio),
            Mode::ItemSwap => Some(&mut self.item_swap.ratio),
            Mode::FaceSwap => Some(&mut self.face_swap.ratio),
            Mode::BackgroundRemoval => None,
        }
    }

    pub fn image(&self, slot: ImageSlot) -> Option<&ImageAsset> {
        match slot {
            ImageSlot::SwapBase => self.item_swap.base_image.as_ref(),
            ImageSlot::SwapItem => self.item_swap.item_image.as_ref(),
            ImageSlot::FaceTarget => self.face_swap.target_image.as_ref(),
            ImageSlot::FaceSource => self.face_swap.source_image.as_ref(),
            ImageSlot::BackgroundInput => self.background_removal.input_image.as_ref(),
        }
    }

    fn image_mut(&mut self, slot: ImageSlot) -> &mut Option<ImageAsset> {
        match slot {
            ImageSlot::SwapBase => &mut self.item_swap.base_image,
            ImageSlot::SwapItem => &mut self.item_swap.item_image,
            ImageSlot::FaceTarget => &mut self.face_swap.target_image,
            ImageSlot::FaceSource => &mut self.face_swap.source_image,
            ImageSlot::BackgroundInput => &mut self.background_removal.input_image,
        }
    }

    fn character_mut(&mut self, id: u32) -> Option<&mut Character> {
        self.story.characters.iter_mut().find(|c| c.id == id)
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_image_id;
        self.next_image_id += 1;
        id
    }
}

/// 1回のバッチの結果（作成順、失敗は None）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    pub mode: Mode,
    /// (ラベル, Base64) または失敗
    pub results: Vec<Option<(String, String)>>,
}

impl BatchOutcome {
    pub fn attempted(&self) -> usize {
        self.results.len()
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_some()).count()
    }
}

/// リデューサのアクション
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetActiveMode(Mode),
    SetNumberOfImages(u32),
    /// idが一致するスロットを丸ごと置き換える
    UpdateCharacter(Character),
    SetCharacterName { id: u32, name: String },
    SetCharacterSelected { id: u32, selected: bool },
    SetCharacterImage { id: u32, image: Option<ImageAsset> },
    SetStyle(ImageStyle),
    SetPrompts(String),
    SetSwapInstruction(String),
    SetImage { slot: ImageSlot, image: Option<ImageAsset> },
    SetAspectRatio { mode: Mode, ratio: AspectRatio },
    /// 生の入力文字列（parse_dimension で補正）
    SetCustomWidth { mode: Mode, raw: String },
    SetCustomHeight { mode: Mode, raw: String },
    Rejected(ValidationError),
    SubmitStarted { mode: Mode, placeholders: u32 },
    BatchSettled(BatchOutcome),
    /// アクティブモードから1件削除
    DeleteImage(u64),
    /// アクティブモードの一覧を空にする
    ClearAll,
    DismissNotice,
}

/// 状態遷移（純粋関数）
pub fn reduce(state: &StudioState, action: Action) -> StudioState {
    let mut next = state.clone();

    match action {
        Action::SetActiveMode(mode) => next.active_mode = mode,
        Action::SetNumberOfImages(count) => {
            next.number_of_images = count.clamp(1, MAX_IMAGES_PER_SUBMIT);
        }
        Action::UpdateCharacter(character) => {
            if let Some(slot) = next.character_mut(character.id) {
                *slot = character;
            }
        }
        Action::SetCharacterName { id, name } => {
            if let Some(slot) = next.character_mut(id) {
                slot.name = name;
            }
        }
        Action::SetCharacterSelected { id, selected } => {
            if let Some(slot) = next.character_mut(id) {
                slot.selected = selected;
            }
        }
        Action::SetCharacterImage { id, image } => {
            if let Some(slot) = next.character_mut(id) {
                match image {
                    Some(asset) => {
                        slot.image = Some(asset.base64);
                        slot.mime_type = Some(asset.mime_type);
                    }
                    None => {
                        slot.image = None;
                        slot.mime_type = None;
                    }
                }
            }
        }
        Action::SetStyle(style) => next.story.style = style,
        Action::SetPrompts(prompts) => next.story.prompts = prompts,
        Action::SetSwapInstruction(instruction) => next.item_swap.instruction = instruction,
        Action::SetImage { slot, image } => *next.image_mut(slot) = image,
        Action::SetAspectRatio { mode, ratio } => {
            if let Some(setting) = next.ratio_setting_mut(mode) {
                setting.ratio = ratio;
            }
        }
        Action::SetCustomWidth { mode, raw } => {
            if let Some(setting) = next.ratio_setting_mut(mode) {
                setting.custom.width = parse_dimension(&raw);
            }
        }
        Action::SetCustomHeight { mode, raw } => {
            if let Some(setting) = next.ratio_setting_mut(mode) {
                setting.custom.height = parse_dimension(&raw);
            }
        }
        Action::Rejected(error) => next.notice = Some(Notice::Validation(error)),
        Action::SubmitStarted { mode, placeholders } => {
            next.submission = Submission::Submitting { mode, placeholders };
            next.notice = None;
        }
        Action::BatchSettled(outcome) => {
            let attempted = outcome.attempted();
            let mut merged: Vec<GeneratedImage> = Vec::with_capacity(outcome.succeeded());
            for (prompt, base64) in outcome.results.into_iter().flatten() {
                let id = next.allocate_id();
                merged.push(GeneratedImage { id, prompt, base64 });
            }

            // ストーリーモードは全件失敗でも通知しない
            if merged.is_empty() && attempted > 0 && outcome.mode != Mode::Story {
                next.notice = Some(Notice::BatchFailed(outcome.mode));
            }

            let list = next.results_mut(outcome.mode);
            merged.append(list);
            *list = merged;

            next.submission = Submission::Idle;
        }
        Action::DeleteImage(id) => {
            let mode = next.active_mode;
            next.results_mut(mode).retain(|img| img.id != id);
        }
        Action::ClearAll => {
            let mode = next.active_mode;
            next.results_mut(mode).clear();
        }
        Action::DismissNotice => next.notice = None,
    }

    next
}

/// 1回の生成呼び出しの入力
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationTask {
    Scene {
        scene: String,
        characters: Vec<Character>,
        aspect_ratio: String,
        style: ImageStyle,
    },
    ItemSwap {
        instruction: String,
        base: ImageAsset,
        item: ImageAsset,
        aspect_ratio: String,
    },
    FaceSwap {
        target: ImageAsset,
        source_face: ImageAsset,
        aspect_ratio: String,
    },
    BackgroundRemoval {
        image: ImageAsset,
    },
}

impl GenerationTask {
    /// リクエストを組み立てる
    pub fn request(&self) -> GenerateRequest {
        match self {
            GenerationTask::Scene { scene, characters, aspect_ratio, style } => {
                scene_request(scene, characters, aspect_ratio, *style)
            }
            GenerationTask::ItemSwap { instruction, base, item, aspect_ratio } => {
                item_swap_request(instruction, base, item, aspect_ratio)
            }
            GenerationTask::FaceSwap { target, source_face, aspect_ratio } => {
                face_swap_request(target, source_face, aspect_ratio)
            }
            GenerationTask::BackgroundRemoval { image } => background_removal_request(image),
        }
    }
}

/// ラベル付きジョブ
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub label: String,
    pub task: GenerationTask,
}

/// 送信計画（jobs は作成順）
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionPlan {
    pub mode: Mode,
    pub placeholders: u32,
    pub jobs: Vec<Job>,
}

/// モードに応じた送信計画
pub fn plan_submission(state: &StudioState, mode: Mode) -> Result<SubmissionPlan, ValidationError> {
    if state.is_submitting() {
        return Err(ValidationError::Busy);
    }
    match mode {
        Mode::Story => plan_story(state),
        Mode::ItemSwap => plan_item_swap(state),
        Mode::FaceSwap => plan_face_swap(state),
        Mode::BackgroundRemoval => plan_background_removal(state),
    }
}

/// ストーリー: プロンプト数 × 枚数 のジョブ
pub fn plan_story(state: &StudioState) -> Result<SubmissionPlan, ValidationError> {
    let prompts = parse_scene_prompts(&state.story.prompts);
    if prompts.is_empty() {
        return Err(ValidationError::EmptyPrompts);
    }

    let references: Vec<Character> = state
        .story
        .characters
        .iter()
        .filter(|c| c.is_usable())
        .cloned()
        .collect();
    if references.is_empty() {
        return Err(ValidationError::NoCharacterSelected);
    }

    let count = state.number_of_images;
    let aspect_ratio = state.story.ratio.ratio_string();
    let jobs = prompts
        .iter()
        .flat_map(|prompt| {
            let references = &references;
            let aspect_ratio = &aspect_ratio;
            (0..count).map(move |i| Job {
                label: variant_label(prompt, i, count),
                task: GenerationTask::Scene {
                    scene: prompt.clone(),
                    characters: references.clone(),
                    aspect_ratio: aspect_ratio.clone(),
                    style: state.story.style,
                },
            })
        })
        .collect();

    Ok(SubmissionPlan {
        mode: Mode::Story,
        placeholders: count,
        jobs,
    })
}

/// アイテム差し替え: 枚数分のジョブ
pub fn plan_item_swap(state: &StudioState) -> Result<SubmissionPlan, ValidationError> {
    let swap = &state.item_swap;
    let (Some(base), Some(item)) = (&swap.base_image, &swap.item_image) else {
        return Err(ValidationError::MissingSwapImages);
    };
    if swap.instruction.trim().is_empty() {
        return Err(ValidationError::EmptySwapPrompt);
    }

    let count = state.number_of_images;
    let aspect_ratio = swap.ratio.ratio_string();
    let jobs = (0..count)
        .map(|i| Job {
            label: variant_label(&swap.instruction, i, count),
            task: GenerationTask::ItemSwap {
                instruction: swap.instruction.clone(),
                base: base.clone(),
                item: item.clone(),
                aspect_ratio: aspect_ratio.clone(),
            },
        })
        .collect();

    Ok(SubmissionPlan {
        mode: Mode::ItemSwap,
        placeholders: count,
        jobs,
    })
}

/// 顔差し替え: 枚数分のジョブ
pub fn plan_face_swap(state: &StudioState) -> Result<SubmissionPlan, ValidationError> {
    let face = &state.face_swap;
    let (Some(target), Some(source)) = (&face.target_image, &face.source_image) else {
        return Err(ValidationError::MissingFaceImages);
    };

    let count = state.number_of_images;
    let aspect_ratio = face.ratio.ratio_string();
    let jobs = (0..count)
        .map(|i| Job {
            label: variant_label(FACE_SWAP_LABEL, i, count),
            task: GenerationTask::FaceSwap {
                target: target.clone(),
                source_face: source.clone(),
                aspect_ratio: aspect_ratio.clone(),
            },
        })
        .collect();

    Ok(SubmissionPlan {
        mode: Mode::FaceSwap,
        placeholders: count,
        jobs,
    })
}

/// 背景除去: 枚数設定に関係なく1件
pub fn plan_background_removal(state: &StudioState) -> Result<SubmissionPlan, ValidationError> {
    let Some(image) = &state.background_removal.input_image else {
        return Err(ValidationError::MissingBackgroundImage);
    };

    Ok(SubmissionPlan {
        mode: Mode::BackgroundRemoval,
        placeholders: state.number_of_images,
        jobs: vec![Job {
            label: BACKGROUND_REMOVAL_LABEL.to_string(),
            task: GenerationTask::BackgroundRemoval {
                image: image.clone(),
            },
        }],
    })
}

/// ダウンロード用ファイル名（連番は1始まり3桁）
pub fn download_filename(position: usize, date: &str) -> String {
    format!("{:03}_{}.png", position + 1, date)
}

/// 一括ダウンロード計画（表示中の並び順）
pub fn download_plan<'a>(images: &'a [GeneratedImage], date: &str) -> Vec<(String, &'a GeneratedImage)> {
    images
        .iter()
        .enumerate()
        .map(|(i, image)| (download_filename(i, date), image))
        .collect()
}
