//! 対話セッション
//!
//! モードごとのメニューを出し、入力を Action に変換してコントローラへ渡す。
//! 状態はセッション中のメモリにだけ保持する。

use crate::codec;
use crate::commands::{print_report, submit_with_spinner};
use crate::controller::Controller;
use crate::error::Result;
use crate::gemini::ImageGenerator;
use dialoguer::{Confirm, Input, Select};
use genai_studio_common::types::MAX_IMAGES_PER_SUBMIT;
use genai_studio_common::{
    Action, AspectRatio, GeneratedImage, ImageSlot, ImageStyle, Mode, StudioState,
};
use std::path::{Path, PathBuf};

/// メニュー項目
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    SwitchMode,
    Generate,
    EditCharacter,
    Prompts,
    Style,
    SwapInstruction,
    Image(ImageSlot),
    Ratio,
    Count,
    ListResults,
    DownloadOne,
    DownloadAll,
    DeleteOne,
    ClearAll,
    Quit,
}

impl MenuItem {
    pub fn label(&self, state: &StudioState) -> String {
        match self {
            MenuItem::SwitchMode => format!("モード切替（現在: {}）", state.active_mode),
            MenuItem::Generate => match state.active_mode {
                Mode::BackgroundRemoval => "▶ 背景を除去".to_string(),
                _ => format!("▶ 生成（{}枚）", state.number_of_images),
            },
            MenuItem::EditCharacter => "キャラクター編集".to_string(),
            MenuItem::Prompts => {
                let count = genai_studio_common::parse_scene_prompts(&state.story.prompts).len();
                format!("シーンプロンプト（{}件）", count)
            }
            MenuItem::Style => format!("スタイル（{}）", state.story.style),
            MenuItem::SwapInstruction => format!("指示（{}）", state.item_swap.instruction),
            MenuItem::Image(slot) => {
                let mark = if state.image(*slot).is_some() { "✔" } else { "未設定" };
                format!("画像: {}（{}）", slot.label(), mark)
            }
            MenuItem::Ratio => match state.ratio_setting(state.active_mode) {
                Some(setting) => format!("アスペクト比（{}）", setting.ratio_string()),
                None => "アスペクト比".to_string(),
            },
            MenuItem::Count => format!("生成枚数（{}）", state.number_of_images),
            MenuItem::ListResults => {
                format!("{}（{}件）", state.active_mode.results_title(), state.displayed_images().len())
            }
            MenuItem::DownloadOne => "1件保存".to_string(),
            MenuItem::DownloadAll => "すべて保存".to_string(),
            MenuItem::DeleteOne => "1件削除".to_string(),
            MenuItem::ClearAll => "すべて削除".to_string(),
            MenuItem::Quit => "終了".to_string(),
        }
    }
}

/// アクティブモードのメニュー
pub fn menu_items(state: &StudioState) -> Vec<MenuItem> {
    let mut items = vec![MenuItem::SwitchMode, MenuItem::Generate];

    match state.active_mode {
        Mode::Story => items.extend([
            MenuItem::EditCharacter,
            MenuItem::Prompts,
            MenuItem::Style,
            MenuItem::Ratio,
            MenuItem::Count,
        ]),
        Mode::ItemSwap => items.extend([
            MenuItem::Image(ImageSlot::SwapBase),
            MenuItem::Image(ImageSlot::SwapItem),
            MenuItem::SwapInstruction,
            MenuItem::Ratio,
            MenuItem::Count,
        ]),
        Mode::FaceSwap => items.extend([
            MenuItem::Image(ImageSlot::FaceTarget),
            MenuItem::Image(ImageSlot::FaceSource),
            MenuItem::Ratio,
            MenuItem::Count,
        ]),
        // 背景除去は枚数設定を使わない
        Mode::BackgroundRemoval => items.push(MenuItem::Image(ImageSlot::BackgroundInput)),
    }

    if !state.displayed_images().is_empty() {
        items.extend([
            MenuItem::ListResults,
            MenuItem::DownloadOne,
            MenuItem::DownloadAll,
            MenuItem::DeleteOne,
            MenuItem::ClearAll,
        ]);
    }

    items.push(MenuItem::Quit);
    items
}

/// 対話セッションを実行
pub async fn run_studio<G: ImageGenerator>(mut controller: Controller<G>, output: &Path) -> Result<()> {
    println!("🎨 GenAI Studio - 対話モード");
    println!("保存先: {}\n", output.display());

    loop {
        let items = menu_items(controller.state());
        let labels: Vec<String> = items.iter().map(|i| i.label(controller.state())).collect();

        let choice = Select::new()
            .with_prompt(controller.state().active_mode.label())
            .items(&labels)
            .default(0)
            .interact()?;

        match items[choice] {
            MenuItem::SwitchMode => switch_mode(&mut controller)?,
            MenuItem::Generate => {
                let mode = controller.state().active_mode;
                let report = submit_with_spinner(&mut controller, mode).await;
                print_report(&report);
                controller.dispatch(Action::DismissNotice);
            }
            MenuItem::EditCharacter => edit_character(&mut controller)?,
            MenuItem::Prompts => {
                let prompts: String = Input::new()
                    .with_prompt("シーン（カンマ区切り、`\\n` で改行）")
                    .with_initial_text(controller.state().story.prompts.replace('\n', "\\n"))
                    .allow_empty(true)
                    .interact_text()?;
                controller.dispatch(Action::SetPrompts(prompts.replace("\\n", "\n")));
            }
            MenuItem::Style => {
                let names: Vec<&str> = ImageStyle::ALL.iter().map(|s| s.name()).collect();
                let current = ImageStyle::ALL
                    .iter()
                    .position(|s| *s == controller.state().story.style)
                    .unwrap_or(0);
                let index = Select::new()
                    .with_prompt("スタイル")
                    .items(&names)
                    .default(current)
                    .interact()?;
                controller.dispatch(Action::SetStyle(ImageStyle::ALL[index]));
            }
            MenuItem::SwapInstruction => {
                let instruction: String = Input::new()
                    .with_prompt("指示")
                    .with_initial_text(controller.state().item_swap.instruction.clone())
                    .allow_empty(true)
                    .interact_text()?;
                controller.dispatch(Action::SetSwapInstruction(instruction));
            }
            MenuItem::Image(slot) => edit_image(&mut controller, slot)?,
            MenuItem::Ratio => edit_ratio(&mut controller)?,
            MenuItem::Count => {
                let options: Vec<String> = (1..=MAX_IMAGES_PER_SUBMIT).map(|n| n.to_string()).collect();
                let index = Select::new()
                    .with_prompt("生成枚数")
                    .items(&options)
                    .default(controller.state().number_of_images.saturating_sub(1) as usize)
                    .interact()?;
                controller.dispatch(Action::SetNumberOfImages(index as u32 + 1));
            }
            MenuItem::ListResults => print_results(controller.state().displayed_images()),
            MenuItem::DownloadOne => {
                if let Some(id) = pick_result(controller.state().displayed_images(), "保存する画像")? {
                    match controller.download_one(id, output) {
                        Ok(Some(path)) => println!("💾 {}", path.display()),
                        Ok(None) => {}
                        Err(e) => println!("⚠ 保存失敗: {}", e),
                    }
                }
            }
            MenuItem::DownloadAll => {
                let saved: Vec<PathBuf> = controller.download_all(output).await;
                println!("💾 {}件保存しました", saved.len());
            }
            MenuItem::DeleteOne => {
                if let Some(id) = pick_result(controller.state().displayed_images(), "削除する画像")? {
                    controller.delete(id);
                }
            }
            MenuItem::ClearAll => {
                let confirmed = Confirm::new()
                    .with_prompt(format!("{}をすべて削除しますか？", controller.state().active_mode.results_title()))
                    .default(false)
                    .interact()?;
                if confirmed {
                    controller.clear_all();
                }
            }
            MenuItem::Quit => break,
        }
    }

    Ok(())
}

fn switch_mode<G: ImageGenerator>(controller: &mut Controller<G>) -> Result<()> {
    let labels: Vec<&str> = Mode::ALL.iter().map(|m| m.label()).collect();
    let current = Mode::ALL
        .iter()
        .position(|m| *m == controller.state().active_mode)
        .unwrap_or(0);
    let index = Select::new()
        .with_prompt("モード")
        .items(&labels)
        .default(current)
        .interact()?;
    controller.dispatch(Action::SetActiveMode(Mode::ALL[index]));
    Ok(())
}

fn edit_character<G: ImageGenerator>(controller: &mut Controller<G>) -> Result<()> {
    let labels: Vec<String> = controller
        .state()
        .story
        .characters
        .iter()
        .map(|c| {
            format!(
                "[{}] {}{}",
                if c.selected { "x" } else { " " },
                c.name,
                if c.image.is_some() { " 🖼" } else { "" }
            )
        })
        .collect();
    let index = Select::new()
        .with_prompt("スロット")
        .items(&labels)
        .default(0)
        .interact()?;
    let mut character = controller.state().story.characters[index].clone();

    character.name = Input::new()
        .with_prompt("名前")
        .with_initial_text(character.name.clone())
        .interact_text()?;

    let path: String = Input::new()
        .with_prompt("参照画像パス（空欄で変更なし）")
        .allow_empty(true)
        .interact_text()?;
    if !path.trim().is_empty() {
        match codec::load_image(Path::new(path.trim())) {
            Ok(asset) => {
                character.image = Some(asset.base64);
                character.mime_type = Some(asset.mime_type);
            }
            Err(e) => println!("⚠ {}", e),
        }
    }

    character.selected = Confirm::new()
        .with_prompt("このキャラクターを使う")
        .default(character.selected || character.image.is_some())
        .interact()?;

    controller.dispatch(Action::UpdateCharacter(character));
    Ok(())
}

fn edit_image<G: ImageGenerator>(controller: &mut Controller<G>, slot: ImageSlot) -> Result<()> {
    let path: String = Input::new()
        .with_prompt(format!("{} のパス（空欄で削除）", slot.label()))
        .allow_empty(true)
        .interact_text()?;

    if path.trim().is_empty() {
        controller.dispatch(Action::SetImage { slot, image: None });
        return Ok(());
    }

    match codec::load_image(Path::new(path.trim())) {
        Ok(asset) => controller.dispatch(Action::SetImage { slot, image: Some(asset) }),
        Err(e) => println!("⚠ {}", e),
    }
    Ok(())
}

fn edit_ratio<G: ImageGenerator>(controller: &mut Controller<G>) -> Result<()> {
    let mode = controller.state().active_mode;
    let Some(setting) = controller.state().ratio_setting(mode).copied() else {
        return Ok(());
    };

    let labels: Vec<&str> = AspectRatio::ALL.iter().map(|r| r.as_str()).collect();
    let current = AspectRatio::ALL
        .iter()
        .position(|r| *r == setting.ratio)
        .unwrap_or(0);
    let index = Select::new()
        .with_prompt("アスペクト比")
        .items(&labels)
        .default(current)
        .interact()?;
    let ratio = AspectRatio::ALL[index];
    controller.dispatch(Action::SetAspectRatio { mode, ratio });

    if ratio == AspectRatio::Custom {
        let width: String = Input::new()
            .with_prompt("幅")
            .with_initial_text(setting.custom.width.to_string())
            .allow_empty(true)
            .interact_text()?;
        let height: String = Input::new()
            .with_prompt("高さ")
            .with_initial_text(setting.custom.height.to_string())
            .allow_empty(true)
            .interact_text()?;
        controller.dispatch(Action::SetCustomWidth { mode, raw: width });
        controller.dispatch(Action::SetCustomHeight { mode, raw: height });
    }
    Ok(())
}

fn print_results(images: &[GeneratedImage]) {
    for (i, image) in images.iter().enumerate() {
        println!("  {:03}  {}  ({} KB)", i + 1, image.prompt, image.base64.len() * 3 / 4 / 1024);
    }
}

fn pick_result(images: &[GeneratedImage], prompt: &str) -> Result<Option<u64>> {
    if images.is_empty() {
        return Ok(None);
    }
    let labels: Vec<String> = images
        .iter()
        .enumerate()
        .map(|(i, img)| format!("{:03} {}", i + 1, img.prompt))
        .collect();
    let index = Select::new()
        .with_prompt(prompt)
        .items(&labels)
        .default(0)
        .interact_opt()?;
    Ok(index.map(|i| images[i].id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use genai_studio_common::{reduce, BatchOutcome};

    #[test]
    fn test_menu_story_without_results() {
        let state = StudioState::default();
        let items = menu_items(&state);
        assert!(items.contains(&MenuItem::EditCharacter));
        assert!(items.contains(&MenuItem::Style));
        assert!(!items.contains(&MenuItem::ClearAll));
        assert_eq!(items.last(), Some(&MenuItem::Quit));
    }

    #[test]
    fn test_menu_background_removal_has_no_count() {
        let state = reduce(&StudioState::default(), Action::SetActiveMode(Mode::BackgroundRemoval));
        let items = menu_items(&state);
        assert!(!items.contains(&MenuItem::Count));
        assert!(!items.contains(&MenuItem::Ratio));
        assert!(items.contains(&MenuItem::Image(ImageSlot::BackgroundInput)));
    }

    #[test]
    fn test_menu_list_operations_appear_with_results() {
        let state = reduce(
            &StudioState::default(),
            Action::BatchSettled(BatchOutcome {
                mode: Mode::Story,
                results: vec![Some(("cat".to_string(), "AAAA".to_string()))],
            }),
        );
        let items = menu_items(&state);
        assert!(items.contains(&MenuItem::DownloadAll));
        assert!(items.contains(&MenuItem::ClearAll));
        assert_eq!(MenuItem::ListResults.label(&state), "Story Results（1件）");
    }
}
