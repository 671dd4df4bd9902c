//! ワンショットコマンドの共通処理
//!
//! 入力を Action に変換してコントローラへ流し、
//! 送信 → 結果保存（または dry-run 表示）を行う。

use crate::cli::{CharacterArg, RatioArgs};
use crate::codec;
use crate::controller::{Controller, SubmitReport};
use crate::error::{Result, StudioError};
use crate::gemini::ImageGenerator;
use genai_studio_common::types::CHARACTER_SLOTS;
use genai_studio_common::{plan_submission, Action, GenerateRequest, ImageSlot, Mode, Part};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// キャラクター画像をスロット1から順に読み込んで選択状態にする
pub fn load_characters<G: ImageGenerator>(
    controller: &mut Controller<G>,
    characters: &[CharacterArg],
) -> Result<()> {
    if characters.len() > CHARACTER_SLOTS as usize {
        return Err(StudioError::Config(format!(
            "キャラクターは最大{}件までです（{}件指定）",
            CHARACTER_SLOTS,
            characters.len()
        )));
    }

    for (i, arg) in characters.iter().enumerate() {
        let id = i as u32 + 1;
        let asset = codec::load_image(&arg.path)?;
        let name = arg.name.clone().unwrap_or_else(|| {
            arg.path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| format!("Character {}", id))
        });

        controller.dispatch(Action::SetCharacterImage { id, image: Some(asset) });
        controller.dispatch(Action::SetCharacterName { id, name });
        controller.dispatch(Action::SetCharacterSelected { id, selected: true });
    }

    Ok(())
}

/// 単一画像スロットへ読み込み
pub fn load_slot<G: ImageGenerator>(
    controller: &mut Controller<G>,
    slot: ImageSlot,
    path: &Path,
) -> Result<()> {
    let asset = codec::load_image(path)?;
    controller.dispatch(Action::SetImage { slot, image: Some(asset) });
    Ok(())
}

/// 比率指定を反映
pub fn apply_ratio<G: ImageGenerator>(controller: &mut Controller<G>, mode: Mode, ratio: &RatioArgs) {
    controller.dispatch(Action::SetAspectRatio { mode, ratio: ratio.ratio });
    controller.dispatch(Action::SetCustomWidth { mode, raw: ratio.width.clone() });
    controller.dispatch(Action::SetCustomHeight { mode, raw: ratio.height.clone() });
}

/// パート構成の要約（例: `text → image/png → image/jpeg`）
pub fn describe_request(request: &GenerateRequest) -> String {
    let parts = request
        .parts()
        .iter()
        .map(|part| match part {
            Part::Text { text } => format!("text({} chars)", text.chars().count()),
            Part::InlineData { inline_data } => inline_data.mime_type.clone(),
        })
        .collect::<Vec<_>>()
        .join(" → ");

    let ratio = request
        .generation_config
        .image_config
        .as_ref()
        .map(|c| c.aspect_ratio.as_str())
        .unwrap_or("なし");

    format!("{} | aspectRatio: {}", parts, ratio)
}

/// APIを呼ばずに送信計画を表示
pub fn print_dry_run<G: ImageGenerator>(controller: &Controller<G>, mode: Mode, verbose: bool) {
    match plan_submission(controller.state(), mode) {
        Ok(plan) => {
            println!("🧪 dry-run: {}件の呼び出し\n", plan.jobs.len());
            for (i, job) in plan.jobs.iter().enumerate() {
                let request = job.task.request();
                println!("  [{}] {}", i + 1, job.label);
                println!("      {}", describe_request(&request));
                if verbose {
                    for part in request.parts() {
                        if let Part::Text { text } = part {
                            println!("{}\n", text);
                        }
                    }
                }
            }
        }
        Err(e) => println!("⚠ {}", e),
    }
}

fn progress_bar(placeholders: u32) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(format!("生成中...（{}枠）", placeholders));
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

/// 送信してスピナーを出す
pub async fn submit_with_spinner<G: ImageGenerator>(
    controller: &mut Controller<G>,
    mode: Mode,
) -> SubmitReport {
    let bar = progress_bar(controller.state().number_of_images);
    let report = controller
        .submit_with_progress(mode, |done, total| {
            bar.set_message(format!("生成中... {}/{}", done, total));
        })
        .await;
    bar.finish_and_clear();
    report
}

/// 送信結果を表示
pub fn print_report(report: &SubmitReport) {
    match report {
        SubmitReport::Rejected(e) => println!("⚠ {}", e),
        SubmitReport::Settled { mode, attempted, succeeded, notice } => {
            println!("✔ {}: {}/{}枚 生成", mode, succeeded, attempted);
            if let Some(notice) = notice {
                println!("⚠ {}", notice);
            }
        }
    }
}

/// 送信して表示中の一覧を保存
pub async fn run_and_save<G: ImageGenerator>(
    controller: &mut Controller<G>,
    mode: Mode,
    output: &Path,
) -> Result<Vec<PathBuf>> {
    controller.dispatch(Action::SetActiveMode(mode));

    let report = submit_with_spinner(controller, mode).await;
    print_report(&report);

    match report {
        SubmitReport::Rejected(e) => return Err(StudioError::Validation(e)),
        SubmitReport::Settled { succeeded: 0, notice: Some(notice), .. } => {
            return Err(StudioError::BatchFailed(notice));
        }
        SubmitReport::Settled { .. } => {}
    }

    let saved = controller.download_all(output).await;
    for path in &saved {
        println!("  💾 {}", path.display());
    }
    Ok(saved)
}
