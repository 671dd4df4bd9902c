//! スタジオコントローラ
//!
//! 状態スナップショットと生成クライアントを持ち、
//! 送信ごとに全ジョブを同時に発行して、全件確定後にまとめて反映する。
//! 失敗したジョブはログに残して捨てる（兄弟ジョブは止めない）。

use crate::codec;
use crate::error::Result;
use crate::gemini::{run_task, ImageGenerator};
use futures::future::join_all;
use genai_studio_common::{
    download_filename, download_plan, plan_submission, reduce, Action, BatchOutcome, Mode,
    Notice, StudioState, SubmissionPlan, ValidationError,
};
use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 送信1回の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitReport {
    /// 送信前チェックで止まった（呼び出しなし）
    Rejected(ValidationError),
    Settled {
        mode: Mode,
        attempted: usize,
        succeeded: usize,
        notice: Option<Notice>,
    },
}

impl SubmitReport {
    /// ユーザーに見せる通知
    pub fn notice(&self) -> Option<Notice> {
        match self {
            SubmitReport::Rejected(e) => Some(Notice::Validation(e.clone())),
            SubmitReport::Settled { notice, .. } => notice.clone(),
        }
    }
}

pub struct Controller<G> {
    generator: G,
    state: StudioState,
    download_delay: Duration,
}

impl<G: ImageGenerator> Controller<G> {
    pub fn new(generator: G, download_delay: Duration) -> Self {
        let seed = chrono::Utc::now().timestamp_millis().max(1) as u64;
        Self::with_state(generator, StudioState::new(seed), download_delay)
    }

    pub fn with_state(generator: G, state: StudioState, download_delay: Duration) -> Self {
        Self {
            generator,
            state,
            download_delay,
        }
    }

    pub fn state(&self) -> &StudioState {
        &self.state
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn dispatch(&mut self, action: Action) {
        self.state = reduce(&self.state, action);
    }

    pub async fn submit(&mut self, mode: Mode) -> SubmitReport {
        self.submit_with_progress(mode, |_, _| {}).await
    }

    /// 送信（完了ごとに on_progress(完了数, 総数) を呼ぶ）
    pub async fn submit_with_progress(
        &mut self,
        mode: Mode,
        on_progress: impl Fn(usize, usize),
    ) -> SubmitReport {
        let plan = match plan_submission(&self.state, mode) {
            Ok(plan) => plan,
            Err(e) => {
                log::info!("{}: 送信前チェックで中止: {}", mode, e);
                self.dispatch(Action::Rejected(e.clone()));
                return SubmitReport::Rejected(e);
            }
        };

        log::info!("{}: {}件の生成を開始", mode, plan.jobs.len());
        self.dispatch(Action::SubmitStarted {
            mode,
            placeholders: plan.placeholders,
        });

        let results = self.run_batch(&plan, &on_progress).await;
        let outcome = BatchOutcome { mode, results };
        let attempted = outcome.attempted();
        let succeeded = outcome.succeeded();
        log::info!("{}: 完了 {}/{}", mode, succeeded, attempted);

        self.dispatch(Action::BatchSettled(outcome));

        SubmitReport::Settled {
            mode,
            attempted,
            succeeded,
            notice: self.state.notice.clone(),
        }
    }

    /// 全ジョブを同時に実行し、作成順で結果を返す
    async fn run_batch(
        &self,
        plan: &SubmissionPlan,
        on_progress: &impl Fn(usize, usize),
    ) -> Vec<Option<(String, String)>> {
        let total = plan.jobs.len();
        let done = Cell::new(0usize);

        let tasks = plan.jobs.iter().map(|job| {
            let done = &done;
            async move {
                let result = match run_task(&self.generator, &job.task).await {
                    Ok(base64) => Some((job.label.clone(), base64)),
                    Err(e) if e.is_missing_image() => {
                        log::warn!("{}: 応答に画像なし \"{}\"", e.mode(), job.label);
                        None
                    }
                    Err(e) => {
                        log::error!("生成失敗 \"{}\": {}", job.label, e);
                        None
                    }
                };
                done.set(done.get() + 1);
                on_progress(done.get(), total);
                result
            }
        });

        join_all(tasks).await
    }

    /// アクティブモードから1件削除
    pub fn delete(&mut self, id: u64) {
        self.dispatch(Action::DeleteImage(id));
    }

    /// アクティブモードの一覧を空にする
    pub fn clear_all(&mut self) {
        self.dispatch(Action::ClearAll);
    }

    /// 1件だけ保存（ファイル名の連番は現在の表示位置）
    pub fn download_one(&self, id: u64, dir: &Path) -> Result<Option<PathBuf>> {
        let images = self.state.displayed_images();
        let Some(position) = images.iter().position(|img| img.id == id) else {
            return Ok(None);
        };

        let name = download_filename(position, &codec::current_date());
        codec::save_png(dir, &name, &images[position].base64).map(Some)
    }

    /// 表示中の一覧をすべて保存
    pub async fn download_all(&self, dir: &Path) -> Vec<PathBuf> {
        self.download_all_dated(dir, &codec::current_date()).await
    }

    /// 日時を指定して一括保存（ファイルごとに download_delay を空ける）
    pub async fn download_all_dated(&self, dir: &Path, date: &str) -> Vec<PathBuf> {
        let plan = download_plan(self.state.displayed_images(), date);
        let mut saved = Vec::with_capacity(plan.len());

        for (i, (name, image)) in plan.into_iter().enumerate() {
            if i > 0 && !self.download_delay.is_zero() {
                tokio::time::sleep(self.download_delay).await;
            }

            match codec::save_png(dir, &name, &image.base64) {
                Ok(path) => saved.push(path),
                Err(e) => log::error!("保存失敗 {}: {}", name, e),
            }
        }

        saved
    }
}
