//! 单个提示词的处理流程 - 流程层
//!
//! 六个阶段依次执行：
//! 1. 准备处理（确认页面）
//! 2. 清理参考图（尽力而为）
//! 3. 上传参考图（没有匹配时跳过）
//! 4. 输入提示词
//! 5. 提交任务
//! 6. 等待下一次
//!
//! 每个阶段之间检查停止信号；收到停止信号时直接放弃当前任务，不标记失败。

use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{millis, DriverSettings};
use crate::error::{DriverError, DriverResult, JobFailure};
use crate::infrastructure::{ElementHandle, ElementQuery, ReadyState, Surface};
use crate::models::{EventSink, JobDescriptor, Phase};
use crate::services::probe::pause;
use crate::services::{Actions, ElementProbe, ProbeOutcome};
use crate::utils::logging::truncate_text;
use crate::workflow::job_ctx::JobCtx;
use crate::workflow::step_tracker::StepTracker;

/// 任务结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// 六个阶段全部完成
    Completed,
    /// 收到停止信号，任务被放弃
    Abandoned { last_phase: Option<Phase> },
}

/// 单个阶段的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PhaseResult {
    Done,
    Stopped,
}

/// 阶段状态机
///
/// - 只操作 Surface，不持有页面
/// - 每个任务调用一次 `run`
pub struct StepMachine<'a> {
    surface: &'a dyn Surface,
    settings: &'a DriverSettings,
    expected_url_fragment: &'a str,
    events: &'a EventSink,
    stop: CancellationToken,
}

impl<'a> StepMachine<'a> {
    pub fn new(
        surface: &'a dyn Surface,
        settings: &'a DriverSettings,
        expected_url_fragment: &'a str,
        events: &'a EventSink,
        stop: CancellationToken,
    ) -> Self {
        Self {
            surface,
            settings,
            expected_url_fragment,
            events,
            stop,
        }
    }

    fn probe(&self) -> ElementProbe<'a> {
        ElementProbe::new(self.surface, self.stop.clone(), self.settings.poll_interval())
    }

    fn actions(&self) -> Actions<'a> {
        Actions::new(self.surface, millis(self.settings.value_clear_delay_ms))
    }

    /// 执行一个任务的全部阶段
    pub async fn run(&self, job: &JobDescriptor) -> Result<JobOutcome, JobFailure> {
        let ctx = JobCtx::new(job.index, job.total);
        info!(
            "{} 开始处理: {}",
            ctx,
            truncate_text(job.effective_prompt(), 80)
        );
        if !job.reference_images.is_empty() {
            let names: Vec<_> = job.reference_images.iter().map(|r| r.name.as_str()).collect();
            info!("{} 参考图: {}", ctx, names.join(", "));
        }

        if let Err(e) = self.surface.release_handles().await {
            debug!("{} 释放旧句柄失败: {}", ctx, e);
        }

        let mut tracker = StepTracker::new(self.events);

        for phase in Phase::ALL {
            if self.stop.is_cancelled() {
                info!("{} 检测到停止信号，在「{}」之前停止", ctx, phase.label());
                return Ok(JobOutcome::Abandoned {
                    last_phase: tracker.last_observed(),
                });
            }

            tracker.begin(phase);
            match self.run_phase(phase, job, &ctx).await {
                Ok(PhaseResult::Done) => tracker.complete(phase),
                Ok(PhaseResult::Stopped) => {
                    info!("{} 检测到停止信号，已在「{}」阶段停止", ctx, phase.label());
                    return Ok(JobOutcome::Abandoned {
                        last_phase: tracker.last_observed(),
                    });
                }
                Err(err) => {
                    tracker.fail(phase);
                    let failure = JobFailure::from_phase(job.index, phase, &err);
                    error!("{} ❌ {}", ctx, failure);
                    return Err(failure);
                }
            }
        }

        info!("{} ✓ 处理完成", ctx);
        Ok(JobOutcome::Completed)
    }

    async fn run_phase(
        &self,
        phase: Phase,
        job: &JobDescriptor,
        ctx: &JobCtx,
    ) -> DriverResult<PhaseResult> {
        match phase {
            Phase::Ready => self.ensure_ready(ctx).await,
            Phase::ClearReferences => Ok(self.clear_references(ctx).await),
            Phase::UploadReferences => self.upload_references(job, ctx).await,
            Phase::EnterPrompt => self.enter_prompt(job.effective_prompt(), ctx).await,
            Phase::Submit => self.click_submit(ctx).await,
            Phase::PostSubmitWait => Ok(self.post_submit_wait(job.wait_time(), ctx).await),
        }
    }

    fn settle_result(done: bool) -> PhaseResult {
        if done {
            PhaseResult::Done
        } else {
            PhaseResult::Stopped
        }
    }

    // ========== 阶段 1: 准备处理 ==========

    async fn ensure_ready(&self, ctx: &JobCtx) -> DriverResult<PhaseResult> {
        let mut state = self.surface.ready_state().await?;
        if state != ReadyState::Complete {
            debug!("{} 页面尚未加载完成 ({})，等待 load 事件", ctx, state.as_str());
            let limit = millis(self.settings.page_load_timeout_ms);
            tokio::select! {
                _ = self.stop.cancelled() => return Ok(PhaseResult::Stopped),
                waited = tokio::time::timeout(limit, self.surface.wait_for_load()) => {
                    match waited {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => debug!("{} 等待 load 事件失败: {}", ctx, e),
                        Err(_) => debug!("{} 等待 load 事件超时", ctx),
                    }
                }
            }
            state = self.surface.ready_state().await?;
            if state != ReadyState::Complete {
                return Err(DriverError::PageNotReady {
                    state: state.as_str().to_string(),
                });
            }
        }

        let location = self.surface.location().await?;
        if !location.contains(self.expected_url_fragment) {
            return Err(DriverError::WrongPage {
                expected: self.expected_url_fragment.to_string(),
                actual: location,
            });
        }

        Ok(Self::settle_result(
            pause(&self.stop, millis(self.settings.ready_settle_ms)).await,
        ))
    }

    // ========== 阶段 2: 清理参考图 ==========

    async fn remove_containers(&self) -> Vec<ElementHandle> {
        self.surface
            .find_all(&self.settings.remove_container_selector)
            .await
            .unwrap_or_else(|e| {
                debug!("查询删除按钮失败: {}", e);
                Vec::new()
            })
    }

    /// 清理已有参考图，尽力而为：残留只记录警告，不让任务失败
    async fn clear_references(&self, ctx: &JobCtx) -> PhaseResult {
        let s = self.settings;
        let actions = self.actions();
        let probe = self.probe();

        for round in 0..s.clear_max_rounds {
            if self.stop.is_cancelled() {
                return PhaseResult::Stopped;
            }

            let mut containers = self.remove_containers().await;

            if containers.is_empty() {
                let items = self
                    .surface
                    .find_all(&s.reference_item_selector)
                    .await
                    .unwrap_or_default();
                if !items.is_empty() {
                    for item in &items {
                        actions.hover(*item).await;
                    }
                    if !pause(&self.stop, millis(s.hover_settle_ms)).await {
                        return PhaseResult::Stopped;
                    }
                    containers = self.remove_containers().await;
                }
            }

            if containers.is_empty() {
                if round == 0 {
                    info!("{} 未检测到参考图，无需清理", ctx);
                }
                return PhaseResult::Done;
            }

            info!("{} 检测到 {} 个参考图，将逐个移除", ctx, containers.len());
            for container in containers {
                if self.stop.is_cancelled() {
                    return PhaseResult::Stopped;
                }

                if let Ok(Some(item)) = self
                    .surface
                    .closest(container, &s.reference_item_selector)
                    .await
                {
                    actions.hover(item).await;
                    if !pause(&self.stop, millis(s.entry_hover_settle_ms)).await {
                        return PhaseResult::Stopped;
                    }
                }

                actions.trigger_click(container).await;

                if let Some(inner) = self.removal_target(container).await {
                    actions.trigger_click(inner).await;
                }

                let surface = self.surface;
                let detached = probe
                    .await_condition(
                        "参考图移除",
                        move || async move { !surface.is_rendered(container).await.unwrap_or(false) },
                        millis(s.remove_detach_timeout_ms),
                        s.poll_interval(),
                    )
                    .await;
                match detached {
                    Ok(true) => {}
                    Ok(false) => return PhaseResult::Stopped,
                    Err(e) => debug!("{} {}", ctx, e),
                }

                if !pause(&self.stop, millis(s.after_remove_ms)).await {
                    return PhaseResult::Stopped;
                }
            }

            if !pause(&self.stop, millis(s.between_rounds_ms)).await {
                return PhaseResult::Stopped;
            }
        }

        if !self.remove_containers().await.is_empty() {
            warn!("{} ⚠️ 仍有参考图未移除，可能需要手动确认", ctx);
        }
        PhaseResult::Done
    }

    /// 删除按钮容器里真正可点的目标
    async fn removal_target(&self, container: ElementHandle) -> Option<ElementHandle> {
        let s = self.settings;
        for selector in [&s.clickable_selector, &s.remove_button_selector] {
            if let Ok(Some(inner)) = self.surface.find_within(container, selector).await {
                return Some(inner);
            }
        }
        self.surface.first_child(container).await.ok().flatten()
    }

    // ========== 阶段 3: 上传参考图 ==========

    async fn upload_references(
        &self,
        job: &JobDescriptor,
        ctx: &JobCtx,
    ) -> DriverResult<PhaseResult> {
        if job.reference_images.is_empty() {
            info!("{} 本次提示词没有匹配到参考图，跳过上传", ctx);
            return Ok(PhaseResult::Done);
        }

        let s = self.settings;
        let probe = self.probe();

        let zone = match probe
            .await_element(
                &ElementQuery::css(&s.upload_zone_selector),
                millis(s.upload_zone_timeout_ms),
            )
            .await
        {
            ProbeOutcome::Found(el) => el,
            ProbeOutcome::Stopped => return Ok(PhaseResult::Stopped),
            ProbeOutcome::TimedOut => return Err(DriverError::not_found("参考图上传区域")),
        };

        let input = match probe
            .await_file_input(zone, millis(s.file_input_timeout_ms))
            .await
        {
            ProbeOutcome::Found(el) => el,
            ProbeOutcome::Stopped => return Ok(PhaseResult::Stopped),
            ProbeOutcome::TimedOut => return Err(DriverError::not_found("参考图上传控件")),
        };

        let uploaded = self.actions().set_files(input, &job.reference_images).await?;
        if uploaded == 0 {
            return Ok(PhaseResult::Done);
        }
        info!("{} 📤 已提交 {} 张参考图，等待上传确认...", ctx, uploaded);

        let surface = self.surface;
        let selector = s.remove_container_selector.as_str();
        let confirmed = probe
            .await_condition(
                "参考图上传确认",
                move || async move {
                    surface
                        .find_all(selector)
                        .await
                        .map(|entries| entries.len() >= uploaded)
                        .unwrap_or(false)
                },
                millis(s.upload_confirm_timeout_ms),
                millis(s.upload_confirm_interval_ms),
            )
            .await;

        match confirmed {
            Ok(true) => {
                info!("{} ✓ 参考图上传完成", ctx);
                Ok(PhaseResult::Done)
            }
            Ok(false) => Ok(PhaseResult::Stopped),
            Err(_) if s.strict_upload_confirmation => Err(DriverError::network_suspect(
                format!("参考图上传超时 ({} 张未在时限内出现)", uploaded),
            )),
            Err(_) => {
                warn!("{} ⚠️ 参考图上传状态未能确认，将继续后续流程", ctx);
                Ok(PhaseResult::Done)
            }
        }
    }

    // ========== 阶段 4: 输入提示词 ==========

    async fn enter_prompt(&self, prompt: &str, ctx: &JobCtx) -> DriverResult<PhaseResult> {
        let s = self.settings;
        let probe = self.probe();
        let timeout = millis(s.prompt_timeout_ms);

        let field = match probe
            .await_element(&ElementQuery::css(&s.prompt_primary_selector), timeout)
            .await
        {
            ProbeOutcome::Found(el) => el,
            ProbeOutcome::Stopped => return Ok(PhaseResult::Stopped),
            ProbeOutcome::TimedOut => {
                debug!("{} 未找到首选输入框，尝试通用输入控件", ctx);
                match probe
                    .await_element(&ElementQuery::css(&s.prompt_fallback_selector), timeout)
                    .await
                {
                    ProbeOutcome::Found(el) => el,
                    ProbeOutcome::Stopped => return Ok(PhaseResult::Stopped),
                    ProbeOutcome::TimedOut => {
                        return Err(DriverError::not_found("提示词输入框"))
                    }
                }
            }
        };

        let actions = self.actions();
        actions.focus(field).await;
        actions.set_text_value(field, prompt).await?;
        info!("{} ✓ 已输入提示词", ctx);
        Ok(PhaseResult::Done)
    }

    // ========== 阶段 5: 提交任务 ==========

    async fn click_submit(&self, ctx: &JobCtx) -> DriverResult<PhaseResult> {
        let s = self.settings;
        let probe = self.probe();
        let timeout = millis(s.submit_selector_timeout_ms);

        let mut button = None;
        for selector in &s.submit_selectors {
            let found = match probe.await_element(&ElementQuery::css(selector), timeout).await {
                ProbeOutcome::Found(el) => el,
                ProbeOutcome::Stopped => return Ok(PhaseResult::Stopped),
                ProbeOutcome::TimedOut => continue,
            };

            if self
                .surface
                .matches(found, &s.clickable_selector)
                .await
                .unwrap_or(false)
            {
                button = Some(found);
                break;
            }
            if let Ok(Some(inner)) = self.surface.find_within(found, &s.clickable_selector).await {
                button = Some(inner);
                break;
            }
        }

        if button.is_none() {
            debug!("{} 选择器均未命中，按文字「{}」查找提交按钮", ctx, s.submit_text);
            let query = ElementQuery::text(&s.submit_text_selectors, s.submit_text.as_str());
            match probe.await_element(&query, timeout).await {
                ProbeOutcome::Found(label) => {
                    let clickable = self
                        .surface
                        .closest(label, &s.clickable_selector)
                        .await
                        .ok()
                        .flatten();
                    button = Some(clickable.unwrap_or(label));
                }
                ProbeOutcome::Stopped => return Ok(PhaseResult::Stopped),
                ProbeOutcome::TimedOut => {}
            }
        }

        let Some(button) = button else {
            return Err(DriverError::not_found("提交按钮"));
        };

        self.actions().trigger_click(button).await;
        info!("{} ✓ 已点击提交", ctx);
        Ok(Self::settle_result(
            pause(&self.stop, millis(s.submit_settle_ms)).await,
        ))
    }

    // ========== 阶段 6: 等待下一次 ==========

    async fn post_submit_wait(&self, wait_time: Duration, ctx: &JobCtx) -> PhaseResult {
        let wait = wait_time.max(millis(self.settings.min_post_submit_wait_ms));
        debug!("{} 提交后等待 {}ms", ctx, wait.as_millis());
        Self::settle_result(pause(&self.stop, wait).await)
    }
}
