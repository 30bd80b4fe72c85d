//! 批量编排器 - 编排层
//!
//! ## 职责
//!
//! 1. 一次性构建全部任务（提示词 + 匹配的参考图）
//! 2. 按顺序逐个派发，同一时间只有一个任务在执行
//! 3. 分类结果：成功计数、普通失败继续、网络异常终止整批
//! 4. 任务之间按等待时间休眠（可被停止信号打断）
//! 5. 任何退出路径都清除运行标记

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::DriverSettings;
use crate::error::{DriverError, DriverResult, JobFailure};
use crate::models::{
    EventSink, NotificationKind, PanelEvent, PromptJob, ReferenceFile, Tone,
};
use crate::orchestrator::bridge::Bridge;
use crate::services::build_jobs;
use crate::services::probe::pause;
use crate::utils::logging::truncate_text;

/// 运行状态（面板可随时读取）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchRunState {
    pub is_processing: bool,
    pub completed_count: usize,
    pub total_count: usize,
}

/// 一次批量运行的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub completed: usize,
    pub failed: usize,
    pub total: usize,
    pub stopped: bool,
    /// 终止整批任务的失败
    pub fatal: Option<JobFailure>,
}

/// 运行标记守卫，离开作用域时清除 `is_processing`
struct ProcessingGuard {
    state: Arc<Mutex<BatchRunState>>,
}

impl Drop for ProcessingGuard {
    fn drop(&mut self) {
        lock(&self.state).is_processing = false;
    }
}

fn lock(state: &Mutex<BatchRunState>) -> MutexGuard<'_, BatchRunState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct BatchOrchestrator {
    bridge: Bridge,
    events: EventSink,
    settings: DriverSettings,
    state: Arc<Mutex<BatchRunState>>,
}

impl BatchOrchestrator {
    pub fn new(bridge: Bridge, events: EventSink, settings: DriverSettings) -> Self {
        Self {
            bridge,
            events,
            settings,
            state: Arc::new(Mutex::new(BatchRunState::default())),
        }
    }

    pub fn state(&self) -> BatchRunState {
        *lock(&self.state)
    }

    /// 提交一批提示词
    ///
    /// `stop` 由调用方为每次运行新建；遇到网络异常时这里会主动取消它
    pub async fn submit_batch<S: AsRef<str>>(
        &self,
        prompt_lines: &[S],
        reference_files: &[ReferenceFile],
        wait_time: Duration,
        stop: &CancellationToken,
    ) -> DriverResult<BatchReport> {
        let jobs = build_jobs(prompt_lines, reference_files);
        if jobs.is_empty() {
            self.events.status("请输入提示词", Tone::Error);
            return Ok(BatchReport::default());
        }

        let _guard = {
            let mut state = lock(&self.state);
            if state.is_processing {
                return Err(DriverError::AlreadyRunning);
            }
            *state = BatchRunState {
                is_processing: true,
                completed_count: 0,
                total_count: jobs.len(),
            };
            ProcessingGuard {
                state: Arc::clone(&self.state),
            }
        };

        if reference_files.is_empty() {
            self.events
                .status("未选择参考图文件夹，将仅提交提示词。", Tone::Info);
        }

        let report = self.run_jobs(&jobs, wait_time, stop).await;

        // 网络异常时错误通知已在循环里发出
        if report.fatal.is_none() && report.stopped {
            self.events.status("处理已停止", Tone::Info);
        } else if report.fatal.is_none() {
            let message = format!(
                "全部提示词处理完成！已提交 {}/{} 个任务",
                report.completed, report.total
            );
            info!("🎉 {}", message);
            self.events.status(message, Tone::Success);
            self.events.notify(
                NotificationKind::Complete,
                format!("已成功提交 {} 个文生图生成任务", report.completed),
            );
        }

        Ok(report)
    }

    async fn run_jobs(
        &self,
        jobs: &[PromptJob],
        wait_time: Duration,
        stop: &CancellationToken,
    ) -> BatchReport {
        let mut report = BatchReport {
            total: jobs.len(),
            ..Default::default()
        };
        let job_timeout = self.settings.job_timeout(wait_time);

        for job in jobs {
            self.events.emit(PanelEvent::StepsReset);

            if stop.is_cancelled() {
                report.stopped = true;
                return report;
            }

            self.announce(job);

            match self
                .bridge
                .dispatch(job.to_descriptor(wait_time), job_timeout, stop)
                .await
            {
                Ok(completion) if completion.abandoned => {
                    info!("⏹️ 第{}个提示词被停止，未计入完成数", job.index);
                    self.events
                        .emit(PanelEvent::JobAbandoned { index: job.index });
                    report.stopped = true;
                    return report;
                }
                Ok(_) => {
                    report.completed += 1;
                    lock(&self.state).completed_count = report.completed;
                    self.events.emit(PanelEvent::JobFinished {
                        index: job.index,
                        success: true,
                        error: None,
                    });
                }
                Err(failure) => {
                    report.failed += 1;
                    self.events.emit(PanelEvent::JobFinished {
                        index: job.index,
                        success: false,
                        error: Some(failure.clone()),
                    });

                    if failure.is_fatal_to_batch() {
                        error!("🛑 {}，终止后续任务", failure);
                        stop.cancel();
                        self.events.notify(
                            NotificationKind::NetworkError,
                            format!("网络可能异常: {}", failure),
                        );
                        self.events.status(failure.message.clone(), Tone::Error);
                        report.stopped = true;
                        report.fatal = Some(failure);
                        return report;
                    }

                    warn!("⚠️ {}，继续下一个提示词", failure);
                    self.events.status(failure.message.clone(), Tone::Error);
                }
            }

            if job.index == jobs.len() {
                self.events.status("等待所有任务完成...", Tone::Info);
            }
            if !pause(stop, wait_time).await {
                report.stopped = true;
                return report;
            }
        }

        report
    }

    fn announce(&self, job: &PromptJob) {
        info!("\n{}", "─".repeat(60));
        info!(
            "[提示词 {}/{}] {}",
            job.index,
            job.total,
            truncate_text(&job.prompt_text, 80)
        );
        info!("参考图: {}", job.reference_summary());
        self.events.emit(PanelEvent::JobStarted {
            index: job.index,
            total: job.total,
            prompt_text: job.prompt_text.clone(),
            reference_names: job.reference_names(),
        });
        self.events.status(
            format!(
                "正在处理第{}个提示词:\n{}\n参考图: {}",
                job.index,
                job.prompt_text,
                job.reference_summary()
            ),
            Tone::Info,
        );
    }
}
