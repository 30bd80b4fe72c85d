//! 控制台面板
//!
//! 消费编排层和宿主发出的事件：
//! - 维护六个阶段的显示
//! - 状态消息和通知写日志，同时追加到运行日志文件
//! - 失败的提示词追加到失败文件

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::models::{NotificationKind, PanelEvent, Phase, StepBoard, Tone};
use crate::services::FailureWriter;

/// 面板统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PanelSummary {
    pub started: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub abandoned: usize,
}

pub struct ConsolePanel {
    board: StepBoard,
    log_file: Option<String>,
    failures: FailureWriter,
    prompts: HashMap<usize, String>,
    summary: PanelSummary,
}

impl ConsolePanel {
    pub fn new(log_file: Option<String>, failures: FailureWriter) -> Self {
        Self {
            board: StepBoard::new(),
            log_file,
            failures,
            prompts: HashMap::new(),
            summary: PanelSummary::default(),
        }
    }

    pub fn board(&self) -> &StepBoard {
        &self.board
    }

    pub fn summary(&self) -> PanelSummary {
        self.summary
    }

    /// 处理事件直到所有发送端关闭
    pub async fn run(mut self, mut rx: mpsc::UnboundedReceiver<PanelEvent>) -> PanelSummary {
        while let Some(event) = rx.recv().await {
            self.handle(event);
        }
        self.summary
    }

    pub fn handle(&mut self, event: PanelEvent) {
        match event {
            PanelEvent::StepsReset => self.board.reset(),
            PanelEvent::Step { step_index, status } => {
                let Some(phase) = Phase::from_index(step_index) else {
                    warn!("未知的阶段序号: {}", step_index);
                    return;
                };
                if self.board.apply(phase, status) {
                    debug!("阶段: {}", self.board.render());
                }
            }
            PanelEvent::JobStarted {
                index,
                total,
                prompt_text,
                ..
            } => {
                self.summary.started += 1;
                self.append_log(&format!("[{}/{}] 开始: {}", index, total, prompt_text));
                self.prompts.insert(index, prompt_text);
            }
            PanelEvent::JobFinished {
                index,
                success,
                error,
            } => {
                if success {
                    self.summary.succeeded += 1;
                    self.append_log(&format!("[{}] 完成", index));
                    return;
                }
                self.summary.failed += 1;
                let reason = error
                    .map(|f| f.message)
                    .unwrap_or_else(|| "未知错误".to_string());
                self.append_log(&format!("[{}] 失败: {}", index, reason));
                if let Some(prompt) = self.prompts.get(&index) {
                    if let Err(e) = self.failures.write(index, prompt, &reason) {
                        error!("写入失败记录失败: {}", e);
                    }
                }
            }
            PanelEvent::JobAbandoned { index } => {
                self.summary.abandoned += 1;
                self.append_log(&format!("[{}] 已停止，未提交", index));
            }
            PanelEvent::Status { message, tone } => {
                match tone {
                    Tone::Info => info!("ℹ️ {}", message),
                    Tone::Success => info!("✅ {}", message),
                    Tone::Error => warn!("❌ {}", message),
                }
                self.append_log(&message);
            }
            PanelEvent::Notification { kind, message } => {
                match kind {
                    NotificationKind::Complete => info!("🎉 {}", message),
                    NotificationKind::NetworkError => {
                        error!("🚨 {}，请检查网络后重新运行", message)
                    }
                }
                self.append_log(&format!("[通知] {}", message));
            }
        }
    }

    fn append_log(&self, line: &str) {
        let Some(path) = &self.log_file else {
            return;
        };
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut file| {
                writeln!(
                    file,
                    "[{}] {}",
                    chrono::Local::now().format("%H:%M:%S"),
                    line
                )
            });
        if let Err(e) = result {
            debug!("写入日志文件失败: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FailureKind, JobFailure};
    use crate::models::StepStatus;

    #[test]
    fn failed_job_prompt_is_recorded() {
        let path = std::env::temp_dir().join(format!("jimeng_panel_failed_{}.txt", std::process::id()));
        let mut panel = ConsolePanel::new(None, FailureWriter::with_path(path.to_string_lossy()));

        panel.handle(PanelEvent::JobStarted {
            index: 2,
            total: 3,
            prompt_text: "a red fox".to_string(),
            reference_names: Vec::new(),
        });
        panel.handle(PanelEvent::JobFinished {
            index: 2,
            success: false,
            error: Some(JobFailure::new(FailureKind::NotFound, "未找到提交按钮")),
        });

        let content = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(content, "a red fox\n");
        assert_eq!(panel.summary().failed, 1);
    }

    #[test]
    fn abandoned_job_is_neither_success_nor_failure() {
        let path = std::env::temp_dir().join(format!("jimeng_panel_abandoned_{}.txt", std::process::id()));
        let mut panel = ConsolePanel::new(None, FailureWriter::with_path(path.to_string_lossy()));

        panel.handle(PanelEvent::JobStarted {
            index: 1,
            total: 2,
            prompt_text: "a red fox".to_string(),
            reference_names: Vec::new(),
        });
        panel.handle(PanelEvent::JobAbandoned { index: 1 });

        let summary = panel.summary();
        assert_eq!((summary.succeeded, summary.failed, summary.abandoned), (0, 0, 1));
        assert!(!path.exists());
    }

    #[test]
    fn step_events_drive_the_board() {
        let mut panel = ConsolePanel::new(None, FailureWriter::default());
        panel.handle(PanelEvent::Step { step_index: 0, status: StepStatus::Current });
        panel.handle(PanelEvent::Step { step_index: 0, status: StepStatus::Completed });
        panel.handle(PanelEvent::Step { step_index: 9, status: StepStatus::Current });
        assert_eq!(panel.board().status(Phase::Ready), StepStatus::Completed);

        panel.handle(PanelEvent::StepsReset);
        assert_eq!(panel.board().last_observed(), None);
    }
}
