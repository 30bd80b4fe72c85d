//! 发往面板的事件

use serde::Serialize;
use tokio::sync::mpsc;

use crate::error::JobFailure;
use crate::models::step::{Phase, StepStatus};

/// 状态消息的语气
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Info,
    Success,
    Error,
}

/// 需要用户注意的通知
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// 全部完成（带庆祝音效）
    Complete,
    /// 网络异常，需要用户确认
    NetworkError,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PanelEvent {
    /// 新任务开始前把六个阶段重置为 pending
    StepsReset,
    Step {
        step_index: usize,
        status: StepStatus,
    },
    JobStarted {
        index: usize,
        total: usize,
        prompt_text: String,
        reference_names: Vec<String>,
    },
    JobFinished {
        index: usize,
        success: bool,
        error: Option<JobFailure>,
    },
    /// 停止信号打断的任务：既不算成功也不算失败
    JobAbandoned {
        index: usize,
    },
    Status {
        message: String,
        tone: Tone,
    },
    Notification {
        kind: NotificationKind,
        message: String,
    },
}

/// 事件发送端；面板不存在或已关闭时事件直接丢弃
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<mpsc::UnboundedSender<PanelEvent>>,
}

impl EventSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<PanelEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn emit(&self, event: PanelEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }

    pub fn step(&self, phase: Phase, status: StepStatus) {
        self.emit(PanelEvent::Step {
            step_index: phase.index(),
            status,
        });
    }

    pub fn status(&self, message: impl Into<String>, tone: Tone) {
        self.emit(PanelEvent::Status {
            message: message.into(),
            tone,
        });
    }

    pub fn notify(&self, kind: NotificationKind, message: impl Into<String>) {
        self.emit(PanelEvent::Notification {
            kind,
            message: message.into(),
        });
    }
}
