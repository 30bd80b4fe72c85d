//! 单个任务的六个阶段及其状态

use serde::{Deserialize, Serialize};

/// 阶段总数
pub const PHASE_COUNT: usize = 6;

/// 单个提示词任务的阶段（顺序固定）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Ready,
    ClearReferences,
    UploadReferences,
    EnterPrompt,
    Submit,
    PostSubmitWait,
}

impl Phase {
    pub const ALL: [Phase; PHASE_COUNT] = [
        Phase::Ready,
        Phase::ClearReferences,
        Phase::UploadReferences,
        Phase::EnterPrompt,
        Phase::Submit,
        Phase::PostSubmitWait,
    ];

    /// 阶段在状态槽中的下标（0..=5）
    pub fn index(self) -> usize {
        match self {
            Phase::Ready => 0,
            Phase::ClearReferences => 1,
            Phase::UploadReferences => 2,
            Phase::EnterPrompt => 3,
            Phase::Submit => 4,
            Phase::PostSubmitWait => 5,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// 面板上显示的名称
    pub fn label(self) -> &'static str {
        match self {
            Phase::Ready => "准备处理",
            Phase::ClearReferences => "清理参考图",
            Phase::UploadReferences => "上传参考图",
            Phase::EnterPrompt => "输入提示词",
            Phase::Submit => "提交任务",
            Phase::PostSubmitWait => "等待下一次",
        }
    }
}

/// 阶段状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    #[default]
    Pending,
    Current,
    Completed,
    Error,
}

impl StepStatus {
    pub fn symbol(self) -> &'static str {
        match self {
            StepStatus::Pending => "○",
            StepStatus::Current => "▶",
            StepStatus::Completed => "✓",
            StepStatus::Error => "✗",
        }
    }
}

/// 六个阶段的状态槽
///
/// 只允许 pending → current → completed / error 的迁移，
/// 并且前面的阶段没完成时不允许把后面的阶段标为完成。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepBoard {
    slots: [StepStatus; PHASE_COUNT],
}

impl StepBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.slots = [StepStatus::Pending; PHASE_COUNT];
    }

    pub fn status(&self, phase: Phase) -> StepStatus {
        self.slots[phase.index()]
    }

    pub fn slots(&self) -> &[StepStatus; PHASE_COUNT] {
        &self.slots
    }

    /// 最后一个离开 pending 的阶段
    pub fn last_observed(&self) -> Option<Phase> {
        Phase::ALL
            .iter()
            .rev()
            .find(|p| self.slots[p.index()] != StepStatus::Pending)
            .copied()
    }

    /// 尝试迁移状态，非法迁移返回 false 且不修改
    pub fn apply(&mut self, phase: Phase, next: StepStatus) -> bool {
        let current = self.slots[phase.index()];
        let allowed = match (current, next) {
            (StepStatus::Pending, StepStatus::Current) => true,
            (StepStatus::Current, StepStatus::Completed) => self.earlier_completed(phase),
            (StepStatus::Current, StepStatus::Error) => true,
            _ => false,
        };
        if allowed {
            self.slots[phase.index()] = next;
        }
        allowed
    }

    fn earlier_completed(&self, phase: Phase) -> bool {
        self.slots[..phase.index()]
            .iter()
            .all(|s| *s == StepStatus::Completed)
    }

    /// 单行渲染，例如 `✓准备处理 ▶清理参考图 ○上传参考图 ...`
    pub fn render(&self) -> String {
        Phase::ALL
            .iter()
            .map(|p| format!("{}{}", self.slots[p.index()].symbol(), p.label()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
