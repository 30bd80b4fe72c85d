use tracing::warn;

use crate::models::{EventSink, Phase, StepBoard, StepStatus};

/// 单个任务的阶段状态跟踪
///
/// 每个任务新建一个；只有合法迁移才会发出事件
pub struct StepTracker<'a> {
    board: StepBoard,
    events: &'a EventSink,
}

impl<'a> StepTracker<'a> {
    pub fn new(events: &'a EventSink) -> Self {
        Self {
            board: StepBoard::new(),
            events,
        }
    }

    pub fn begin(&mut self, phase: Phase) {
        self.transition(phase, StepStatus::Current);
    }

    pub fn complete(&mut self, phase: Phase) {
        self.transition(phase, StepStatus::Completed);
    }

    pub fn fail(&mut self, phase: Phase) {
        self.transition(phase, StepStatus::Error);
    }

    pub fn board(&self) -> &StepBoard {
        &self.board
    }

    pub fn last_observed(&self) -> Option<Phase> {
        self.board.last_observed()
    }

    fn transition(&mut self, phase: Phase, status: StepStatus) {
        if self.board.apply(phase, status) {
            self.events.step(phase, status);
        } else {
            warn!(
                "忽略非法的阶段迁移: {} {:?} → {:?}",
                phase.label(),
                self.board.status(phase),
                status
            );
        }
    }
}
