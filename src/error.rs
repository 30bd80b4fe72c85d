use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::models::step::Phase;

/// 批量提交失败中表示"可能是网络问题"的关键字
///
/// 跨上下文传回的错误只有文本时，用它们兜底判断是否需要终止整批任务
const NETWORK_SUSPECT_MARKERS: [&str; 2] = ["上传超时", "网络异常"];

/// 驱动层错误类型
#[derive(Debug, Error)]
pub enum DriverError {
    /// 必需的页面元素始终没有出现
    #[error("未找到{what}")]
    NotFound { what: String },

    /// 有界等待超时
    #[error("等待{what}超时 ({}ms)", .waited.as_millis())]
    Timeout { what: String, waited: Duration },

    /// 疑似网络异常（整批任务终止）
    #[error("{message}")]
    NetworkSuspect { message: String },

    /// 当前页面不是目标生成页面
    #[error("当前页面不是即梦文生图页面 (期望包含 {expected}, 实际 {actual})，请打开目标页面")]
    WrongPage { expected: String, actual: String },

    /// 页面迟迟没有加载完成
    #[error("页面未加载完成 (readyState: {state})")]
    PageNotReady { state: String },

    /// 已有批次正在运行
    #[error("已有批量任务正在运行")]
    AlreadyRunning,

    /// 页面交互 / 浏览器通信错误
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DriverError {
    pub fn not_found(what: impl Into<String>) -> Self {
        DriverError::NotFound { what: what.into() }
    }

    pub fn timeout(what: impl Into<String>, waited: Duration) -> Self {
        DriverError::Timeout {
            what: what.into(),
            waited,
        }
    }

    pub fn network_suspect(message: impl Into<String>) -> Self {
        DriverError::NetworkSuspect {
            message: message.into(),
        }
    }

    /// 映射为可跨上下文传递的失败类别
    pub fn kind(&self) -> FailureKind {
        match self {
            DriverError::NotFound { .. } => FailureKind::NotFound,
            DriverError::Timeout { .. } => FailureKind::Timeout,
            DriverError::NetworkSuspect { .. } => FailureKind::NetworkSuspect,
            DriverError::WrongPage { .. } | DriverError::PageNotReady { .. } => {
                FailureKind::WrongPage
            }
            DriverError::AlreadyRunning | DriverError::Other(_) => FailureKind::Other,
        }
    }
}

/// 失败类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NotFound,
    Timeout,
    NetworkSuspect,
    WrongPage,
    Other,
}

/// 单个任务的失败信息
///
/// 会经过跨上下文桥传回编排层，所以只保留类别和可读文本
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl JobFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// 由某个阶段的驱动错误构造，消息里带上任务序号和阶段名
    pub fn from_phase(index: usize, phase: Phase, err: &DriverError) -> Self {
        Self::new(
            err.kind(),
            format!("第{}个提示词在「{}」阶段失败: {}", index, phase.label(), err),
        )
    }

    /// 整批任务超时（可能是网络异常）
    pub fn job_timed_out(index: usize) -> Self {
        Self::new(
            FailureKind::NetworkSuspect,
            format!("第{}个提示词处理超时，可能是网络异常", index),
        )
    }

    /// 是否需要终止整批任务
    pub fn is_fatal_to_batch(&self) -> bool {
        self.kind == FailureKind::NetworkSuspect
            || NETWORK_SUSPECT_MARKERS
                .iter()
                .any(|marker| self.message.contains(marker))
    }
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for JobFailure {}

// ========== Result 类型别名 ==========

/// 驱动层结果类型
pub type DriverResult<T> = Result<T, DriverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_suspect_kind_is_fatal() {
        let failure = JobFailure::new(FailureKind::NetworkSuspect, "超时");
        assert!(failure.is_fatal_to_batch());
    }

    #[test]
    fn untyped_message_with_marker_is_fatal() {
        let failure = JobFailure::new(FailureKind::Other, "参考图上传超时，请重试");
        assert!(failure.is_fatal_to_batch());
    }

    #[test]
    fn ordinary_not_found_is_recoverable() {
        let err = DriverError::not_found("提交按钮");
        let failure = JobFailure::from_phase(3, Phase::Submit, &err);
        assert_eq!(failure.kind, FailureKind::NotFound);
        assert!(!failure.is_fatal_to_batch());
        assert!(failure.message.contains("第3个提示词"));
        assert!(failure.message.contains("提交任务"));
    }

    #[test]
    fn job_timeout_message_matches_marker() {
        let failure = JobFailure::job_timed_out(7);
        assert_eq!(failure.message, "第7个提示词处理超时，可能是网络异常");
        assert!(failure.is_fatal_to_batch());
    }

    #[test]
    fn wrong_page_maps_to_wrong_page_kind() {
        let err = DriverError::WrongPage {
            expected: "jimeng".into(),
            actual: "about:blank".into(),
        };
        assert_eq!(err.kind(), FailureKind::WrongPage);
    }
}
