//! 元素探测 - 业务能力层
//!
//! 所有等待都从这里出发：固定间隔轮询，有界超时，每轮先检查停止信号。

use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{DriverError, DriverResult};
use crate::infrastructure::{ElementHandle, ElementQuery, Surface};

/// 一次元素等待的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Found(ElementHandle),
    TimedOut,
    Stopped,
}

impl ProbeOutcome {
    pub fn element(self) -> Option<ElementHandle> {
        match self {
            ProbeOutcome::Found(el) => Some(el),
            _ => None,
        }
    }

    pub fn is_stopped(self) -> bool {
        self == ProbeOutcome::Stopped
    }
}

/// 可被停止信号打断的等待，返回 false 表示被打断
pub async fn pause(stop: &CancellationToken, duration: Duration) -> bool {
    if duration.is_zero() {
        return !stop.is_cancelled();
    }
    tokio::select! {
        _ = stop.cancelled() => false,
        _ = sleep(duration) => true,
    }
}

/// 元素探测器
pub struct ElementProbe<'a> {
    surface: &'a dyn Surface,
    stop: CancellationToken,
    interval: Duration,
}

impl<'a> ElementProbe<'a> {
    pub fn new(surface: &'a dyn Surface, stop: CancellationToken, interval: Duration) -> Self {
        Self {
            surface,
            stop,
            interval,
        }
    }

    pub fn stop_token(&self) -> &CancellationToken {
        &self.stop
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_cancelled()
    }

    /// 等待第一个可见的匹配元素
    ///
    /// 超时不是错误，返回 `TimedOut` 由调用方决定后果
    pub async fn await_element(&self, query: &ElementQuery, timeout: Duration) -> ProbeOutcome {
        let start = Instant::now();
        loop {
            if self.stop.is_cancelled() {
                return ProbeOutcome::Stopped;
            }

            match self.surface.find_visible(query).await {
                Ok(Some(el)) => return ProbeOutcome::Found(el),
                Ok(None) => {}
                Err(e) => debug!("查询 {} 失败，视为暂未出现: {}", query.describe(), e),
            }

            let elapsed = start.elapsed();
            if elapsed >= timeout {
                return ProbeOutcome::TimedOut;
            }
            if !pause(&self.stop, self.interval.min(timeout - elapsed)).await {
                return ProbeOutcome::Stopped;
            }
        }
    }

    /// 从容器开始逐级向上查找最近的文件输入框
    ///
    /// 每一级祖先都搜索其整个子树，最后搜索 body；优先 accept 含 image 的输入框
    pub async fn locate_file_input(&self, container: ElementHandle) -> Option<ElementHandle> {
        let scopes = match self.surface.ancestors(container).await {
            Ok(scopes) => scopes,
            Err(e) => {
                debug!("获取上传区域祖先失败: {}", e);
                return None;
            }
        };

        for scope in scopes {
            let inputs = match self.surface.file_inputs_within(scope).await {
                Ok(inputs) => inputs,
                Err(e) => {
                    debug!("查询文件输入框失败: {}", e);
                    continue;
                }
            };
            if let Some(preferred) = inputs
                .iter()
                .find(|input| input.accepts_images())
                .or_else(|| inputs.first())
            {
                return Some(preferred.handle);
            }
        }
        None
    }

    /// 在超时前反复查找最近的文件输入框
    pub async fn await_file_input(&self, container: ElementHandle, timeout: Duration) -> ProbeOutcome {
        let start = Instant::now();
        loop {
            if self.stop.is_cancelled() {
                return ProbeOutcome::Stopped;
            }
            if let Some(input) = self.locate_file_input(container).await {
                return ProbeOutcome::Found(input);
            }

            let elapsed = start.elapsed();
            if elapsed >= timeout {
                return ProbeOutcome::TimedOut;
            }
            if !pause(&self.stop, self.interval.min(timeout - elapsed)).await {
                return ProbeOutcome::Stopped;
            }
        }
    }

    /// 轮询任意条件
    ///
    /// - `Ok(true)`：条件满足
    /// - `Ok(false)`：被停止信号打断
    /// - `Err(Timeout)`：超时
    pub async fn await_condition<F, Fut>(
        &self,
        what: &str,
        mut predicate: F,
        timeout: Duration,
        interval: Duration,
    ) -> DriverResult<bool>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = bool>,
    {
        let start = Instant::now();
        loop {
            if self.stop.is_cancelled() {
                return Ok(false);
            }
            if predicate().await {
                return Ok(true);
            }

            let elapsed = start.elapsed();
            if elapsed >= timeout {
                return Err(DriverError::timeout(what, timeout));
            }
            if !pause(&self.stop, interval.min(timeout - elapsed)).await {
                return Ok(false);
            }
        }
    }
}
