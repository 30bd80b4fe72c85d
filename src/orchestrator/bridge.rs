//! 跨上下文桥 - 编排层
//!
//! 编排层和页面自动化宿主之间只交换消息：
//! - `JobDescriptor` 经 mpsc 发往宿主
//! - `JobCompletion` 经 broadcast 发回，按序号对应

use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{FailureKind, JobFailure};
use crate::models::{JobCompletion, JobDescriptor};

/// 完成回执缓冲区大小
const COMPLETION_CAPACITY: usize = 16;

/// 编排层持有的一端
///
/// 回执的发送端只在宿主手里，宿主退出后等待中的派发立即收到 `Closed`
pub struct Bridge {
    jobs_tx: mpsc::Sender<JobDescriptor>,
    completions: broadcast::Receiver<JobCompletion>,
}

impl Clone for Bridge {
    fn clone(&self) -> Self {
        Self {
            jobs_tx: self.jobs_tx.clone(),
            completions: self.completions.resubscribe(),
        }
    }
}

/// 宿主持有的一端
pub struct HostEndpoint {
    pub jobs: mpsc::Receiver<JobDescriptor>,
    pub completions: broadcast::Sender<JobCompletion>,
}

impl HostEndpoint {
    /// 发布回执；没有订阅者时回执直接丢弃
    pub fn publish(&self, completion: JobCompletion) {
        if self.completions.send(completion).is_err() {
            debug!("没有等待中的订阅者，回执已丢弃");
        }
    }
}

impl Bridge {
    pub fn new() -> (Self, HostEndpoint) {
        let (jobs_tx, jobs_rx) = mpsc::channel(1);
        let (completions, completions_rx) = broadcast::channel(COMPLETION_CAPACITY);
        (
            Self {
                jobs_tx,
                completions: completions_rx,
            },
            HostEndpoint {
                jobs: jobs_rx,
                completions,
            },
        )
    }

    /// 派发一个任务并等待对应序号的回执
    ///
    /// - 发送前已停止：不发送，直接视为放弃
    /// - 超时：返回网络异常失败
    /// - 回执 success=false：返回其中的失败
    pub async fn dispatch(
        &self,
        descriptor: JobDescriptor,
        timeout: Duration,
        stop: &CancellationToken,
    ) -> Result<JobCompletion, JobFailure> {
        let index = descriptor.index;
        if stop.is_cancelled() {
            return Ok(JobCompletion::abandoned(index));
        }

        // 先订阅再发送，避免错过回执
        let mut rx = self.completions.resubscribe();

        if self.jobs_tx.send(descriptor).await.is_err() {
            return Err(JobFailure::new(
                FailureKind::Other,
                format!("第{}个提示词无法发送：页面自动化已退出", index),
            ));
        }

        let wait = async {
            loop {
                match rx.recv().await {
                    Ok(completion) if completion.index == index => return Some(completion),
                    Ok(stale) => debug!("忽略不匹配的回执: 第{}个", stale.index),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("回执通道落后 {} 条", n)
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        };

        match tokio::time::timeout(timeout, wait).await {
            Err(_) => Err(JobFailure::job_timed_out(index)),
            Ok(None) => Err(JobFailure::new(
                FailureKind::Other,
                format!("第{}个提示词没有收到回执：页面自动化已退出", index),
            )),
            Ok(Some(completion)) if completion.success => Ok(completion),
            Ok(Some(completion)) => Err(completion.error.unwrap_or_else(|| {
                JobFailure::new(FailureKind::Other, format!("第{}个提示词处理失败", index))
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobDescriptor;

    fn descriptor(index: usize) -> JobDescriptor {
        JobDescriptor {
            prompt_text: format!("prompt {}", index),
            raw_prompt: format!("prompt {}", index),
            index,
            total: 3,
            wait_time_ms: 0,
            reference_images: Vec::new(),
        }
    }

    #[tokio::test]
    async fn ignores_stale_completions() {
        let (bridge, mut host) = Bridge::new();
        let stop = CancellationToken::new();

        tokio::spawn(async move {
            while let Some(job) = host.jobs.recv().await {
                host.publish(JobCompletion::completed(job.index + 100));
                host.publish(JobCompletion::completed(job.index));
            }
        });

        let completion = bridge
            .dispatch(descriptor(2), Duration::from_secs(5), &stop)
            .await
            .unwrap();
        assert_eq!(completion.index, 2);
        assert!(!completion.abandoned);
    }

    #[tokio::test(start_paused = true)]
    async fn silent_host_times_out_as_network_suspect() {
        let (bridge, mut host) = Bridge::new();
        let stop = CancellationToken::new();
        tokio::spawn(async move { while host.jobs.recv().await.is_some() {} });

        let failure = bridge
            .dispatch(descriptor(4), Duration::from_secs(183), &stop)
            .await
            .unwrap_err();
        assert_eq!(failure.kind, FailureKind::NetworkSuspect);
        assert_eq!(failure.message, "第4个提示词处理超时，可能是网络异常");
    }

    #[tokio::test]
    async fn stopped_before_send_is_abandoned() {
        let (bridge, mut host) = Bridge::new();
        let stop = CancellationToken::new();
        stop.cancel();

        let completion = bridge
            .dispatch(descriptor(1), Duration::from_secs(1), &stop)
            .await
            .unwrap();
        assert!(completion.abandoned);
        assert!(host.jobs.try_recv().is_err());
    }

    #[tokio::test]
    async fn closed_host_is_ordinary_failure() {
        let (bridge, host) = Bridge::new();
        drop(host);
        let stop = CancellationToken::new();

        let failure = bridge
            .dispatch(descriptor(1), Duration::from_secs(1), &stop)
            .await
            .unwrap_err();
        assert_eq!(failure.kind, FailureKind::Other);
        assert!(!failure.is_fatal_to_batch());
    }

    #[tokio::test(start_paused = true)]
    async fn host_exiting_mid_job_is_not_a_timeout() {
        let (bridge, mut host) = Bridge::new();
        let stop = CancellationToken::new();
        tokio::spawn(async move {
            if host.jobs.recv().await.is_some() {
                drop(host);
            }
        });

        let failure = bridge
            .dispatch(descriptor(3), Duration::from_secs(183), &stop)
            .await
            .unwrap_err();
        assert_eq!(failure.kind, FailureKind::Other);
        assert_eq!(failure.message, "第3个提示词没有收到回执：页面自动化已退出");
        assert!(!failure.is_fatal_to_batch());
    }
}
