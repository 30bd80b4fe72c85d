//! 页面自动化宿主 - 编排层
//!
//! 持有 Surface，按顺序接收任务消息，逐个交给阶段状态机执行并发回回执

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::DriverSettings;
use crate::infrastructure::Surface;
use crate::models::{EventSink, JobCompletion};
use crate::orchestrator::bridge::HostEndpoint;
use crate::workflow::{JobOutcome, StepMachine};

pub struct AutomationHost {
    surface: Arc<dyn Surface>,
    settings: DriverSettings,
    expected_url_fragment: String,
    events: EventSink,
    stop: CancellationToken,
}

impl AutomationHost {
    pub fn new(
        surface: Arc<dyn Surface>,
        settings: DriverSettings,
        expected_url_fragment: impl Into<String>,
        events: EventSink,
        stop: CancellationToken,
    ) -> Self {
        Self {
            surface,
            settings,
            expected_url_fragment: expected_url_fragment.into(),
            events,
            stop,
        }
    }

    /// 处理任务直到发送端关闭
    ///
    /// 同一时间只执行一个任务
    pub async fn serve(&self, mut endpoint: HostEndpoint) {
        let machine = StepMachine::new(
            self.surface.as_ref(),
            &self.settings,
            &self.expected_url_fragment,
            &self.events,
            self.stop.clone(),
        );

        while let Some(descriptor) = endpoint.jobs.recv().await {
            let index = descriptor.index;
            let completion = match machine.run(&descriptor).await {
                Ok(JobOutcome::Completed) => JobCompletion::completed(index),
                Ok(JobOutcome::Abandoned { last_phase }) => {
                    info!(
                        "[提示词 {}/{}] 已放弃，最后阶段: {}",
                        index,
                        descriptor.total,
                        last_phase.map(|p| p.label()).unwrap_or("无")
                    );
                    JobCompletion::abandoned(index)
                }
                Err(failure) => JobCompletion::failed(index, failure),
            };
            endpoint.publish(completion);
        }

        if let Err(e) = self.surface.release_handles().await {
            warn!("释放页面句柄失败: {}", e);
        }
        info!("页面自动化宿主已退出");
    }
}
