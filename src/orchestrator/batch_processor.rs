//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：启动日志文件、连接（或启动）浏览器、创建 PageSurface
//! 2. **加载输入**：提示词文件、参考图文件夹、面板设置
//! 3. **运行批次**：宿主和编排器并排运行（`tokio::join!`），面板消费事件
//! 4. **停止控制**：Ctrl-C 取消本次运行的停止信号
//! 5. **资源管理**：唯一持有 Browser 的模块
//! 6. **全局统计**：输出最终结果

use crate::browser;
use crate::config::{Config, DriverSettings};
use crate::infrastructure::{JsExecutor, PageSurface, Surface};
use crate::models::{load_batch_file, load_reference_folder, EventSink, ReferenceFile};
use crate::orchestrator::automation_host::AutomationHost;
use crate::orchestrator::batch_orchestrator::{BatchOrchestrator, BatchReport};
use crate::orchestrator::bridge::Bridge;
use crate::panel::{ConsolePanel, PanelSettings};
use crate::services::FailureWriter;
use crate::utils::logging::{init_log_file, log_jobs_loaded, log_startup, print_final_stats};
use anyhow::Result;
use chromiumoxide::Browser;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// 一次运行的输入
struct BatchInput {
    prompt_lines: Vec<String>,
    wait_time_secs: u64,
    driver: DriverSettings,
}

/// 应用主结构
pub struct App {
    config: Config,
    _browser: Browser,
    surface: Arc<dyn Surface>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        // 初始化日志文件
        init_log_file(&config.output_log_file)?;

        log_startup(&config);

        let (browser, page) = if config.launch_browser {
            browser::launch_browser(
                &config.target_url,
                config.headless,
                config.chrome_executable.as_deref(),
            )
            .await?
        } else {
            browser::connect_to_browser_and_page(
                config.browser_debug_port,
                &config.target_url,
                &config.expected_url_fragment,
            )
            .await?
        };

        // 创建 JsExecutor（持有 page），再包装成 Surface
        let executor = JsExecutor::new(page);
        let surface: Arc<dyn Surface> = Arc::new(PageSurface::new(
            executor,
            &config.driver.overlay_selector,
        ));

        Ok(Self {
            config,
            _browser: browser,
            surface,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<BatchReport> {
        let input = self.load_input().await?;
        let references = self.load_references().await;

        if input.prompt_lines.iter().all(|l| l.trim().is_empty()) {
            warn!("⚠️ 没有找到待提交的提示词，程序结束");
            return Ok(BatchReport::default());
        }

        let non_blank = input
            .prompt_lines
            .iter()
            .filter(|l| !l.trim().is_empty())
            .count();
        log_jobs_loaded(non_blank, references.len(), input.wait_time_secs);

        let stop = CancellationToken::new();
        spawn_ctrl_c_watcher(stop.clone());

        let (events, event_rx) = EventSink::channel();
        let panel = ConsolePanel::new(
            Some(self.config.output_log_file.clone()),
            FailureWriter::with_path(&self.config.failed_prompts_file),
        );
        let panel_task = tokio::spawn(panel.run(event_rx));

        let report = {
            let (bridge, endpoint) = Bridge::new();
            let host = AutomationHost::new(
                Arc::clone(&self.surface),
                input.driver.clone(),
                self.config.expected_url_fragment.clone(),
                events.clone(),
                stop.clone(),
            );
            let orchestrator = BatchOrchestrator::new(bridge, events, input.driver);

            let wait_time = Duration::from_secs(input.wait_time_secs);
            let (lines, refs, stop_ref) = (&input.prompt_lines, &references, &stop);
            let (_, report) = tokio::join!(host.serve(endpoint), async move {
                let report = orchestrator
                    .submit_batch(lines, refs, wait_time, stop_ref)
                    .await;
                // 关闭发送端让宿主退出
                drop(orchestrator);
                report
            });
            report?
        };

        match panel_task.await {
            Ok(summary) => info!(
                "面板记录: 开始 {} 个，成功 {} 个，失败 {} 个，停止 {} 个",
                summary.started, summary.succeeded, summary.failed, summary.abandoned
            ),
            Err(e) => warn!("面板任务异常退出: {}", e),
        }

        print_final_stats(&report, &self.config.output_log_file);
        if report.failed > 0 {
            info!("失败的提示词已写入: {}", self.config.failed_prompts_file);
        }

        Ok(report)
    }

    /// 加载提示词；提示词文件不存在时使用上次保存的面板设置
    async fn load_input(&self) -> Result<BatchInput> {
        info!("\n📁 正在读取提示词...");
        let settings_path = Path::new(&self.config.settings_file);
        let saved = PanelSettings::load(settings_path);
        let prompt_path = Path::new(&self.config.prompt_file);

        let input = if prompt_path.exists() {
            let batch = load_batch_file(prompt_path).await?;
            BatchInput {
                prompt_lines: batch.prompt_lines(),
                wait_time_secs: batch.wait_time_secs.unwrap_or(self.config.wait_time_secs),
                driver: batch.driver.unwrap_or_else(|| self.config.driver.clone()),
            }
        } else {
            warn!(
                "⚠️ 提示词文件 {} 不存在，使用上次保存的提示词",
                self.config.prompt_file
            );
            BatchInput {
                prompt_lines: saved.prompts.lines().map(str::to_string).collect(),
                wait_time_secs: saved.wait_time_secs,
                driver: self.config.driver.clone(),
            }
        };

        let updated = PanelSettings {
            wait_time_secs: input.wait_time_secs,
            prompts: input.prompt_lines.join("\n"),
        };
        if let Err(e) = updated.save(settings_path) {
            warn!("⚠️ 保存面板设置失败: {}", e);
        }

        Ok(input)
    }

    /// 加载参考图；文件夹无法读取时只提交提示词
    async fn load_references(&self) -> Vec<ReferenceFile> {
        let Some(dir) = &self.config.reference_dir else {
            return Vec::new();
        };
        match load_reference_folder(dir).await {
            Ok(files) => {
                info!("✓ 参考图文件夹 {} 中找到 {} 张图片", dir, files.len());
                files
            }
            Err(e) => {
                warn!("⚠️ 读取参考图文件夹失败，将仅提交提示词: {}", e);
                Vec::new()
            }
        }
    }
}

/// Ctrl-C 时取消本次运行
fn spawn_ctrl_c_watcher(stop: CancellationToken) {
    tokio::spawn(async move {
        tokio::select! {
            _ = stop.cancelled() => {}
            signal = tokio::signal::ctrl_c() => {
                if signal.is_ok() {
                    warn!("⏹️ 收到 Ctrl-C，当前阶段结束后停止");
                    stop.cancel();
                }
            }
        }
    });
}
