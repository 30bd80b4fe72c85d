//! # Jimeng Batch
//!
//! 即梦（Jimeng）文生图页面的批量提交工具
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `JsExecutor` - 唯一的 page owner，提供 eval() 能力
//! - `Surface` - 页面操作的抽象，`PageSurface` 是基于注入脚本的实现
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `ElementProbe` - 有界轮询等待元素 / 条件
//! - `Actions` - 点击、悬停、写值、设置文件
//! - `reference_matcher` / `job_builder` - 参考图匹配和任务构建
//! - `FailureWriter` - 记录失败的提示词
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个提示词"的完整处理流程
//! - `JobCtx` - 上下文封装（序号 + 总数）
//! - `StepMachine` - 六个阶段（准备 → 清理 → 上传 → 输入 → 提交 → 等待）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_orchestrator` - 顺序派发、结果分类、终止判断
//! - `orchestrator/bridge` + `automation_host` - 跨上下文消息
//! - `orchestrator/batch_processor` - 应用入口，管理资源
//!
//! `panel/` 把事件渲染到控制台和日志文件。
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod panel;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::connect_to_browser_and_page;
pub use config::{Config, DriverSettings};
pub use error::{DriverError, DriverResult, FailureKind, JobFailure};
pub use infrastructure::{JsExecutor, PageSurface, Surface};
pub use models::{JobDescriptor, PromptJob, ReferenceFile};
pub use orchestrator::{App, BatchOrchestrator, BatchReport};
pub use workflow::{JobCtx, JobOutcome, StepMachine};
