//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量调度和资源管理，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 应用入口
//! - 管理应用生命周期（初始化、运行）
//! - 加载提示词、参考图、面板设置
//! - 管理浏览器资源（Browser、PageSurface）
//! - 输出全局统计信息
//!
//! ### `batch_orchestrator` - 批量编排器
//! - 构建任务列表，逐个派发
//! - 分类结果，网络异常时终止整批
//!
//! ### `bridge` - 跨上下文桥
//! - 任务消息发往宿主，按序号等待回执
//!
//! ### `automation_host` - 页面自动化宿主
//! - 持有 Surface，逐个执行任务
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (App)
//!     ↓
//! batch_orchestrator ──bridge──▶ automation_host
//!                                   ↓
//!                     workflow::StepMachine (处理单个提示词)
//!                                   ↓
//!                services (能力层：probe / actions / matcher)
//!                                   ↓
//!             infrastructure (基础设施：Surface / JsExecutor)
//! ```

pub mod automation_host;
pub mod batch_orchestrator;
pub mod batch_processor;
pub mod bridge;

// 重新导出主要类型
pub use automation_host::AutomationHost;
pub use batch_orchestrator::{BatchOrchestrator, BatchReport, BatchRunState};
pub use batch_processor::App;
pub use bridge::{Bridge, HostEndpoint};
