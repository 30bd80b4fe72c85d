//! 面板层
//!
//! 命令行下的"面板"：把事件渲染成日志，保存设置

pub mod console;
pub mod settings;

pub use console::{ConsolePanel, PanelSummary};
pub use settings::PanelSettings;
