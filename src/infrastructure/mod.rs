//! 基础设施层
//!
//! 持有页面资源，只暴露"执行 JS"和"操作页面元素"的能力

pub mod driver_script;
pub mod js_executor;
pub mod page_surface;
pub mod surface;

pub use js_executor::JsExecutor;
pub use page_surface::PageSurface;
pub use surface::{
    ElementHandle, ElementKind, ElementQuery, FileInputInfo, InputEventKind, MouseEventKind,
    ReadyState, Surface,
};
