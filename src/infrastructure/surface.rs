//! 页面表面抽象
//!
//! 上层（探测、动作、阶段流程）只通过这个 trait 接触页面，
//! 具体的选择器启发式和 DOM 操作都在实现里。

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::FilePayload;

/// 页面元素句柄
///
/// 由实现分配，只在同一个页面生命周期内有效；
/// 元素被移除或页面刷新后，对句柄的操作视为元素不存在。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementHandle(pub u64);

/// 元素查询条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementQuery {
    /// CSS 选择器
    Css(String),
    /// 在若干选择器命中的元素中按文字查找（忽略空白）
    Text { selectors: Vec<String>, text: String },
}

impl ElementQuery {
    pub fn css(selector: impl Into<String>) -> Self {
        ElementQuery::Css(selector.into())
    }

    pub fn text(selectors: &[String], text: impl Into<String>) -> Self {
        ElementQuery::Text {
            selectors: selectors.to_vec(),
            text: text.into(),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ElementQuery::Css(selector) => selector.clone(),
            ElementQuery::Text { text, .. } => format!("text:{}", text),
        }
    }
}

/// 文档加载状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadyState {
    Loading,
    Interactive,
    Complete,
}

impl ReadyState {
    pub fn as_str(self) -> &'static str {
        match self {
            ReadyState::Loading => "loading",
            ReadyState::Interactive => "interactive",
            ReadyState::Complete => "complete",
        }
    }
}

/// 元素类别，决定写入文本的方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    /// textarea / input
    TextControl,
    /// contenteditable 区域
    Editable,
    Other,
}

/// 鼠标事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseEventKind {
    Click,
    Over,
    Enter,
}

impl MouseEventKind {
    pub fn dom_name(self) -> &'static str {
        match self {
            MouseEventKind::Click => "click",
            MouseEventKind::Over => "mouseover",
            MouseEventKind::Enter => "mouseenter",
        }
    }
}

/// 输入类事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEventKind {
    Input,
    Change,
}

impl InputEventKind {
    pub fn dom_name(self) -> &'static str {
        match self {
            InputEventKind::Input => "input",
            InputEventKind::Change => "change",
        }
    }
}

/// 文件输入框信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInputInfo {
    pub handle: ElementHandle,
    #[serde(default)]
    pub accept: String,
}

impl FileInputInfo {
    pub fn accepts_images(&self) -> bool {
        self.accept.to_lowercase().contains("image")
    }
}

/// 被自动化的页面
///
/// 所有查询都排除驱动自己的悬浮层；
/// `find_visible` 只返回可见元素，`find_all` 只要求元素存在。
#[async_trait]
pub trait Surface: Send + Sync {
    /// 当前页面地址
    async fn location(&self) -> Result<String>;

    async fn ready_state(&self) -> Result<ReadyState>;

    /// 等到 load 事件（已完成时立即返回）
    async fn wait_for_load(&self) -> Result<()>;

    /// 第一个可见的匹配元素（DOM 顺序）
    async fn find_visible(&self, query: &ElementQuery) -> Result<Option<ElementHandle>>;

    async fn find_all(&self, selector: &str) -> Result<Vec<ElementHandle>>;

    async fn closest(&self, el: ElementHandle, selector: &str) -> Result<Option<ElementHandle>>;

    async fn find_within(
        &self,
        el: ElementHandle,
        selector: &str,
    ) -> Result<Option<ElementHandle>>;

    async fn first_child(&self, el: ElementHandle) -> Result<Option<ElementHandle>>;

    async fn matches(&self, el: ElementHandle, selector: &str) -> Result<bool>;

    /// 元素仍在文档中且参与渲染
    async fn is_rendered(&self, el: ElementHandle) -> Result<bool>;

    /// 元素自身及所有祖先（由近到远），最后是 body
    async fn ancestors(&self, el: ElementHandle) -> Result<Vec<ElementHandle>>;

    /// 范围内所有可用的文件输入框
    async fn file_inputs_within(&self, scope: ElementHandle) -> Result<Vec<FileInputInfo>>;

    async fn element_kind(&self, el: ElementHandle) -> Result<ElementKind>;

    /// 调用元素自身的 click()
    async fn native_click(&self, el: ElementHandle) -> Result<()>;

    async fn dispatch_mouse(&self, el: ElementHandle, kind: MouseEventKind) -> Result<()>;

    async fn dispatch_input(&self, el: ElementHandle, kind: InputEventKind) -> Result<()>;

    async fn focus(&self, el: ElementHandle) -> Result<()>;

    /// 通过原生 value setter 写值（绕过框架拦截），不派发事件
    async fn set_native_value(&self, el: ElementHandle, value: &str) -> Result<()>;

    /// 写 textContent，不派发事件
    async fn set_text_content(&self, el: ElementHandle, value: &str) -> Result<()>;

    /// 构造文件列表并赋给输入框，不派发事件；返回赋值的文件数
    async fn assign_files(&self, el: ElementHandle, files: &[FilePayload]) -> Result<usize>;

    /// 释放已分配的句柄
    async fn release_handles(&self) -> Result<()> {
        Ok(())
    }
}
