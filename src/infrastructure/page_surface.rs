//! 基于 chromiumoxide 页面的 `Surface` 实现

use anyhow::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value as JsonValue};

use crate::infrastructure::driver_script::install_script;
use crate::infrastructure::surface::{
    ElementHandle, ElementKind, ElementQuery, FileInputInfo, InputEventKind, MouseEventKind,
    ReadyState, Surface,
};
use crate::infrastructure::JsExecutor;
use crate::models::FilePayload;

const DRIVER_OBJECT: &str = "__jimengBatchDriver";

/// 通过注入脚本操作真实页面
pub struct PageSurface {
    executor: JsExecutor,
    install: String,
}

impl PageSurface {
    pub fn new(executor: JsExecutor, overlay_selector: &str) -> Self {
        Self {
            executor,
            install: install_script(overlay_selector),
        }
    }

    pub fn executor(&self) -> &JsExecutor {
        &self.executor
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, args: &[JsonValue]) -> Result<T> {
        self.executor
            .call(&self.install, DRIVER_OBJECT, method, args)
            .await
    }

    async fn call_handle(&self, method: &str, args: &[JsonValue]) -> Result<Option<ElementHandle>> {
        self.call::<Option<ElementHandle>>(method, args).await
    }
}

#[async_trait]
impl Surface for PageSurface {
    async fn location(&self) -> Result<String> {
        self.call("location", &[]).await
    }

    async fn ready_state(&self) -> Result<ReadyState> {
        let state: String = self.call("readyState", &[]).await?;
        Ok(match state.as_str() {
            "complete" => ReadyState::Complete,
            "interactive" => ReadyState::Interactive,
            _ => ReadyState::Loading,
        })
    }

    async fn wait_for_load(&self) -> Result<()> {
        let _: bool = self.call("waitForLoad", &[]).await?;
        Ok(())
    }

    async fn find_visible(&self, query: &ElementQuery) -> Result<Option<ElementHandle>> {
        let query = match query {
            ElementQuery::Css(selector) => json!({ "css": selector }),
            ElementQuery::Text { selectors, text } => json!({ "selectors": selectors, "text": text }),
        };
        self.call_handle("findVisible", &[query]).await
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<ElementHandle>> {
        self.call("findAll", &[json!(selector)]).await
    }

    async fn closest(&self, el: ElementHandle, selector: &str) -> Result<Option<ElementHandle>> {
        self.call_handle("closest", &[json!(el), json!(selector)]).await
    }

    async fn find_within(
        &self,
        el: ElementHandle,
        selector: &str,
    ) -> Result<Option<ElementHandle>> {
        self.call_handle("findWithin", &[json!(el), json!(selector)])
            .await
    }

    async fn first_child(&self, el: ElementHandle) -> Result<Option<ElementHandle>> {
        self.call_handle("firstChild", &[json!(el)]).await
    }

    async fn matches(&self, el: ElementHandle, selector: &str) -> Result<bool> {
        self.call("matches", &[json!(el), json!(selector)]).await
    }

    async fn is_rendered(&self, el: ElementHandle) -> Result<bool> {
        self.call("isRendered", &[json!(el)]).await
    }

    async fn ancestors(&self, el: ElementHandle) -> Result<Vec<ElementHandle>> {
        self.call("ancestors", &[json!(el)]).await
    }

    async fn file_inputs_within(&self, scope: ElementHandle) -> Result<Vec<FileInputInfo>> {
        self.call("fileInputs", &[json!(scope)]).await
    }

    async fn element_kind(&self, el: ElementHandle) -> Result<ElementKind> {
        self.call("kind", &[json!(el)]).await
    }

    async fn native_click(&self, el: ElementHandle) -> Result<()> {
        let _: bool = self.call("nativeClick", &[json!(el)]).await?;
        Ok(())
    }

    async fn dispatch_mouse(&self, el: ElementHandle, kind: MouseEventKind) -> Result<()> {
        let _: bool = self
            .call("dispatchMouse", &[json!(el), json!(kind.dom_name())])
            .await?;
        Ok(())
    }

    async fn dispatch_input(&self, el: ElementHandle, kind: InputEventKind) -> Result<()> {
        let _: bool = self
            .call("dispatchInput", &[json!(el), json!(kind.dom_name())])
            .await?;
        Ok(())
    }

    async fn focus(&self, el: ElementHandle) -> Result<()> {
        let _: bool = self.call("focus", &[json!(el)]).await?;
        Ok(())
    }

    async fn set_native_value(&self, el: ElementHandle, value: &str) -> Result<()> {
        let _: bool = self
            .call("setNativeValue", &[json!(el), json!(value)])
            .await?;
        Ok(())
    }

    async fn set_text_content(&self, el: ElementHandle, value: &str) -> Result<()> {
        let _: bool = self
            .call("setTextContent", &[json!(el), json!(value)])
            .await?;
        Ok(())
    }

    async fn assign_files(&self, el: ElementHandle, files: &[FilePayload]) -> Result<usize> {
        self.call("assignFiles", &[json!(el), serde_json::to_value(files)?])
            .await
    }

    async fn release_handles(&self) -> Result<()> {
        let _: bool = self.call("release", &[]).await?;
        Ok(())
    }
}
