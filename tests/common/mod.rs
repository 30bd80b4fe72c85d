//! 测试用的内存页面
//!
//! 元素只按"命中的选择器字符串"匹配，不解析 CSS；
//! 所有会改变页面的调用都记进 mutation 日志。

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use jimeng_batch::config::DriverSettings;
use jimeng_batch::infrastructure::{
    ElementHandle, ElementKind, ElementQuery, FileInputInfo, InputEventKind, MouseEventKind,
    ReadyState, Surface,
};
use jimeng_batch::models::FilePayload;

pub const JIMENG_URL: &str = "https://jimeng.jianying.com/ai-tool/generate?type=image";
pub const BODY: ElementHandle = ElementHandle(0);

#[derive(Debug, Clone)]
struct FakeElement {
    parent: Option<u64>,
    selectors: Vec<String>,
    kind: ElementKind,
    text: String,
    accept: Option<String>,
    visible: bool,
    attached: bool,
    appear_at: Option<Instant>,
    /// 点击后从文档移除的元素
    removes_on_click: Option<u64>,
    value: String,
}

impl FakeElement {
    fn new(parent: Option<u64>, selectors: &[&str]) -> Self {
        Self {
            parent,
            selectors: selectors.iter().map(|s| s.to_string()).collect(),
            kind: ElementKind::Other,
            text: String::new(),
            accept: None,
            visible: true,
            attached: true,
            appear_at: None,
            removes_on_click: None,
            value: String::new(),
        }
    }

    fn present(&self) -> bool {
        self.attached && self.appear_at.map_or(true, |at| Instant::now() >= at)
    }

    fn has(&self, selector: &str) -> bool {
        self.selectors.iter().any(|s| s == selector)
    }
}

struct FakeState {
    elements: Vec<FakeElement>,
    location: String,
    ready_state: ReadyState,
    load_after: Option<Duration>,
    mutations: Vec<String>,
    /// 每赋值一个文件，就新增一个带这些选择器的元素
    spawn_on_assign: Option<Vec<String>>,
    cancel_on: Option<(String, CancellationToken)>,
    calls: HashMap<&'static str, usize>,
}

pub struct FakeSurface {
    state: Mutex<FakeState>,
}

impl FakeSurface {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                elements: vec![FakeElement::new(None, &["body"])],
                location: JIMENG_URL.to_string(),
                ready_state: ReadyState::Complete,
                load_after: None,
                mutations: Vec::new(),
                spawn_on_assign: None,
                cancel_on: None,
                calls: HashMap::new(),
            }),
        }
    }

    /// 带输入框和提交按钮的生成页面
    pub fn jimeng_page(settings: &DriverSettings) -> Self {
        let surface = Self::new();
        let field = surface.add(&[&settings.prompt_primary_selector]);
        surface.set_kind(field, ElementKind::TextControl);
        surface.add(&[&settings.submit_selectors[0], &settings.clickable_selector]);
        surface
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn add(&self, selectors: &[&str]) -> ElementHandle {
        self.add_child(BODY, selectors)
    }

    pub fn add_child(&self, parent: ElementHandle, selectors: &[&str]) -> ElementHandle {
        let mut state = self.lock();
        state.elements.push(FakeElement::new(Some(parent.0), selectors));
        ElementHandle(state.elements.len() as u64 - 1)
    }

    fn with_element(&self, el: ElementHandle, f: impl FnOnce(&mut FakeElement)) {
        let mut state = self.lock();
        f(&mut state.elements[el.0 as usize]);
    }

    pub fn set_kind(&self, el: ElementHandle, kind: ElementKind) {
        self.with_element(el, |e| e.kind = kind);
    }

    pub fn set_text(&self, el: ElementHandle, text: &str) {
        self.with_element(el, |e| e.text = text.to_string());
    }

    pub fn set_accept(&self, el: ElementHandle, accept: &str) {
        self.with_element(el, |e| e.accept = Some(accept.to_string()));
    }

    pub fn hide(&self, el: ElementHandle) {
        self.with_element(el, |e| e.visible = false);
    }

    pub fn appear_after(&self, el: ElementHandle, delay: Duration) {
        let at = Instant::now() + delay;
        self.with_element(el, |e| e.appear_at = Some(at));
    }

    pub fn remove_on_click(&self, clicked: ElementHandle, removed: ElementHandle) {
        self.with_element(clicked, |e| e.removes_on_click = Some(removed.0));
    }

    pub fn spawn_on_assign(&self, selectors: &[&str]) {
        self.lock().spawn_on_assign = Some(selectors.iter().map(|s| s.to_string()).collect());
    }

    pub fn set_location(&self, location: &str) {
        self.lock().location = location.to_string();
    }

    pub fn set_ready_state(&self, state: ReadyState, load_after: Option<Duration>) {
        let mut guard = self.lock();
        guard.ready_state = state;
        guard.load_after = load_after;
    }

    /// 记录到以 `prefix` 开头的页面改动时取消 `token`
    pub fn cancel_on(&self, prefix: &str, token: CancellationToken) {
        self.lock().cancel_on = Some((prefix.to_string(), token));
    }

    pub fn mutations(&self) -> Vec<String> {
        self.lock().mutations.clone()
    }

    pub fn mutations_with(&self, prefix: &str) -> usize {
        self.lock()
            .mutations
            .iter()
            .filter(|m| m.starts_with(prefix))
            .count()
    }

    pub fn value(&self, el: ElementHandle) -> String {
        self.lock().elements[el.0 as usize].value.clone()
    }

    pub fn calls(&self, method: &'static str) -> usize {
        self.lock().calls.get(method).copied().unwrap_or(0)
    }

    pub fn is_attached(&self, el: ElementHandle) -> bool {
        self.lock().elements[el.0 as usize].attached
    }

    fn record(&self, method: &'static str) {
        *self.lock().calls.entry(method).or_default() += 1;
    }

    fn mutate(&self, entry: String) {
        let mut state = self.lock();
        if let Some((prefix, token)) = &state.cancel_on {
            if entry.starts_with(prefix.as_str()) {
                token.cancel();
            }
        }
        state.mutations.push(entry);
    }

    fn element(&self, el: ElementHandle) -> Result<FakeElement> {
        let state = self.lock();
        state
            .elements
            .get(el.0 as usize)
            .filter(|e| e.present())
            .cloned()
            .ok_or_else(|| anyhow!("元素 {} 已不存在", el.0))
    }

    fn is_descendant(state: &FakeState, id: u64, ancestor: u64) -> bool {
        let mut current = state.elements[id as usize].parent;
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = state.elements[parent as usize].parent;
        }
        false
    }

    fn present_ids(state: &FakeState) -> impl Iterator<Item = u64> + '_ {
        state
            .elements
            .iter()
            .enumerate()
            .filter(|(_, e)| e.present())
            .map(|(i, _)| i as u64)
    }
}

#[async_trait]
impl Surface for FakeSurface {
    async fn location(&self) -> Result<String> {
        Ok(self.lock().location.clone())
    }

    async fn ready_state(&self) -> Result<ReadyState> {
        Ok(self.lock().ready_state)
    }

    async fn wait_for_load(&self) -> Result<()> {
        let load_after = self.lock().load_after;
        match load_after {
            Some(delay) => {
                tokio::time::sleep(delay).await;
                self.lock().ready_state = ReadyState::Complete;
                Ok(())
            }
            None => std::future::pending().await,
        }
    }

    async fn find_visible(&self, query: &ElementQuery) -> Result<Option<ElementHandle>> {
        self.record("find_visible");
        let state = self.lock();
        let found = Self::present_ids(&state).find(|id| {
            let e = &state.elements[*id as usize];
            e.visible
                && match query {
                    ElementQuery::Css(selector) => e.has(selector),
                    ElementQuery::Text { selectors, text } => {
                        selectors.iter().any(|s| e.has(s))
                            && e.text.split_whitespace().collect::<String>() == *text
                    }
                }
        });
        Ok(found.map(ElementHandle))
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<ElementHandle>> {
        self.record("find_all");
        let state = self.lock();
        let found: Vec<_> = Self::present_ids(&state)
            .filter(|id| state.elements[*id as usize].has(selector))
            .map(ElementHandle)
            .collect();
        Ok(found)
    }

    async fn closest(&self, el: ElementHandle, selector: &str) -> Result<Option<ElementHandle>> {
        self.element(el)?;
        let state = self.lock();
        let mut current = Some(el.0);
        while let Some(id) = current {
            let e = &state.elements[id as usize];
            if e.has(selector) {
                return Ok(Some(ElementHandle(id)));
            }
            current = e.parent;
        }
        Ok(None)
    }

    async fn find_within(
        &self,
        el: ElementHandle,
        selector: &str,
    ) -> Result<Option<ElementHandle>> {
        self.element(el)?;
        let state = self.lock();
        let found = Self::present_ids(&state).find(|id| {
            state.elements[*id as usize].has(selector) && Self::is_descendant(&state, *id, el.0)
        });
        Ok(found.map(ElementHandle))
    }

    async fn first_child(&self, el: ElementHandle) -> Result<Option<ElementHandle>> {
        self.element(el)?;
        let state = self.lock();
        let found = Self::present_ids(&state).find(|id| state.elements[*id as usize].parent == Some(el.0));
        Ok(found.map(ElementHandle))
    }

    async fn matches(&self, el: ElementHandle, selector: &str) -> Result<bool> {
        Ok(self.element(el)?.has(selector))
    }

    async fn is_rendered(&self, el: ElementHandle) -> Result<bool> {
        let state = self.lock();
        Ok(state
            .elements
            .get(el.0 as usize)
            .is_some_and(|e| e.present() && e.visible))
    }

    async fn ancestors(&self, el: ElementHandle) -> Result<Vec<ElementHandle>> {
        self.element(el)?;
        let state = self.lock();
        let mut chain = Vec::new();
        let mut current = Some(el.0);
        while let Some(id) = current {
            if id != BODY.0 {
                chain.push(ElementHandle(id));
            }
            current = state.elements[id as usize].parent;
        }
        chain.push(BODY);
        Ok(chain)
    }

    async fn file_inputs_within(&self, scope: ElementHandle) -> Result<Vec<FileInputInfo>> {
        let state = self.lock();
        let inputs: Vec<_> = Self::present_ids(&state)
            .filter(|id| Self::is_descendant(&state, *id, scope.0))
            .filter_map(|id| {
                state.elements[id as usize]
                    .accept
                    .clone()
                    .map(|accept| FileInputInfo {
                        handle: ElementHandle(id),
                        accept,
                    })
            })
            .collect();
        Ok(inputs)
    }

    async fn element_kind(&self, el: ElementHandle) -> Result<ElementKind> {
        Ok(self.element(el)?.kind)
    }

    async fn native_click(&self, el: ElementHandle) -> Result<()> {
        let e = self.element(el)?;
        self.mutate(format!("native-click:{}", el.0));
        if let Some(target) = e.removes_on_click {
            self.lock().elements[target as usize].attached = false;
        }
        Ok(())
    }

    async fn dispatch_mouse(&self, el: ElementHandle, kind: MouseEventKind) -> Result<()> {
        self.element(el)?;
        self.mutate(format!("{}:{}", kind.dom_name(), el.0));
        Ok(())
    }

    async fn dispatch_input(&self, el: ElementHandle, kind: InputEventKind) -> Result<()> {
        self.element(el)?;
        self.mutate(format!("{}:{}", kind.dom_name(), el.0));
        Ok(())
    }

    async fn focus(&self, el: ElementHandle) -> Result<()> {
        self.element(el)?;
        self.mutate(format!("focus:{}", el.0));
        Ok(())
    }

    async fn set_native_value(&self, el: ElementHandle, value: &str) -> Result<()> {
        self.element(el)?;
        self.with_element(el, |e| e.value = value.to_string());
        self.mutate(format!("value:{}={}", el.0, value));
        Ok(())
    }

    async fn set_text_content(&self, el: ElementHandle, value: &str) -> Result<()> {
        self.element(el)?;
        self.with_element(el, |e| e.value = value.to_string());
        self.mutate(format!("text:{}={}", el.0, value));
        Ok(())
    }

    async fn assign_files(&self, el: ElementHandle, files: &[FilePayload]) -> Result<usize> {
        self.element(el)?;
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        self.mutate(format!("files:{}={}", el.0, names.join(",")));

        let spawn = self.lock().spawn_on_assign.clone();
        if let Some(selectors) = spawn {
            let refs: Vec<&str> = selectors.iter().map(String::as_str).collect();
            for _ in files {
                self.add(&refs);
            }
        }
        Ok(files.len())
    }
}
