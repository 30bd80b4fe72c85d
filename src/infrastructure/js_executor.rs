//! JS 执行器 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"执行 JS"的能力

use anyhow::{Context, Result};
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value as JsonValue;

/// 脚本返回值的外层包装，避免 `null` / `undefined` 无法反序列化
#[derive(Deserialize)]
struct Envelope<T> {
    value: T,
}

/// JS 执行器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露 eval() 能力
/// - 不认识提示词 / 参考图
/// - 不处理业务流程
#[derive(Clone)]
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 获取 page 的引用（用于其他操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 执行 JS 表达式并返回 JSON 结果（Promise 会被等待）
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue> {
        let result = self.page.evaluate_expression(js_code.into()).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 表达式并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> Result<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    /// 先执行 `prelude`，再调用 `window.<object>.<method>(...args)`
    ///
    /// 返回值统一包在 `{ value }` 里，所以 `Option<T>` 可以正确接收 `null`
    pub async fn call<T: DeserializeOwned>(
        &self,
        prelude: &str,
        object: &str,
        method: &str,
        args: &[JsonValue],
    ) -> Result<T> {
        let args_json = serde_json::to_string(args)?;
        let js_code = format!(
            r#"
            (async () => {{
                {prelude}
                const result = await window.{object}.{method}(...{args_json});
                return {{ value: result === undefined ? null : result }};
            }})()
            "#
        );

        let envelope: Envelope<T> = self
            .eval_as(js_code)
            .await
            .with_context(|| format!("页面脚本调用失败: {}", method))?;
        Ok(envelope.value)
    }
}
