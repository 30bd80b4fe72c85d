//! 动作原语 - 业务能力层
//!
//! 点击、悬停、聚焦、写文本、设置文件。
//! 点击 / 悬停 / 聚焦失败只记录警告，不向上抛错。

use anyhow::Result;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::infrastructure::{ElementHandle, ElementKind, InputEventKind, MouseEventKind, Surface};
use crate::models::{FilePayload, ReferenceImage};

/// 动作原语
pub struct Actions<'a> {
    surface: &'a dyn Surface,
    clear_delay: Duration,
}

impl<'a> Actions<'a> {
    pub fn new(surface: &'a dyn Surface, clear_delay: Duration) -> Self {
        Self {
            surface,
            clear_delay,
        }
    }

    /// 原生 click() 和合成 click 事件都触发一次
    ///
    /// 有的框架只响应其中一种
    pub async fn trigger_click(&self, el: ElementHandle) {
        if let Err(e) = self.surface.native_click(el).await {
            warn!("元素 click() 调用失败，尝试派发事件: {}", e);
        }
        if let Err(e) = self.surface.dispatch_mouse(el, MouseEventKind::Click).await {
            warn!("派发 click 事件失败: {}", e);
        }
    }

    /// 合成悬停状态（部分删除按钮只在悬停时渲染）
    pub async fn hover(&self, el: ElementHandle) {
        for kind in [MouseEventKind::Over, MouseEventKind::Enter] {
            if let Err(e) = self.surface.dispatch_mouse(el, kind).await {
                warn!("派发 {} 事件失败: {}", kind.dom_name(), e);
            }
        }
    }

    pub async fn focus(&self, el: ElementHandle) {
        if let Err(e) = self.surface.focus(el).await {
            warn!("元素 focus() 调用失败: {}", e);
        }
    }

    async fn notify_changed(&self, el: ElementHandle, with_change: bool) -> Result<()> {
        self.surface.dispatch_input(el, InputEventKind::Input).await?;
        if with_change {
            self.surface
                .dispatch_input(el, InputEventKind::Change)
                .await?;
        }
        Ok(())
    }

    /// 两段式写入：先清空并通知，稍等，再写入真实值并通知
    ///
    /// 新值必须与框架缓存的旧值不同才会触发更新
    pub async fn set_text_value(&self, el: ElementHandle, value: &str) -> Result<()> {
        match self.surface.element_kind(el).await? {
            ElementKind::TextControl => {
                self.surface.set_native_value(el, "").await?;
                self.notify_changed(el, true).await?;
                sleep(self.clear_delay).await;
                self.surface.set_native_value(el, value).await?;
                self.notify_changed(el, true).await?;
            }
            ElementKind::Editable => {
                self.surface.set_text_content(el, "").await?;
                self.notify_changed(el, false).await?;
                sleep(self.clear_delay).await;
                self.surface.set_text_content(el, value).await?;
                self.notify_changed(el, true).await?;
            }
            ElementKind::Other => {
                self.surface.set_native_value(el, value).await?;
                self.notify_changed(el, true).await?;
            }
        }
        debug!("已写入文本 ({} 字符)", value.chars().count());
        Ok(())
    }

    /// 把参考图一次性赋给文件输入框
    ///
    /// 数据缺失或无法解析的图片跳过；一张都不剩时不碰页面。返回实际赋值的文件数
    pub async fn set_files(&self, input: ElementHandle, images: &[ReferenceImage]) -> Result<usize> {
        let payloads = decode_images(images);
        if payloads.is_empty() {
            warn!("没有有效的参考图需要上传");
            return Ok(0);
        }

        let assigned = self.surface.assign_files(input, &payloads).await?;
        self.notify_changed(input, true).await?;
        Ok(assigned)
    }
}

/// 解码参考图，跳过无效项
pub fn decode_images(images: &[ReferenceImage]) -> Vec<FilePayload> {
    images
        .iter()
        .enumerate()
        .filter_map(|(i, image)| {
            let name = if image.name.is_empty() {
                format!("reference-{}.png", i + 1)
            } else {
                image.name.clone()
            };
            let Some(data_url) = image.data_url.as_deref() else {
                warn!("参考图数据缺失，已跳过第 {} 张", i + 1);
                return None;
            };
            match FilePayload::from_data_url(&name, data_url) {
                Ok(payload) => Some(payload),
                Err(reason) => {
                    warn!("参考图 {} 转换失败，已跳过: {}", name, reason);
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_skips_missing_and_malformed() {
        let images = vec![
            ReferenceImage {
                name: "ok.png".into(),
                data_url: Some("data:image/png;base64,AQID".into()),
            },
            ReferenceImage {
                name: "missing.png".into(),
                data_url: None,
            },
            ReferenceImage {
                name: "bad.png".into(),
                data_url: Some("data:image/png;base64,%%%".into()),
            },
            ReferenceImage {
                name: String::new(),
                data_url: Some("data:image/jpeg;base64,AQID".into()),
            },
        ];
        let payloads = decode_images(&images);
        let names: Vec<_> = payloads.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["ok.png", "reference-4.png"]);
    }
}
