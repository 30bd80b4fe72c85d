//! 面板设置持久化
//!
//! 保存上一次使用的等待时间和提示词，下次启动时恢复

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// 默认等待秒数
pub const DEFAULT_WAIT_TIME_SECS: u64 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelSettings {
    #[serde(default = "default_wait_time")]
    pub wait_time_secs: u64,
    #[serde(default)]
    pub prompts: String,
}

fn default_wait_time() -> u64 {
    DEFAULT_WAIT_TIME_SECS
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self {
            wait_time_secs: DEFAULT_WAIT_TIME_SECS,
            prompts: String::new(),
        }
    }
}

impl PanelSettings {
    /// 读取设置；文件不存在或内容无效时返回默认值
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                debug!("未读取到面板设置 {}: {}", path.display(), e);
                return Self::default();
            }
        };
        match toml::from_str::<PanelSettings>(&content) {
            Ok(mut settings) => {
                if settings.wait_time_secs == 0 {
                    settings.wait_time_secs = DEFAULT_WAIT_TIME_SECS;
                }
                settings
            }
            Err(e) => {
                warn!("⚠️ 面板设置无效，使用默认值: {}", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("序列化面板设置失败")?;
        std::fs::write(path, content)
            .with_context(|| format!("无法写入面板设置: {}", path.display()))?;
        Ok(())
    }
}
