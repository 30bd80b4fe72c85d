use crate::config::DriverSettings;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tokio::fs;

/// 批量任务文件
///
/// 支持两种格式：
/// - `.txt`：每行一个提示词
/// - `.toml`：`prompts` 多行字符串，可选 `wait_time_secs` 和 `[driver]` 覆盖项
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchFile {
    #[serde(default)]
    pub prompts: String,
    #[serde(default)]
    pub wait_time_secs: Option<u64>,
    #[serde(default)]
    pub driver: Option<DriverSettings>,
}

impl BatchFile {
    /// 原始提示词行（包含空行，由 job_builder 统一过滤）
    pub fn prompt_lines(&self) -> Vec<String> {
        self.prompts.lines().map(str::to_string).collect()
    }
}

/// 从文件加载批量任务
pub async fn load_batch_file(path: &Path) -> Result<BatchFile> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取提示词文件: {}", path.display()))?;

    let is_toml = path
        .extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    if is_toml {
        parse_batch_toml(&content)
            .with_context(|| format!("无法解析TOML文件: {}", path.display()))
    } else {
        Ok(BatchFile {
            prompts: content,
            ..Default::default()
        })
    }
}

pub fn parse_batch_toml(content: &str) -> Result<BatchFile> {
    let batch: BatchFile = toml::from_str(content)?;
    Ok(batch)
}
