//! 提示词任务及跨上下文消息

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::JobFailure;
use crate::models::reference::ReferenceFile;

/// 一个提示词任务
///
/// 运行开始时为每个非空行创建一次，之后不再修改
#[derive(Debug, Clone)]
pub struct PromptJob {
    /// 在非空行中的位置（从 0 开始）
    pub order: usize,
    pub raw_prompt: String,
    pub prompt_text: String,
    pub reference_files: Vec<ReferenceFile>,
    /// 显示用序号（从 1 开始）
    pub index: usize,
    pub total: usize,
}

impl PromptJob {
    pub fn reference_names(&self) -> Vec<String> {
        self.reference_files.iter().map(|f| f.name.clone()).collect()
    }

    /// 参考图摘要，没有时显示"无"
    pub fn reference_summary(&self) -> String {
        if self.reference_files.is_empty() {
            "无".to_string()
        } else {
            self.reference_names().join(", ")
        }
    }

    /// 转成发往页面上下文的消息
    pub fn to_descriptor(&self, wait_time: Duration) -> JobDescriptor {
        JobDescriptor {
            prompt_text: self.prompt_text.clone(),
            raw_prompt: self.raw_prompt.clone(),
            index: self.index,
            total: self.total,
            wait_time_ms: wait_time.as_millis() as u64,
            reference_images: self
                .reference_files
                .iter()
                .map(ReferenceImage::from_file)
                .collect(),
        }
    }
}

/// 跨上下文传递的参考图（名称 + data URL）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceImage {
    pub name: String,
    pub data_url: Option<String>,
}

impl ReferenceImage {
    pub fn from_file(file: &ReferenceFile) -> Self {
        Self {
            name: file.name.clone(),
            data_url: (!file.content.is_empty()).then(|| file.to_data_url()),
        }
    }
}

/// 发往页面上下文的任务消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDescriptor {
    pub prompt_text: String,
    pub raw_prompt: String,
    pub index: usize,
    pub total: usize,
    pub wait_time_ms: u64,
    pub reference_images: Vec<ReferenceImage>,
}

impl JobDescriptor {
    /// 实际要输入的文本：优先整理后的提示词，其次原始行
    pub fn effective_prompt(&self) -> &str {
        if self.prompt_text.is_empty() {
            &self.raw_prompt
        } else {
            &self.prompt_text
        }
    }

    pub fn wait_time(&self) -> Duration {
        Duration::from_millis(self.wait_time_ms)
    }
}

/// 页面上下文处理完一个任务后的回执
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCompletion {
    pub index: usize,
    pub success: bool,
    /// 因停止信号中途放弃（不算失败，也不计入完成数）
    #[serde(default)]
    pub abandoned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JobFailure>,
}

impl JobCompletion {
    pub fn completed(index: usize) -> Self {
        Self {
            index,
            success: true,
            abandoned: false,
            error: None,
        }
    }

    pub fn abandoned(index: usize) -> Self {
        Self {
            index,
            success: true,
            abandoned: true,
            error: None,
        }
    }

    pub fn failed(index: usize, failure: JobFailure) -> Self {
        Self {
            index,
            success: false,
            abandoned: false,
            error: Some(failure),
        }
    }
}

/// 解码后可以直接交给文件输入框的文件
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilePayload {
    pub name: String,
    pub mime: String,
    /// 已验证可解码的 base64 内容
    pub base64: String,
}

impl FilePayload {
    /// 解析 `data:<mime>;base64,<content>`，数据缺失或无法解码时返回错误说明
    pub fn from_data_url(name: &str, data_url: &str) -> Result<Self, String> {
        let (meta, content) = data_url
            .split_once(',')
            .ok_or_else(|| "data URL 缺少逗号分隔".to_string())?;
        let meta = meta
            .strip_prefix("data:")
            .ok_or_else(|| "data URL 缺少 data: 前缀".to_string())?;
        let mime = meta
            .split(';')
            .next()
            .filter(|m| !m.is_empty())
            .unwrap_or("image/png")
            .to_string();

        let bytes = STANDARD
            .decode(content.trim())
            .map_err(|e| format!("base64 解码失败: {}", e))?;
        if bytes.is_empty() {
            return Err("文件内容为空".to_string());
        }

        Ok(Self {
            name: name.to_string(),
            mime,
            base64: content.trim().to_string(),
        })
    }
}
