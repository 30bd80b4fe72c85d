//! 失败记录服务 - 业务能力层
//!
//! 只负责把处理失败的提示词追加到文件，方便下次重跑

use anyhow::Result;
use std::fs::OpenOptions;
use std::io::Write;
use tracing::debug;

/// 失败记录服务
///
/// 文件每行一个提示词，可以直接作为下一次的提示词文件
pub struct FailureWriter {
    file_path: String,
}

impl FailureWriter {
    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            file_path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.file_path
    }

    /// 追加一条失败记录
    ///
    /// # 参数
    /// - `index`: 提示词序号
    /// - `prompt`: 提示词原文
    /// - `reason`: 失败原因（只写进日志）
    pub fn write(&self, index: usize, prompt: &str, reason: &str) -> Result<()> {
        debug!("记录失败: 提示词 {} | 原因: {}", index, reason);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)?;

        writeln!(file, "{}", prompt.replace('\n', " "))?;

        Ok(())
    }
}

impl Default for FailureWriter {
    fn default() -> Self {
        Self::with_path("failed_prompts.txt")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_one_line_per_failure() {
        let path = std::env::temp_dir().join(format!("jimeng_failed_{}.txt", std::process::id()));
        let path_str = path.to_string_lossy().to_string();
        let writer = FailureWriter::with_path(&path_str);
        writer.write(1, "a cat", "未找到提交按钮").unwrap();
        writer.write(2, "a\ndog", "超时").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(content, "a cat\na dog\n");
    }
}
