use anyhow::Result;
/// 日志工具模块
///
/// 提供日志格式化和输出的辅助函数
use std::fs;
use tracing::info;

use crate::config::Config;
use crate::orchestrator::BatchReport;

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n即梦批量提交日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 即梦文生图批量提交");
    info!("🌐 目标页面: {}", config.target_url);
    info!("📄 提示词文件: {}", config.prompt_file);
    info!(
        "🖼️ 参考图文件夹: {}",
        config.reference_dir.as_deref().unwrap_or("未设置")
    );
    info!("{}", "=".repeat(60));
}

/// 记录任务加载信息
///
/// # 参数
/// - `prompts`: 非空提示词数量
/// - `references`: 参考图数量
/// - `wait_secs`: 每个任务之间的等待秒数
pub fn log_jobs_loaded(prompts: usize, references: usize, wait_secs: u64) {
    info!("✓ 找到 {} 个待提交的提示词", prompts);
    info!("🖼️ 已加载 {} 张参考图", references);
    info!("⏱️ 每个提示词之间等待 {} 秒\n", wait_secs);
}

/// 打印最终统计信息
pub fn print_final_stats(report: &BatchReport, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 已提交: {}/{}", report.completed, report.total);
    info!("❌ 失败: {}", report.failed);
    if report.stopped {
        info!("⏹️ 批次被提前终止");
    }
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（按字符计）
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
