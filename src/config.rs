use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 浏览器调试端口
    pub browser_debug_port: u16,
    /// 目标URL（没有找到已打开的页面时导航到这里）
    pub target_url: String,
    /// 页面地址必须包含的片段
    pub expected_url_fragment: String,
    /// 是否自己启动浏览器（否则连接调试端口）
    pub launch_browser: bool,
    /// 启动浏览器时是否无头
    pub headless: bool,
    /// 浏览器可执行文件路径
    pub chrome_executable: Option<String>,
    /// 提示词文件（.txt 或 .toml）
    pub prompt_file: String,
    /// 参考图文件夹
    pub reference_dir: Option<String>,
    /// 每个提示词之间的等待秒数
    pub wait_time_secs: u64,
    /// 面板设置文件
    pub settings_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
    /// 失败提示词文件
    pub failed_prompts_file: String,
    /// 页面交互细节
    pub driver: DriverSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser_debug_port: 9222,
            target_url: "https://jimeng.jianying.com/ai-tool/generate".to_string(),
            expected_url_fragment: "jimeng.jianying.com/ai-tool/generate".to_string(),
            launch_browser: false,
            headless: false,
            chrome_executable: None,
            prompt_file: "prompts.txt".to_string(),
            reference_dir: None,
            wait_time_secs: 3,
            settings_file: "jimeng_settings.toml".to_string(),
            verbose_logging: false,
            output_log_file: "batch_log.txt".to_string(),
            failed_prompts_file: "failed_prompts.txt".to_string(),
            driver: DriverSettings::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            browser_debug_port: std::env::var("BROWSER_DEBUG_PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.browser_debug_port),
            target_url: std::env::var("TARGET_URL").unwrap_or(default.target_url),
            expected_url_fragment: std::env::var("EXPECTED_URL_FRAGMENT").unwrap_or(default.expected_url_fragment),
            launch_browser: std::env::var("LAUNCH_BROWSER").ok().and_then(|v| v.parse().ok()).unwrap_or(default.launch_browser),
            headless: std::env::var("HEADLESS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.headless),
            chrome_executable: std::env::var("CHROME_EXECUTABLE").ok().or(default.chrome_executable),
            prompt_file: std::env::var("PROMPT_FILE").unwrap_or(default.prompt_file),
            reference_dir: std::env::var("REFERENCE_DIR").ok().or(default.reference_dir),
            wait_time_secs: std::env::var("WAIT_TIME_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.wait_time_secs),
            settings_file: std::env::var("SETTINGS_FILE").unwrap_or(default.settings_file),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            failed_prompts_file: std::env::var("FAILED_PROMPTS_FILE").unwrap_or(default.failed_prompts_file),
            driver: default.driver,
        }
    }

    pub fn wait_time(&self) -> Duration {
        Duration::from_secs(self.wait_time_secs)
    }
}

/// 页面自动化的选择器和时间参数
///
/// 选择器只是启发式的匹配规则，页面改版时在这里调整即可
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverSettings {
    /// 驱动自己的悬浮层，里面的元素一律忽略
    pub overlay_selector: String,
    pub reference_item_selector: String,
    pub remove_container_selector: String,
    pub remove_button_selector: String,
    pub clickable_selector: String,
    pub upload_zone_selector: String,
    pub prompt_primary_selector: String,
    pub prompt_fallback_selector: String,
    pub submit_selectors: Vec<String>,
    pub submit_text: String,
    pub submit_text_selectors: Vec<String>,

    pub poll_interval_ms: u64,
    pub page_load_timeout_ms: u64,
    pub ready_settle_ms: u64,
    pub clear_max_rounds: usize,
    pub hover_settle_ms: u64,
    pub entry_hover_settle_ms: u64,
    pub remove_detach_timeout_ms: u64,
    pub after_remove_ms: u64,
    pub between_rounds_ms: u64,
    pub upload_zone_timeout_ms: u64,
    pub file_input_timeout_ms: u64,
    pub upload_confirm_timeout_ms: u64,
    pub upload_confirm_interval_ms: u64,
    /// 上传确认超时时按"上传超时"终止整批任务
    pub strict_upload_confirmation: bool,
    pub prompt_timeout_ms: u64,
    pub value_clear_delay_ms: u64,
    pub submit_selector_timeout_ms: u64,
    pub submit_settle_ms: u64,
    pub min_post_submit_wait_ms: u64,
    /// 单个任务在等待时间之外的额外宽限
    pub job_grace_ms: u64,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            overlay_selector: "#jimeng-batch-overlay".to_string(),
            reference_item_selector:
                r#"div[class^="reference-item-"], div[class*=" reference-item-"]"#.to_string(),
            remove_container_selector: r#"div[class^="remove-button-container-"], div[class*=" remove-button-container-"]"#.to_string(),
            remove_button_selector: r#"[class^="remove-button-"]"#.to_string(),
            clickable_selector: r#"button, [role='button']"#.to_string(),
            upload_zone_selector: "div.reference-upload-eclumn".to_string(),
            prompt_primary_selector: "textarea.lv-textarea".to_string(),
            prompt_fallback_selector:
                r#"textarea, div[contenteditable="true"], input[type="text"]"#.to_string(),
            submit_selectors: vec![
                r#"button[class^="submit-button-"]"#.to_string(),
                r#"button[class*=" submit-button-"]"#.to_string(),
                r#"[class^="submit-button-"] button"#.to_string(),
                r#"[class*=" submit-button-"] button"#.to_string(),
                r#"[class^="submit-button-"][role="button"]"#.to_string(),
                r#"[class*=" submit-button-"][role="button"]"#.to_string(),
            ],
            submit_text: "生成".to_string(),
            submit_text_selectors: vec![
                "button".to_string(),
                r#"[role="button"]"#.to_string(),
                "span".to_string(),
                "div".to_string(),
            ],

            poll_interval_ms: 100,
            page_load_timeout_ms: 30_000,
            ready_settle_ms: 200,
            clear_max_rounds: 5,
            hover_settle_ms: 120,
            entry_hover_settle_ms: 80,
            remove_detach_timeout_ms: 1500,
            after_remove_ms: 300,
            between_rounds_ms: 400,
            upload_zone_timeout_ms: 5000,
            file_input_timeout_ms: 4000,
            upload_confirm_timeout_ms: 8000,
            upload_confirm_interval_ms: 300,
            strict_upload_confirmation: false,
            prompt_timeout_ms: 5000,
            value_clear_delay_ms: 100,
            submit_selector_timeout_ms: 2000,
            submit_settle_ms: 300,
            min_post_submit_wait_ms: 500,
            job_grace_ms: 180_000,
        }
    }
}

impl DriverSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// 单个任务的整体超时：等待时间 + 宽限
    pub fn job_timeout(&self, wait_time: Duration) -> Duration {
        wait_time + Duration::from_millis(self.job_grace_ms)
    }
}

pub fn millis(ms: u64) -> Duration {
    Duration::from_millis(ms)
}
