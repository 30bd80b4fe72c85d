use tracing_subscriber::EnvFilter;

/// 初始化日志输出（默认 info 级别，可用 RUST_LOG 覆盖）
pub fn init() {
    init_with(false);
}

/// 初始化日志输出，`verbose` 为 true 时默认 debug 级别
///
/// 重复调用不会报错（测试里会多次初始化）
pub fn init_with(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("jimeng_batch={},chromiumoxide=warn", default_level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
