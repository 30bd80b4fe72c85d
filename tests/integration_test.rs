use jimeng_batch::browser::connect_to_browser_and_page;
use jimeng_batch::config::Config;
use jimeng_batch::infrastructure::{ElementQuery, JsExecutor, PageSurface, ReadyState, Surface};
use jimeng_batch::models::load_reference_folder;
use jimeng_batch::utils::logger;

#[tokio::test]
#[ignore] // 默认忽略，需要手动运行：cargo test -- --ignored
async fn test_browser_connection() {
    // 初始化日志
    logger::init();

    // 加载配置
    let config = Config::from_env();

    // 测试浏览器连接
    let result = connect_to_browser_and_page(
        config.browser_debug_port,
        &config.target_url,
        &config.expected_url_fragment,
    )
    .await;

    assert!(result.is_ok(), "应该能够成功连接浏览器");
}

#[tokio::test]
#[ignore]
async fn test_prompt_field_is_visible() {
    logger::init();
    let config = Config::from_env();

    let (_browser, page) = connect_to_browser_and_page(
        config.browser_debug_port,
        &config.target_url,
        &config.expected_url_fragment,
    )
    .await
    .expect("连接浏览器失败");

    let surface = PageSurface::new(JsExecutor::new(page), &config.driver.overlay_selector);
    assert_eq!(
        surface.ready_state().await.expect("读取页面状态失败"),
        ReadyState::Complete
    );

    let field = surface
        .find_visible(&ElementQuery::css(&config.driver.prompt_primary_selector))
        .await
        .expect("查询输入框失败");
    assert!(field.is_some(), "即梦页面应该有提示词输入框（需要已登录）");
}

#[tokio::test]
#[ignore]
async fn test_load_reference_folder() {
    logger::init();
    let config = Config::from_env();

    let dir = config.reference_dir.expect("请设置 REFERENCE_DIR");
    let files = load_reference_folder(&dir)
        .await
        .expect("应该能够读取参考图文件夹");
    println!("找到 {} 张参考图", files.len());
}
