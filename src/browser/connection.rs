use anyhow::{Context, Result};
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

/// 连接到浏览器并获取即梦页面
///
/// 优先复用地址包含 `url_fragment` 的已打开标签页，否则新开一个并导航到 `target_url`
pub async fn connect_to_browser_and_page(
    port: u16,
    target_url: &str,
    url_fragment: &str,
) -> Result<(Browser, Page)> {
    let browser_url = format!("http://localhost:{}", port);
    info!("正在连接到浏览器: {}", browser_url);
    debug!("目标 URL: {}, 匹配片段: {}", target_url, url_fragment);

    let (browser, mut handler) = Browser::connect(&browser_url).await.map_err(|e| {
        error!("连接浏览器失败: {}", e);
        e
    })?;
    debug!("浏览器连接成功");

    // 在后台处理浏览器事件
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 添加短暂延迟以等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    let pages = browser.pages().await?;
    debug!("获取到 {} 个页面", pages.len());

    if let Some(page) = find_page_by_url(&pages, url_fragment).await {
        return Ok((browser, page));
    }
    debug!("未找到已打开的即梦页面，将创建新页面");

    let page = open_page(&browser, target_url).await?;
    Ok((browser, page))
}

/// 在已打开的标签页里查找地址包含片段的页面
pub async fn find_page_by_url(pages: &[Page], url_fragment: &str) -> Option<Page> {
    for p in pages {
        if let Ok(Some(url)) = p.url().await {
            debug!("检查页面地址: {}", url);
            if url.contains(url_fragment) {
                info!("✓ 找到目标页面: {}", url);
                return Some(p.clone());
            }
        }
    }
    None
}

/// 新建页面并导航
pub async fn open_page(browser: &Browser, url: &str) -> Result<Page> {
    debug!("创建新页面并导航到: {}", url);
    let page = browser
        .new_page("about:blank")
        .await
        .context("创建新页面失败")?;
    page.goto(url)
        .await
        .with_context(|| format!("导航到 {} 失败", url))?;
    info!("已导航到: {}", url);
    Ok(page)
}
