use crate::models::reference::ReferenceFile;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 认为是参考图的扩展名
const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "webp", "gif", "bmp"];

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// 扫描文件夹中的所有参考图，按文件名排序
pub async fn load_reference_folder(folder_path: &str) -> Result<Vec<ReferenceFile>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        anyhow::bail!("参考图文件夹不存在: {}", folder_path);
    }

    let mut paths = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_file() && is_image(&path) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        match fs::read(&path).await {
            Ok(bytes) => {
                tracing::debug!("已加载参考图: {} ({} 字节)", name, bytes.len());
                files.push(ReferenceFile::new(name, bytes).with_source(&path));
            }
            Err(e) => {
                tracing::warn!("读取参考图失败 {}: {}", path.display(), e);
            }
        }
    }

    tracing::info!("✓ 共加载 {} 张参考图", files.len());
    Ok(files)
}
