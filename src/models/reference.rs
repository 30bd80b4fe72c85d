//! 参考图文件及按名称的查找表

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::Regex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

/// 用户选中的参考图
///
/// 内容放在 `Arc` 里，克隆只复制引用；同一份内容视为同一个文件
#[derive(Debug, Clone)]
pub struct ReferenceFile {
    pub name: String,
    pub content: Arc<[u8]>,
    pub source: Option<PathBuf>,
}

impl ReferenceFile {
    pub fn new(name: impl Into<String>, content: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// 查找键：去掉扩展名、去空白、小写
    pub fn base_key(&self) -> String {
        normalize_base_name(&self.name)
    }

    /// 按扩展名推断 MIME，未知时按 png 处理
    pub fn mime_type(&self) -> &'static str {
        let ext = self
            .name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "jpg" | "jpeg" => "image/jpeg",
            "webp" => "image/webp",
            "gif" => "image/gif",
            "bmp" => "image/bmp",
            _ => "image/png",
        }
    }

    /// 编码为 data URL，用于跨上下文传递
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type(),
            STANDARD.encode(&self.content)
        )
    }

    pub fn same_file(&self, other: &ReferenceFile) -> bool {
        Arc::ptr_eq(&self.content, &other.content)
    }
}

fn extension_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\.[^.]+$").expect("valid extension pattern"))
}

/// 去掉扩展名
pub fn strip_extension(name: &str) -> &str {
    match extension_pattern().find(name) {
        Some(m) => &name[..m.start()],
        None => name,
    }
}

pub fn normalize_base_name(name: &str) -> String {
    strip_extension(name).trim().to_lowercase()
}

/// 去掉所有空白字符
pub fn remove_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// 查找表中的一项：同名的参考图按加入顺序排列
#[derive(Debug, Clone)]
pub struct LookupEntry {
    pub key: String,
    pub compact_key: String,
    pub files: Vec<ReferenceFile>,
}

/// 参考图查找表
///
/// 每次运行开始时构建一次，运行期间只读
#[derive(Debug, Clone, Default)]
pub struct ReferenceLookup {
    entries: Vec<LookupEntry>,
    by_key: HashMap<String, usize>,
}

impl ReferenceLookup {
    pub fn build(files: &[ReferenceFile]) -> Self {
        let mut lookup = Self::default();
        for file in files {
            let key = file.base_key();
            if key.is_empty() {
                continue;
            }
            match lookup.by_key.get(&key) {
                Some(&pos) => lookup.entries[pos].files.push(file.clone()),
                None => {
                    lookup.by_key.insert(key.clone(), lookup.entries.len());
                    lookup.entries.push(LookupEntry {
                        compact_key: remove_whitespace(&key),
                        key,
                        files: vec![file.clone()],
                    });
                }
            }
        }
        lookup
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, key: &str) -> Option<&[ReferenceFile]> {
        self.by_key
            .get(key)
            .map(|&pos| self.entries[pos].files.as_slice())
    }

    pub fn entries(&self) -> &[LookupEntry] {
        &self.entries
    }
}
