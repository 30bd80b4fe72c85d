//! 参考图匹配 - 业务能力层
//!
//! 提示词里出现了参考图的文件名（不含扩展名，忽略大小写）就算匹配

use crate::models::reference::{remove_whitespace, ReferenceFile, ReferenceLookup};

/// 在查找表中找出提示词引用的参考图
///
/// 同名参考图只取第一张；结果按查找表顺序排列，没有匹配时返回空列表
pub fn match_prompt(prompt_text: &str, lookup: &ReferenceLookup) -> Vec<ReferenceFile> {
    if prompt_text.is_empty() || lookup.is_empty() {
        return Vec::new();
    }

    let normalized = prompt_text.to_lowercase();
    let compact = remove_whitespace(&normalized);

    lookup
        .entries()
        .iter()
        .filter(|entry| {
            normalized.contains(&entry.key)
                || (!entry.compact_key.is_empty() && compact.contains(&entry.compact_key))
        })
        .filter_map(|entry| entry.files.first().cloned())
        .collect()
}

/// 直接对文件列表做匹配
pub fn match_references(prompt_text: &str, reference_files: &[ReferenceFile]) -> Vec<ReferenceFile> {
    match_prompt(prompt_text, &ReferenceLookup::build(reference_files))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(files: &[ReferenceFile]) -> Vec<&str> {
        files.iter().map(|f| f.name.as_str()).collect()
    }

    fn pets() -> Vec<ReferenceFile> {
        vec![
            ReferenceFile::new("cat.png", vec![1u8]),
            ReferenceFile::new("dog.jpg", vec![2u8]),
        ]
    }

    #[test]
    fn matches_case_insensitively() {
        let matched = match_references("a CAT and a tree", &pets());
        assert_eq!(names(&matched), vec!["cat.png"]);
    }

    #[test]
    fn no_match_is_empty() {
        assert!(match_references("no match here", &pets()).is_empty());
    }

    #[test]
    fn substring_match_is_independent_per_file() {
        let matched = match_references("catdog combo", &pets());
        assert_eq!(names(&matched), vec!["cat.png", "dog.jpg"]);
    }

    #[test]
    fn whitespace_in_name_is_ignored_when_compacted() {
        let files = vec![ReferenceFile::new("Red Fox.png", vec![1u8])];
        assert_eq!(names(&match_references("a redfox at dusk", &files)), vec!["Red Fox.png"]);
        assert_eq!(names(&match_references("a red  fox", &files)), vec!["Red Fox.png"]);
    }

    #[test]
    fn first_file_wins_per_key() {
        let files = vec![
            ReferenceFile::new("cat.png", vec![1u8]),
            ReferenceFile::new("CAT.jpg", vec![2u8]),
        ];
        let matched = match_references("my cat", &files);
        assert_eq!(matched.len(), 1);
        assert!(matched[0].same_file(&files[0]));
    }

    #[test]
    fn one_file_can_match_many_prompts() {
        let lookup = ReferenceLookup::build(&pets());
        assert_eq!(match_prompt("cat one", &lookup).len(), 1);
        assert_eq!(match_prompt("cat two", &lookup).len(), 1);
    }
}
