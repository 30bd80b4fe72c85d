//! 任务构建 - 业务能力层

use crate::models::{PromptJob, ReferenceFile, ReferenceLookup};
use crate::services::reference_matcher::match_prompt;

/// 过滤出非空提示词行（去掉首尾空白）
pub fn prompt_lines<S: AsRef<str>>(raw_lines: &[S]) -> Vec<String> {
    raw_lines
        .iter()
        .flat_map(|chunk| chunk.as_ref().lines())
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// 把原始输入变成有序的任务列表
///
/// 参考图查找表只在这里构建一次，整个运行期间共用
pub fn build_jobs<S: AsRef<str>>(raw_lines: &[S], reference_files: &[ReferenceFile]) -> Vec<PromptJob> {
    let lookup = ReferenceLookup::build(reference_files);
    let lines = prompt_lines(raw_lines);
    let total = lines.len();

    lines
        .into_iter()
        .enumerate()
        .map(|(order, line)| PromptJob {
            order,
            reference_files: match_prompt(&line, &lookup),
            prompt_text: line.clone(),
            raw_prompt: line,
            index: order + 1,
            total,
        })
        .collect()
}
