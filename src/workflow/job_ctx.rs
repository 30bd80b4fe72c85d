//! 任务处理上下文
//!
//! 封装"我正在处理第几个提示词"这一信息

use std::fmt::Display;

/// 任务处理上下文
#[derive(Debug, Clone, Copy)]
pub struct JobCtx {
    /// 提示词序号（从1开始）
    pub index: usize,

    /// 本批提示词总数
    pub total: usize,
}

impl JobCtx {
    pub fn new(index: usize, total: usize) -> Self {
        Self { index, total }
    }
}

impl Display for JobCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[提示词 {}/{}]", self.index, self.total)
    }
}
