//! 文章生命周期阶段
//!
//! 枚举顺序即推进顺序：`INIT → … → READY`。PUBLISHED / ARCHIVED 只用于工作流结束后的记账。

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Init,
    Analyzing,
    Analyzed,
    Outlining,
    Outlined,
    Drafting,
    Drafted,
    Reviewing,
    Reviewed,
    Optimizing,
    Optimized,
    Ready,
    Published,
    Archived,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Init => "INIT",
            Stage::Analyzing => "ANALYZING",
            Stage::Analyzed => "ANALYZED",
            Stage::Outlining => "OUTLINING",
            Stage::Outlined => "OUTLINED",
            Stage::Drafting => "DRAFTING",
            Stage::Drafted => "DRAFTED",
            Stage::Reviewing => "REVIEWING",
            Stage::Reviewed => "REVIEWED",
            Stage::Optimizing => "OPTIMIZING",
            Stage::Optimized => "OPTIMIZED",
            Stage::Ready => "READY",
            Stage::Published => "PUBLISHED",
            Stage::Archived => "ARCHIVED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Ready | Stage::Published | Stage::Archived)
    }

    /// 合法迁移：
    /// - 核心流程内只能向前推进（可跳过中间态），不能越过 READY
    /// - 审核后可回到 DRAFTING（改内容）或 OUTLINING（改结构）
    /// - READY 之后只能进入 PUBLISHED / ARCHIVED，PUBLISHED 之后只能 ARCHIVED
    pub fn can_transition_to(&self, next: Stage) -> bool {
        match (*self, next) {
            (Stage::Reviewing, Stage::Drafting | Stage::Outlining) => true,
            (Stage::Ready, Stage::Published | Stage::Archived) => true,
            (Stage::Published, Stage::Archived) => true,
            (from, to) => from < to && to <= Stage::Ready,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
