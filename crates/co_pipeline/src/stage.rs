use co_core::SourceArticle;
use serde::Serialize;
use std::fmt;

/// Where an article is in its optimization run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    Fetched,
    Searching,
    Selecting,
    Extracting,
    Optimizing,
    Publishing,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Fetched => "fetched",
            Stage::Searching => "searching",
            Stage::Selecting => "selecting",
            Stage::Extracting => "extracting",
            Stage::Optimizing => "optimizing",
            Stage::Publishing => "publishing",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", rename_all = "camelCase")]
pub enum AbortReason {
    SourceIsOptimized,
    NotEnoughReferences { found: usize },
    NoExtractions { attempted: usize },
    ModelFailed { message: String },
    StoreFailed { message: String },
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::SourceIsOptimized => write!(f, "article is already an optimized version"),
            AbortReason::NotEnoughReferences { found } => {
                write!(f, "not enough reference articles found ({} of 2)", found)
            }
            AbortReason::NoExtractions { attempted } => {
                write!(f, "failed to extract content from any of {} reference articles", attempted)
            }
            AbortReason::ModelFailed { message } => write!(f, "model call failed: {}", message),
            AbortReason::StoreFailed { message } => write!(f, "store write failed: {}", message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum PipelineOutcome {
    Published(SourceArticle),
    AlreadyOptimized(SourceArticle),
    Aborted { stage: Stage, reason: AbortReason },
}

impl PipelineOutcome {
    pub fn aborted(stage: Stage, reason: AbortReason) -> Self {
        PipelineOutcome::Aborted { stage, reason }
    }

    /// The derivative, whether fresh or pre-existing.
    pub fn article(&self) -> Option<&SourceArticle> {
        match self {
            PipelineOutcome::Published(article) | PipelineOutcome::AlreadyOptimized(article) => Some(article),
            PipelineOutcome::Aborted { .. } => None,
        }
    }

    pub fn is_published(&self) -> bool {
        matches!(self, PipelineOutcome::Published(_))
    }
}

impl fmt::Display for PipelineOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineOutcome::Published(article) => write!(f, "published \"{}\" ({})", article.title, article.id),
            PipelineOutcome::AlreadyOptimized(article) => {
                write!(f, "already optimized as \"{}\" ({})", article.title, article.id)
            }
            PipelineOutcome::Aborted { stage, reason } => write!(f, "aborted while {}: {}", stage, reason),
        }
    }
}
