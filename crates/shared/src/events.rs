use std::fmt;
use tracing::{debug, info, warn};

/// Where a category collection currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetching,
    Filtering,
    JudgingRelevance,
    JudgingSimilarity,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Fetching => "fetching",
            Stage::Filtering => "filtering",
            Stage::JudgingRelevance => "judging_relevance",
            Stage::JudgingSimilarity => "judging_similarity",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    UntrustedSource(String),
    AlreadySeen,
    NotRelevant,
    /// Same story as the accepted article with this title
    DuplicateOf(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::UntrustedSource(source) => write!(f, "untrusted source {}", source),
            RejectReason::AlreadySeen => f.write_str("title already seen"),
            RejectReason::NotRelevant => f.write_str("not relevant"),
            RejectReason::DuplicateOf(title) => write!(f, "duplicate of \"{}\"", title),
        }
    }
}

/// Progress of a run, one variant per thing worth reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    CategoryStarted {
        category: String,
    },
    AttemptStarted {
        category: String,
        attempt: u32,
        max_attempts: u32,
    },
    /// The attempt ended with nothing to rank
    AttemptEmpty {
        category: String,
        attempt: u32,
        stage: Stage,
    },
    ArticleRejected {
        category: String,
        title: String,
        stage: Stage,
        reason: RejectReason,
    },
    /// A ranked title that matched nothing usable in the pool
    RankedTitleIgnored {
        category: String,
        title: String,
    },
    RankerShortfall {
        category: String,
        requested: usize,
        usable: usize,
    },
    ArticleAccepted {
        category: String,
        title: String,
        backfilled: bool,
    },
    AttemptsExhausted {
        category: String,
        attempts: u32,
    },
    CategoryFinished {
        category: String,
        selected: usize,
    },
}

/// Receiver for pipeline events. The collector never logs on its own.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: PipelineEvent);
}

/// Renders events as `tracing` records.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: PipelineEvent) {
        match event {
            PipelineEvent::CategoryStarted { category } => {
                info!(%category, "collecting category");
            }
            PipelineEvent::AttemptStarted {
                category,
                attempt,
                max_attempts,
            } => {
                debug!(%category, attempt, max_attempts, "attempt started");
            }
            PipelineEvent::AttemptEmpty {
                category,
                attempt,
                stage,
            } => {
                warn!(%category, attempt, %stage, "attempt produced no candidates");
            }
            PipelineEvent::ArticleRejected {
                category,
                title,
                stage,
                reason,
            } => {
                debug!(%category, %title, %stage, %reason, "article rejected");
            }
            PipelineEvent::RankedTitleIgnored { category, title } => {
                debug!(%category, %title, "ranked title not usable");
            }
            PipelineEvent::RankerShortfall {
                category,
                requested,
                usable,
            } => {
                info!(%category, requested, usable, "ranker under-delivered, backfilling");
            }
            PipelineEvent::ArticleAccepted {
                category,
                title,
                backfilled,
            } => {
                info!(%category, %title, backfilled, "article accepted");
            }
            PipelineEvent::AttemptsExhausted { category, attempts } => {
                warn!(%category, attempts, "attempts exhausted, category left empty");
            }
            PipelineEvent::CategoryFinished { category, selected } => {
                info!(%category, selected, "category finished");
            }
        }
    }
}
