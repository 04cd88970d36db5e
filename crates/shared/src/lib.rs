// Public modules
pub mod collector;
pub mod config;
pub mod error;
pub mod events;
pub mod filter;
pub mod gnews;
pub mod io;
pub mod judge;
pub mod llm;
pub mod models;
pub mod retry;
pub mod runner;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use collector::{CategoryCollector, CategoryOutcome};
pub use config::{Config, PipelineSettings};
pub use error::TransportError;
pub use events::{EventSink, PipelineEvent, RejectReason, Stage, TracingSink};
pub use filter::filter_sources;
pub use gnews::{ArticleSource, GNewsClient};
pub use io::{load_selection, save_raw_log, save_selection};
pub use judge::{Judge, LlmJudge};
pub use llm::{ClaudeClient, LanguageModel};
pub use models::{Article, CategoryQuota, RawLog, SeenTitles};
pub use retry::RetryPolicy;
pub use runner::{OutputPaths, PipelineRunner, RunMode, RunReport};
