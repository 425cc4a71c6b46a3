pub mod report;
pub mod transcript;
pub mod usage;

pub use report::{BatchReport, SummaryRecord};
pub use transcript::TranscriptFile;
pub use usage::{TokenUsage, UsageMetadata};
