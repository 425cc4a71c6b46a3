pub mod output_path;
pub mod summary_service;
pub mod transcript_reader;

pub use output_path::{resolve_output_path, sanitize_model_name};
pub use summary_service::SummaryService;
pub use transcript_reader::read_transcript;
