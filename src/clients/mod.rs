pub mod gemini;

pub use gemini::{GeminiClient, GenerateReply, GenerativeClient};
