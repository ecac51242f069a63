mod openai_analyzer;

pub use openai_analyzer::{DEFAULT_TITLE_MODEL, FALLBACK_TITLE, OpenAiTranscriptAnalyzer};
