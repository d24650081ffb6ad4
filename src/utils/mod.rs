pub mod json_extractor;
pub mod text_truncator;
