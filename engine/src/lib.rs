use crate::{
    image_model::{ImageFetcher, ImageGenerator},
    llm::TextGenerator,
};

pub mod book;
pub mod image_model;
pub mod llm;
pub mod open_ai;
pub mod persist;
pub mod review;

pub type TextGenBox = Box<dyn TextGenerator + Send + Sync>;
pub type ImageGenBox = Box<dyn ImageGenerator + Send + Sync>;
pub type ImageFetchBox = Box<dyn ImageFetcher + Send + Sync>;

pub const REVIEW_MAX_TOKENS: usize = 1500;
/// Number of review characters that go into the illustration prompt.
pub const ILLUSTRATION_PROMPT_CHARS: usize = 250;
