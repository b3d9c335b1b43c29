use std::pin::Pin;

use color_eyre::Result;
use serde::{Deserialize, Serialize};

pub mod open_ai_chat;
pub use open_ai_chat::OpenAIChat;

pub trait TextGenerator {
    fn generate<'a>(
        &'a self,
        req: Request,
    ) -> Pin<Box<dyn Future<Output = Result<OutputMessage>> + Send + 'a>>;
}

#[derive(Debug, Clone)]
pub struct Request {
    pub system: Option<String>,
    pub messages: Vec<InputMessage>,
    pub max_tokens: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InputMessage {
    pub role: Role,
    pub content: String,
}

impl InputMessage {
    pub fn user(user_message: impl Into<String>) -> InputMessage {
        Self {
            role: Role::User,
            content: user_message.into(),
        }
    }

    pub fn assistant(assistant_message: impl Into<String>) -> InputMessage {
        Self {
            role: Role::Assistant,
            content: assistant_message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputMessage {
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub text: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}
