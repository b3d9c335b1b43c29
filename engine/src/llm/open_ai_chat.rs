use std::pin::Pin;

use color_eyre::{
    Result,
    eyre::{WrapErr, eyre},
};
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{OutputMessage, Request, Role, TextGenerator};
use crate::open_ai::check_status;

pub const DEFAULT_TEXT_MODEL: &str = "gpt-4-turbo";

#[derive(Debug, Clone)]
pub struct OpenAIChat {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAIChat {
    pub fn new(api_key: String, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

impl TextGenerator for OpenAIChat {
    fn generate<'a>(
        &'a self,
        req: Request,
    ) -> Pin<Box<dyn Future<Output = Result<OutputMessage>> + Send + 'a>> {
        Box::pin(async move {
            let body = OpenAIChatRequest::new(self.model.clone(), req);
            debug!("Chat request: {body:#?}");

            let res = self
                .client
                .post(self.endpoint())
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await
                .wrap_err("sending chat completion request")?;

            let completion: OpenAIChatResponse = check_status(res)
                .await?
                .json()
                .await
                .wrap_err("parsing chat completion")?;
            debug!("Chat usage: {:?}", completion.usage);

            completion.into_output()
        })
    }
}

//
// ===== OpenAI wire types =====
//

#[derive(Debug, Serialize)]
struct OpenAIChatRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_tokens: usize,
}

impl OpenAIChatRequest {
    fn new(model: String, req: Request) -> Self {
        let mut messages = Vec::with_capacity(req.messages.len() + 1);

        if let Some(system) = req.system {
            messages.push(OpenAIMessage {
                role: "system",
                content: system,
            });
        }

        for msg in req.messages {
            messages.push(OpenAIMessage {
                role: match msg.role {
                    Role::User => "user",
                    Role::Assistant => "assistant",
                },
                content: msg.content,
            });
        }

        Self {
            model,
            messages,
            max_tokens: req.max_tokens,
        }
    }
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIChatResponse {
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

impl OpenAIChatResponse {
    fn into_output(self) -> Result<OutputMessage> {
        let text = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| eyre!("Chat completion contained no choices"))?
            .message
            .content
            .unwrap_or_default();
        let (input_tokens, output_tokens) = self
            .usage
            .map(|u| (u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        Ok(OutputMessage {
            input_tokens,
            output_tokens,
            text,
        })
    }
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
}
