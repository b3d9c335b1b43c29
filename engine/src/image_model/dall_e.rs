use std::pin::Pin;

use color_eyre::{Result, eyre::WrapErr};
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{AssetRef, ImageGenerator, ImageRequest, ImageSize, Quality};
use crate::open_ai::check_status;

pub const DEFAULT_IMAGE_MODEL: &str = "dall-e-2";

#[derive(Debug, Clone)]
pub struct DallE {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl DallE {
    pub fn new(api_key: String, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/images/generations", self.base_url.trim_end_matches('/'))
    }
}

impl ImageGenerator for DallE {
    fn generate<'a>(
        &'a self,
        req: ImageRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<AssetRef>>> + Send + 'a>> {
        Box::pin(async move {
            let body = GenerationRequest {
                model: &self.model,
                prompt: &req.prompt,
                size: req.size,
                quality: req.quality,
                n: req.n,
                response_format: "url",
            };
            debug!("Image request: {body:#?}");

            let res = self
                .client
                .post(self.endpoint())
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await
                .wrap_err("sending image generation request")?;

            let generation: GenerationResponse = check_status(res)
                .await?
                .json()
                .await
                .wrap_err("parsing image generation response")?;
            debug!("Image response: {generation:#?}");

            Ok(generation.into_assets())
        })
    }
}

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    size: ImageSize,
    quality: Quality,
    n: usize,
    response_format: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    data: Vec<GeneratedImage>,
}

impl GenerationResponse {
    fn into_assets(self) -> Vec<AssetRef> {
        self.data
            .into_iter()
            .filter_map(|img| img.url)
            .map(|url| AssetRef { url })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct GeneratedImage {
    #[serde(default)]
    url: Option<String>,
}
