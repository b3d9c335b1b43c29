use std::pin::Pin;

use bytes::Bytes;
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use strum::Display;

pub mod dall_e;
pub use dall_e::DallE;

pub mod http_fetcher;
pub use http_fetcher::HttpFetcher;

#[derive(
    Debug,
    Clone,
    Copy,
    Display,
    clap::ValueEnum,
    Serialize,
    Deserialize,
    Hash,
    PartialEq,
    Eq,
    Default,
)]
pub enum ImageSize {
    #[strum(to_string = "256x256")]
    #[serde(rename = "256x256")]
    #[value(name = "256x256")]
    Small,
    #[strum(to_string = "512x512")]
    #[serde(rename = "512x512")]
    #[value(name = "512x512")]
    Medium,
    #[default]
    #[strum(to_string = "1024x1024")]
    #[serde(rename = "1024x1024")]
    #[value(name = "1024x1024")]
    Large,
}

#[derive(Debug, Clone, Copy, Display, Serialize, Deserialize, Hash, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Quality {
    #[default]
    Standard,
    Hd,
}

#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub prompt: String,
    pub size: ImageSize,
    pub quality: Quality,
    pub n: usize,
}

/// A reference to a generated image that still has to be downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRef {
    pub url: String,
}

pub trait ImageGenerator {
    fn generate<'a>(
        &'a self,
        req: ImageRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<AssetRef>>> + Send + 'a>>;
}

pub trait ImageFetcher {
    fn fetch<'a>(
        &'a self,
        asset: &'a AssetRef,
    ) -> Pin<Box<dyn Future<Output = Result<Bytes>> + Send + 'a>>;
}
