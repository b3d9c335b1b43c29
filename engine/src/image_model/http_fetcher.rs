use std::pin::Pin;

use bytes::Bytes;
use color_eyre::{Result, eyre::WrapErr};
use log::debug;
use reqwest::Client;

use super::{AssetRef, ImageFetcher};

/// Downloads generated images with a plain GET.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ImageFetcher for HttpFetcher {
    fn fetch<'a>(
        &'a self,
        asset: &'a AssetRef,
    ) -> Pin<Box<dyn Future<Output = Result<Bytes>> + Send + 'a>> {
        Box::pin(async move {
            let bytes = self
                .client
                .get(&asset.url)
                .send()
                .await
                .wrap_err("downloading image")?
                .error_for_status()?
                .bytes()
                .await?;
            debug!("Downloaded {} bytes from {}", bytes.len(), asset.url);
            Ok(bytes)
        })
    }
}
