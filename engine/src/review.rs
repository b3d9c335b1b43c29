use std::{
    io::{self, Write},
    path::PathBuf,
};

use color_eyre::Report;
use image::{DynamicImage, ImageError};
use log::{debug, error, info};
use thiserror::Error;

use crate::{
    ILLUSTRATION_PROMPT_CHARS, ImageFetchBox, ImageGenBox, REVIEW_MAX_TOKENS, TextGenBox,
    book::BookQuery,
    image_model::{ImageFetcher, ImageGenerator, ImageRequest, ImageSize, Quality},
    llm::{InputMessage, Request, TextGenerator},
    persist::{self, OutputArtifacts, PersistError},
};

pub const REVIEW_SYSTEM_PROMPT: &str = "You are a helpful assistant who can write in Korean.";
pub const ILLUSTRATION_INSTRUCTION: &str =
    "Create an artistic illustration based on the book review: ";

/// Generated review text. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review(String);

impl Review {
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            None
        } else {
            Some(Self(text))
        }
    }

    pub fn text(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone)]
pub struct Illustration(DynamicImage);

impl Illustration {
    pub fn new(image: DynamicImage) -> Self {
        Self(image)
    }

    pub fn image(&self) -> &DynamicImage {
        &self.0
    }
}

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("{0:#}")]
    Backend(Report),

    #[error("The model returned an empty review")]
    EmptyResponse,
}

#[derive(Debug, Error)]
pub enum IllustrationError {
    #[error("Image generation failed: {0:#}")]
    Generation(Report),

    #[error("The image backend returned no image")]
    NoAsset,

    #[error("Image download failed: {0:#}")]
    Fetch(Report),

    #[error("Couldn't decode the downloaded image")]
    Decode(#[source] ImageError),
}

/// Why a pipeline run stopped early.
#[derive(Debug, Error)]
pub enum Failure {
    #[error("Review stage failed: {0}")]
    Review(#[from] ReviewError),

    #[error("Illustration stage failed: {0}")]
    Illustration(#[from] IllustrationError),

    #[error("Saving failed: {0}")]
    Persistence(#[from] PersistError),
}

pub async fn acquire_review(
    llm: &dyn TextGenerator,
    query: &BookQuery,
) -> Result<Review, ReviewError> {
    let req = Request {
        system: Some(REVIEW_SYSTEM_PROMPT.into()),
        messages: vec![InputMessage::user(query.review_prompt())],
        max_tokens: REVIEW_MAX_TOKENS,
    };

    let result = match llm.generate(req).await {
        Ok(output) => {
            debug!(
                "Review used {} input and {} output tokens",
                output.input_tokens, output.output_tokens
            );
            Review::new(output.text).ok_or(ReviewError::EmptyResponse)
        }
        Err(e) => Err(ReviewError::Backend(e)),
    };

    if let Err(e) = &result {
        error!("Error while fetching book reviews and summaries: {e}");
    }
    result
}

/// The image prompt: a fixed instruction followed by at most
/// [`ILLUSTRATION_PROMPT_CHARS`] characters of the review.
pub fn illustration_prompt(review: &Review) -> String {
    let excerpt: String = review.text().chars().take(ILLUSTRATION_PROMPT_CHARS).collect();
    format!("{ILLUSTRATION_INSTRUCTION}{excerpt}")
}

pub async fn acquire_illustration(
    images: &dyn ImageGenerator,
    fetcher: &dyn ImageFetcher,
    review: &Review,
    size: ImageSize,
) -> Result<Illustration, IllustrationError> {
    let result = generate_and_fetch(images, fetcher, review, size).await;
    if let Err(e) = &result {
        error!("Error while generating image: {e}");
    }
    result
}

async fn generate_and_fetch(
    images: &dyn ImageGenerator,
    fetcher: &dyn ImageFetcher,
    review: &Review,
    size: ImageSize,
) -> Result<Illustration, IllustrationError> {
    let req = ImageRequest {
        prompt: illustration_prompt(review),
        size,
        quality: Quality::Standard,
        n: 1,
    };

    let assets = images
        .generate(req)
        .await
        .map_err(IllustrationError::Generation)?;
    let asset = assets.first().ok_or(IllustrationError::NoAsset)?;
    let bytes = fetcher
        .fetch(asset)
        .await
        .map_err(IllustrationError::Fetch)?;
    let image = image::load_from_memory(&bytes).map_err(IllustrationError::Decode)?;

    Ok(Illustration::new(image))
}

/// States of a single pipeline run. Each state owns what the previous stages
/// produced.
#[derive(Debug)]
pub enum Stage {
    AwaitingReview,
    AwaitingImage(Review),
    Persisting(Review, Illustration),
    Done(OutputArtifacts),
    Failed(Failure),
}

#[derive(Debug)]
pub enum Outcome {
    Saved(OutputArtifacts),
    Failed(Failure),
}

pub struct Pipeline {
    llm: TextGenBox,
    images: ImageGenBox,
    fetcher: ImageFetchBox,
    output_dir: PathBuf,
    image_size: ImageSize,
}

impl Pipeline {
    pub fn new(
        llm: TextGenBox,
        images: ImageGenBox,
        fetcher: ImageFetchBox,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            llm,
            images,
            fetcher,
            output_dir: output_dir.into(),
            image_size: ImageSize::default(),
        }
    }

    pub fn with_image_size(mut self, image_size: ImageSize) -> Self {
        self.image_size = image_size;
        self
    }

    /// Runs all stages in order, writing a status line to `out` after each
    /// one. Only errors writing to `out` are returned as `Err`.
    ///
    /// A title that can't name the output files fails the run before any
    /// backend is called.
    pub async fn run(&self, query: &BookQuery, out: &mut impl Write) -> io::Result<Outcome> {
        if let Err(e) = persist::output_paths(&self.output_dir, query.title()) {
            error!("Error while saving files: {e}");
            writeln!(out, "Failed to save files.")?;
            return Ok(Outcome::Failed(e.into()));
        }

        let mut stage = Stage::AwaitingReview;
        loop {
            stage = match self.advance(stage, query, out).await? {
                Stage::Done(artifacts) => return Ok(Outcome::Saved(artifacts)),
                Stage::Failed(failure) => return Ok(Outcome::Failed(failure)),
                next => next,
            };
        }
    }

    async fn advance(
        &self,
        stage: Stage,
        query: &BookQuery,
        out: &mut impl Write,
    ) -> io::Result<Stage> {
        debug!("Pipeline stage: {}", stage.name());
        let next = match stage {
            Stage::AwaitingReview => match acquire_review(self.llm.as_ref(), query).await {
                Ok(review) => {
                    writeln!(out, "Review generated successfully.")?;
                    Stage::AwaitingImage(review)
                }
                Err(e) => {
                    writeln!(out, "Failed to generate review.")?;
                    Stage::Failed(e.into())
                }
            },

            Stage::AwaitingImage(review) => {
                match acquire_illustration(
                    self.images.as_ref(),
                    self.fetcher.as_ref(),
                    &review,
                    self.image_size,
                )
                .await
                {
                    Ok(illustration) => {
                        writeln!(out, "Image generated successfully.")?;
                        Stage::Persisting(review, illustration)
                    }
                    Err(e) => {
                        writeln!(out, "Failed to generate image.")?;
                        Stage::Failed(e.into())
                    }
                }
            }

            Stage::Persisting(review, illustration) => {
                match persist::save(&self.output_dir, query.title(), &review, &illustration) {
                    Ok(artifacts) => {
                        writeln!(
                            out,
                            "Files saved: {} and {}",
                            artifacts.review_path.display(),
                            artifacts.illustration_path.display()
                        )?;
                        Stage::Done(artifacts)
                    }
                    Err(e) => {
                        error!("Error while saving files: {e}");
                        writeln!(out, "Failed to save files.")?;
                        Stage::Failed(e.into())
                    }
                }
            }

            terminal @ (Stage::Done(_) | Stage::Failed(_)) => terminal,
        };

        info!("Pipeline advanced to {}", next.name());
        Ok(next)
    }
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::AwaitingReview => "awaiting review",
            Stage::AwaitingImage(_) => "awaiting image",
            Stage::Persisting(..) => "persisting",
            Stage::Done(_) => "done",
            Stage::Failed(_) => "failed",
        }
    }
}
