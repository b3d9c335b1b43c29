use std::path::PathBuf;

use engine::{
    image_model::{DallE, HttpFetcher, ImageSize, dall_e::DEFAULT_IMAGE_MODEL},
    llm::{OpenAIChat, open_ai_chat::DEFAULT_TEXT_MODEL},
    open_ai::DEFAULT_API_BASE,
    review::Pipeline,
};

/// Writes a review and a matching illustration for a book.
#[derive(Debug, clap::Parser)]
#[command(name = "auto_reviewer", version)]
pub struct Cli {
    /// OpenAI API key, used for both the text and the image model
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: String,

    #[arg(long, env = "OPENAI_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    #[arg(long, default_value = DEFAULT_TEXT_MODEL)]
    pub text_model: String,

    #[arg(long, default_value = DEFAULT_IMAGE_MODEL)]
    pub image_model: String,

    #[arg(long, value_enum, default_value_t)]
    pub image_size: ImageSize,

    /// Directory the review and illustration are written to
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,
}

impl Cli {
    pub fn into_pipeline(self) -> Pipeline {
        let Cli {
            openai_api_key,
            api_base,
            text_model,
            image_model,
            image_size,
            output_dir,
        } = self;

        Pipeline::new(
            Box::new(OpenAIChat::new(
                openai_api_key.clone(),
                api_base.clone(),
                text_model,
            )),
            Box::new(DallE::new(openai_api_key, api_base, image_model)),
            Box::new(HttpFetcher::new()),
            output_dir,
        )
        .with_image_size(image_size)
    }
}
