use clap::Parser;
use color_eyre::{Result, eyre::eyre};
use image::ImageFormat;
use engine::image_model::{
    DallE, HttpFetcher, ImageFetcher, ImageGenerator, ImageRequest, ImageSize, Quality,
    dall_e::DEFAULT_IMAGE_MODEL,
};
use engine::open_ai::DEFAULT_API_BASE;

#[derive(clap::Parser)]
struct Arg {
    key: String,
    description: String,
    #[arg(long, default_value = DEFAULT_IMAGE_MODEL)]
    model: String,
    #[arg(long, value_enum, default_value_t)]
    size: ImageSize,
}

#[tokio::main]
async fn main() -> Result<()> {
    pretty_env_logger::init();
    color_eyre::install()?;
    let Arg {
        key,
        description,
        model,
        size,
    } = Arg::parse();
    let dall_e = DallE::new(key, DEFAULT_API_BASE, model);

    let assets = dall_e
        .generate(ImageRequest {
            prompt: description,
            size,
            quality: Quality::Standard,
            n: 1,
        })
        .await?;
    let asset = assets.first().ok_or_else(|| eyre!("No image returned"))?;
    println!("Asset URL: {}", asset.url);

    let bytes = HttpFetcher::new().fetch(asset).await?;
    let image = image::load_from_memory(&bytes)?;
    image.save_with_format("output.png", ImageFormat::Png)?;
    println!(
        "Saved {}x{} image from {} downloaded bytes",
        image.width(),
        image.height(),
        bytes.len()
    );

    Ok(())
}
