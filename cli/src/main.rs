use std::io;

use clap::Parser;
use color_eyre::Result;
use engine::review::Outcome;
use log::debug;

mod cli;
mod prompt;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    _ = dotenvy::dotenv();
    pretty_env_logger::init();
    color_eyre::install()?;
    let pipeline = Cli::parse().into_pipeline();

    let query = prompt::read_book_query(&mut io::stdin().lock(), &mut io::stdout())?;

    match pipeline.run(&query, &mut io::stdout()).await? {
        Outcome::Saved(artifacts) => debug!("Run finished: {artifacts:?}"),
        Outcome::Failed(failure) => debug!("Run stopped early: {failure}"),
    }
    Ok(())
}
