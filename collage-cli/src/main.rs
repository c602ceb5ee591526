//! # Collage
//!
//! Command-line collage composer.

use clap::Parser;
use collage_cli::{compose, layout_listing, preset_listing, CliArgs, Command, ComposeConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "collage_cli=info,collage_export=info,collage_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    match args.command {
        Command::Presets => print!("{}", preset_listing()),
        Command::Layouts => print!("{}", layout_listing()),
        Command::Compose(args) => {
            let config = ComposeConfig::from(args);
            tracing::info!(
                "Canvas {}, {} photos, {} labels, output to {}",
                config.canvas,
                config.photos.len(),
                config.texts.len(),
                config.out_dir.display()
            );

            let report = compose(config).await?;
            println!("{}", report.saved.location);
        }
    }

    Ok(())
}
