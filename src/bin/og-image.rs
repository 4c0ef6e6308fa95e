//! Build step: render `static/og-image.png`.

use std::path::PathBuf;

use clap::Parser;

use reagent_site::config::{load_config, SiteConfig};
use reagent_site::observability::logging;
use reagent_site::og;

#[derive(Parser)]
#[command(name = "og-image")]
#[command(about = "Render the Open Graph preview image", long_about = None)]
struct Cli {
    /// Project root that asset, font and output paths are relative to.
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// TOML configuration file; its [og_image] section overrides the defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output PNG path, overriding the configured one.
    #[arg(short, long)]
    output: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => SiteConfig::default(),
    };
    logging::init(&config.observability.log_level);

    if let Some(output) = cli.output {
        config.og_image.output_path = output;
    }

    let image = og::generate(&config.og_image, &cli.root)?;

    tracing::info!("OG image generated successfully at: {}", image.path.display());
    tracing::info!("Dimensions: {}x{}px", image.width, image.height);
    Ok(())
}
