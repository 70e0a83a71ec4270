use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::info;

use eagleframe::config::StudioConfig;
use eagleframe::layout::LayoutOptions;
use eagleframe::session::{RenderOutcome, Studio};

/// Compose before/after photos into a bordered, labeled, branded PNG
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// The "before" image
    primary: PathBuf,

    /// The "after" image; selects the two-image layout
    #[arg(short, long)]
    secondary: Option<PathBuf>,

    /// Stack the two images top/bottom instead of left/right
    #[arg(long)]
    horizontal: bool,

    /// Leave out the BEFORE/AFTER plates
    #[arg(long)]
    no_labels: bool,

    /// JSON studio configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output PNG path (default: the configured output name)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write a wireframe of the layout as SVG
    #[arg(long)]
    layout_svg: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => StudioConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => StudioConfig::default(),
    };
    let studio = Studio::from_config(&config);

    let options = LayoutOptions {
        vertical_layout: !args.horizontal,
        show_labels: !args.no_labels,
    };
    studio.on_options_changed(options).await?;

    let primary = std::fs::read(&args.primary)
        .with_context(|| format!("Failed to read {}", args.primary.display()))?;
    let secondary = match &args.secondary {
        Some(path) => Some(
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?,
        ),
        None => None,
    };

    let outcome = studio
        .on_images_changed(Some(primary), secondary)
        .await
        .context("Failed to compose")?;
    let RenderOutcome::Rendered(size) = outcome else {
        bail!("nothing was rendered ({outcome:?})");
    };

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(studio.export_name()));
    let png = studio.request_export().context("Failed to encode PNG")?;
    std::fs::write(&output, &png)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!(
        "wrote {}x{} canvas to {}",
        size.width,
        size.height,
        output.display()
    );

    if let Some(path) = &args.layout_svg {
        let composition = studio
            .layout()
            .context("no images loaded")?
            .context("Failed to compute layout")?;
        std::fs::write(path, eagleframe::svg::render_layout_svg(&composition))
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("wrote layout wireframe to {}", path.display());
    }

    Ok(())
}
