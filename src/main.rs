use clap::Parser;
use folio::config::{self, Overrides};
use folio::content;
use folio::gui::app::AppModel;
use folio::sys::runtime;
use relm4::prelude::*;
use std::path::PathBuf;

/// Radial portfolio carousel.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Directory of case JSON files
    #[arg(long)]
    cases_dir: Option<PathBuf>,

    /// Config file to use instead of the per-user one
    #[arg(long)]
    config: Option<PathBuf>,

    /// Site that case pages are opened on
    #[arg(long)]
    site_url: Option<String>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config_path = match cli.config {
        Some(path) => path,
        None => config::get_config_path()?,
    };

    if !config_path.exists()
        && let Err(e) = config::write_default_config(&config_path)
    {
        log::warn!("Could not write default config to {}: {}", config_path.display(), e);
    }

    let overrides = Overrides {
        cases_dir: cli.cases_dir,
        site_url: cli.site_url,
    };
    let mut config = config::load_or_default(&config_path);
    overrides.apply(&mut config);

    let count = content::refresh_cache(&config.content.cases_dir, config.content.max_items);
    log::info!(
        "Loaded {} published cases from {}",
        count,
        config.content.cases_dir.display()
    );

    let (tx, rx) = async_channel::bounded(32);

    runtime::start_background_services(
        config_path.clone(),
        config.content.cases_dir.clone(),
        tx,
    );

    // clap owns the command line; keep gtk from parsing it again
    let app = RelmApp::new("space.bugrov.folio").with_args(Vec::new());

    app.run::<AppModel>((config, config_path, overrides, rx));
    Ok(())
}
