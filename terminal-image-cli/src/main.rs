// ABOUTME: Main entry point for the terminal-image command-line application
// ABOUTME: Loads configuration and the source image, then renders or animates it

use anyhow::{Context, Result};
use clap::Parser;
use terminal_image::terminal::is_interactive;
use terminal_image::{LogUpdateSink, render_animated_buffer, render_buffer};
use terminal_image_cli::cli::Cli;
use terminal_image_cli::cli_output::CliOutput;
use terminal_image_cli::config::Config;
use terminal_image_cli::source::load_source;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        CliOutput::new().report(&e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::load()?,
    };

    let options = cli.animation_options(&config);
    options.validate()?;
    log::debug!("Render options: {:?}", options);

    let bytes = load_source(&cli.source, config.max_download_size()).await?;

    if !cli.should_animate(&bytes, is_interactive()) {
        let rendered = render_buffer(&bytes, &options.render)
            .await
            .with_context(|| format!("Failed to render {}", cli.source))?;
        if !rendered.is_empty() {
            println!("{}", rendered);
        }
        return Ok(());
    }

    let mut handle = render_animated_buffer(&bytes, &options, LogUpdateSink::stdout())
        .with_context(|| format!("Failed to animate {}", cli.source))?;

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl-C")?;
            log::debug!("Ctrl-C received, stopping playback");
        }
        _ = handle.wait() => {}
    }

    handle.join().await;
    Ok(())
}
