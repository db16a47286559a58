//! Fetch example
//!
//! Downloads one URL with the yt-dlp/ffmpeg binaries found in PATH:
//! - Listing the selectable formats
//! - Creating a worker for a video or audio job
//! - Following progress and log events
//!
//! Usage:
//!
//! ```text
//! cargo run --example fetch -- <url> [format] [codec] [output-dir]
//! cargo run --example fetch -- https://www.youtube.com/watch?v=dQw4w9WgXcQ bestaudio
//! ```
//!
//! Set `RUST_LOG=media_dl=debug` for library logs.

use media_dl::{Config, DownloadWorker, Event, Job, MediaSource};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let mut args = std::env::args().skip(1);
    let Some(url) = args.next() else {
        eprintln!("usage: fetch <url> [format] [codec] [output-dir]");
        std::process::exit(2);
    };
    let format = args.next();
    let codec = args.next().unwrap_or_else(|| "Original".to_string());
    let output_dir = PathBuf::from(args.next().unwrap_or_else(|| "downloads".to_string()));
    std::fs::create_dir_all(&output_dir)?;

    let config = Config::default();

    // Without a format, show what is available and pick the audio-only option
    let format = match format {
        Some(format) => format,
        None => {
            let source = media_dl::CliMediaSource::from_config(&config.tools)
                .ok_or("yt-dlp not found in PATH")?;
            let info = source.extract_info(&url).await?;
            println!("{}", info.display_title());
            let options = info.format_options();
            for option in &options {
                println!("  {:<12} {}", option.selector, option.label);
            }
            media_dl::types::AUDIO_ONLY_FORMAT.to_string()
        }
    };

    let job = Job::new(url, output_dir, format, codec, true);
    let worker = DownloadWorker::with_default_tools(job, config)?;

    let mut events = worker.subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                Event::Log { message } => println!("{}", message),
                Event::Progress { percent } => println!("⬇ {}%", percent),
                Event::StateChanged { state } => println!("→ {:?}", state),
                Event::Finished { success, message } => {
                    println!("{} {}", if success { "✓" } else { "✗" }, message);
                }
            }
        }
    });

    let result = worker.start().join().await?;
    // The worker dropped its sender, so the printer drains and exits
    printer.await.ok();

    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}
