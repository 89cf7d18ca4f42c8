//! Media-List Player demo (mlp-demo) - Main entry point
//!
//! Builds a media list tree from the command line, plays it through a
//! simulated player and prints every list-player event until the list has
//! been played or Ctrl+C is pressed.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use mlp_common::events::{ListPlayerEvent, PlaybackMode};
use mlp_player::config::load_config;
use mlp_player::{Media, MediaList, MediaListPlayer, PlayerSettings, SimulatedPlayer};
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for mlp-demo
#[derive(Parser, Debug)]
#[command(name = "mlp-demo")]
#[command(about = "Play a media list tree through a simulated player")]
#[command(version)]
struct Args {
    /// Config file (overrides MLP_CONFIG and the per-user file)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Playback mode: default, loop or repeat (overrides config)
    #[arg(short, long)]
    mode: Option<PlaybackMode>,

    /// Simulated duration of every item, in milliseconds
    #[arg(long, default_value = "500", env = "MLP_ITEM_MS")]
    item_ms: u64,

    /// Stop after this many items (useful with loop or repeat)
    #[arg(long)]
    max_items: Option<usize>,

    /// Nest a child under a top-level item, as PARENT=CHILD
    #[arg(long = "sub", value_name = "PARENT=CHILD")]
    subs: Vec<String>,

    /// Top-level media resource locators, in play order
    #[arg(required = true)]
    mrls: Vec<String>,
}

/// Build the root list, attaching `--sub` children to their parents
fn build_list(mrls: &[String], subs: &[String]) -> Result<MediaList> {
    let mut children: Vec<(String, Vec<Media>)> =
        mrls.iter().map(|mrl| (mrl.clone(), Vec::new())).collect();

    for sub in subs {
        let (parent, child) = sub
            .split_once('=')
            .ok_or_else(|| anyhow!("--sub expects PARENT=CHILD, got '{}'", sub))?;
        let entry = children
            .iter_mut()
            .find(|(mrl, _)| mrl == parent)
            .ok_or_else(|| anyhow!("--sub parent '{}' is not a top-level item", parent))?;
        entry.1.push(Media::new(child));
    }

    Ok(MediaList::from_media(
        children
            .into_iter()
            .map(|(mrl, kids)| Media::with_subitems(mrl, kids)),
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref()).context("Failed to load configuration")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut settings = PlayerSettings::from(&config);
    if let Some(mode) = args.mode {
        settings.playback_mode = mode;
    }

    info!(
        "Starting mlp-demo: {} top-level items, mode={}, item duration {} ms",
        args.mrls.len(),
        settings.playback_mode,
        args.item_ms
    );

    let list = build_list(&args.mrls, &args.subs)?;
    let player = Arc::new(SimulatedPlayer::new(Duration::from_millis(args.item_ms)));

    let mlp = MediaListPlayer::with_settings(player, &settings)
        .context("Failed to create media list player")?;
    let mut rx = mlp.subscribe();

    mlp.set_media_list(list);
    mlp.play().context("Failed to start playback")?;

    let mut played = 0usize;
    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Ok(event) => {
                    println!("{}", describe(&event));
                    match event {
                        ListPlayerEvent::ListPlayed { .. } => break,
                        ListPlayerEvent::NextItemSet { .. } => {
                            played += 1;
                            if args.max_items.is_some_and(|max| played >= max) {
                                info!("Played {} items, stopping", played);
                                mlp.stop();
                                break;
                            }
                        }
                        ListPlayerEvent::Stopped { .. } => {}
                    }
                }
                Err(RecvError::Lagged(skipped)) => warn!("Missed {} events", skipped),
                Err(RecvError::Closed) => break,
            },
            result = signal::ctrl_c() => {
                result.context("Failed to listen for Ctrl+C")?;
                info!("Received Ctrl+C, stopping");
                mlp.stop();
                break;
            }
        }
    }

    mlp.release();
    info!("mlp-demo finished");
    Ok(())
}

fn describe(event: &ListPlayerEvent) -> String {
    match event {
        ListPlayerEvent::NextItemSet { mrl, path, .. } => {
            let path: Vec<String> = path.iter().map(|i| i.to_string()).collect();
            format!("next item  /{}  {}", path.join("/"), mrl)
        }
        other => other.event_type().to_lowercase(),
    }
}
