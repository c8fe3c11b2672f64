//! Headless replay entrypoint: feeds an authority transcript to one replica.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use inkframe::replay::{load_transcript, replay};
use inkframe::{FrameConfig, Reconciler};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "inkframe",
    about = "Replay authority messages through a text frame replica",
    version
)]
struct Cli {
    /// Newline-delimited JSON transcript of authority messages.
    transcript: PathBuf,

    #[arg(long, default_value = "doc")]
    doc: String,

    #[arg(long, default_value = "replica")]
    replica: String,

    /// Wrap width in columns (0 disables wrapping).
    #[arg(long, env = "INKFRAME_WRAP_COLUMNS")]
    wrap: Option<usize>,

    #[arg(long, env = "INKFRAME_TABSTOP")]
    tabstop: Option<usize>,

    /// Print the line list after the replay.
    #[arg(long)]
    dump: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inkframe=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().compact().with_target(false))
        .init();

    let cli = Cli::parse();
    let mut config = FrameConfig::from_env();
    if let Some(columns) = cli.wrap {
        config.wrap_columns = columns;
    }
    if let Some(tabstop) = cli.tabstop {
        config.tabstop = tabstop;
    }

    let messages = load_transcript(&cli.transcript)?;
    tracing::info!(
        count = messages.len(),
        path = %cli.transcript.display(),
        "replaying transcript"
    );

    let mut reconciler = Reconciler::from_config(cli.doc, cli.replica, &config);
    reconciler.connect();
    let report = replay(&mut reconciler, &messages);

    for msg in &report.sent {
        println!("{}", msg.encode()?);
    }
    for (index, outcome) in &report.outcomes {
        tracing::warn!(index, ?outcome, "message not applied");
    }
    if cli.dump {
        eprint!("{}", reconciler.frame().dump());
    }
    tracing::info!(version = report.version, state = ?report.state, "replay finished");
    print!("{}", report.text);
    Ok(())
}
