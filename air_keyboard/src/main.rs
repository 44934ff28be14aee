//! air_keyboard: interactive entry point.

use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use air_keyboard::app::{run, Mode};
use air_keyboard::config::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "air_keyboard", about = "Type by pointing at an on-screen keyboard with your index finger")]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Replay hand landmarks from a JSON-lines file instead of live input
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Run the replay without opening a window
    #[arg(long, requires = "replay")]
    headless: bool,

    /// Pause after each typed character, in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Read hands from a LeapMotion controller
    #[arg(long, conflicts_with = "replay")]
    leap: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("air_keyboard=info,keyboard_core=info")),
        )
        .init();

    let cli = Cli::parse();

    let mut cfg = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None       => AppConfig::default(),
    };
    if let Some(ms) = cli.delay_ms {
        cfg.press_delay_ms = ms;
    }

    let mode = match (cli.replay, cli.leap) {
        (Some(path), _) => Mode::Replay { path, headless: cli.headless },
        (None, true)    => leap_mode()?,
        (None, false)   => Mode::Simulation,
    };

    if !cli.headless {
        println!();
        println!("╔══════════════════════════════════════════════════════════════╗");
        println!("║          Air Keyboard: point, spread your fingers            ║");
        println!("╚══════════════════════════════════════════════════════════════╝");
        println!();
        match &mode {
            Mode::Simulation => println!("  Mode: Mouse simulation  (hold left button = open hand, Q quits)"),
            Mode::Replay { path, .. } => println!("  Mode: Replay of {}", path.display()),
            #[cfg(feature = "leap")]
            Mode::Leap => println!("  Mode: LeapMotion hardware"),
        }
        println!();
    }

    let typed = run(cfg, mode)?;
    info!("Final text: {}", typed);
    println!("{}", typed);
    Ok(())
}

#[cfg(feature = "leap")]
fn leap_mode() -> anyhow::Result<Mode> {
    Ok(Mode::Leap)
}

#[cfg(not(feature = "leap"))]
fn leap_mode() -> anyhow::Result<Mode> {
    anyhow::bail!("--leap needs a build with `--features leap`")
}
