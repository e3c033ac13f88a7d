//! Effort Grid - record trigram timings and show per-key effort
//!
//! `record` runs an interactive session, `show` analyses a record file,
//! `calibrate` estimates the ready sequence overhead and `init-config` writes
//! the default configuration.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use crossterm::{terminal::disable_raw_mode, tty::IsTty};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use effort_grid::{
    analysis::{estimate_bias, EffortMode, EffortReport, RecordReader},
    config::{config_path, Config},
    fingers::Hand,
    keyboard::{spawn_listener, ChannelSource},
    recording::{KeyboardCapture, RecordFile, Session, SessionSettings},
    report::SessionOutcome,
};

#[cfg(target_os = "linux")]
use effort_grid::keyboard::evdev_status;

/// measure typing effort per key from timed trigrams
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// config file to use instead of the default location
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// record trigram timings for every configured character
    Record {
        /// raw record file to write
        output: PathBuf,

        /// overwrite the output file if it exists
        #[arg(long)]
        force: bool,

        /// also write a JSON session summary here
        #[arg(long)]
        summary: Option<PathBuf>,
    },
    /// show per-character effort computed from a record file
    Show {
        /// raw record file to read
        record: PathBuf,

        /// how character efforts are derived from trigram timings
        #[arg(short = 't', long = "type", value_enum, default_value_t = EffortMode::Model)]
        mode: EffortMode,
    },
    /// estimate the time spent on the ready sequences of one hand
    Calibrate {
        #[arg(long, value_enum, default_value_t = Hand::Right)]
        hand: Hand,

        /// number of timed repetitions
        #[arg(short, long, default_value_t = 10)]
        repetitions: usize,
    },
    /// write the default configuration
    InitConfig {
        /// destination, defaults to the platform config location
        path: Option<PathBuf>,

        /// overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Record {
            output,
            force,
            summary,
        } => record(cli.config.as_deref(), &output, force, summary.as_deref()),
        Command::Show { record, mode } => show(cli.config.as_deref(), &record, mode),
        Command::Calibrate { hand, repetitions } => {
            calibrate(cli.config.as_deref(), hand, repetitions)
        }
        Command::InitConfig { path, force } => init_config(path, force),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::load().context("failed to load config")?,
    };
    Ok(config)
}

/// Live capture on stdin/stdout, fed by the configured listener
fn keyboard_capture(
    config: &Config,
) -> Result<KeyboardCapture<ChannelSource, io::StdinLock<'static>, io::Stdout>> {
    #[cfg(target_os = "linux")]
    log::info!("Evdev: {}", evdev_status());

    let source = spawn_listener(config.listener.backend, config.poll_interval())
        .context("failed to start keyboard listener")?;

    // Raw mode swallows Ctrl+C, but the confirmation prompt runs in cooked mode
    ctrlc::set_handler(|| {
        let _ = disable_raw_mode();
        std::process::exit(130);
    })
    .context("failed to install Ctrl+C handler")?;

    let stdin = io::stdin();
    let raw_mode = stdin.is_tty();
    Ok(KeyboardCapture::new(
        source,
        stdin.lock(),
        io::stdout(),
        config.ready.cancel_modifier,
        config.ready.cancel_key,
        config.ready.confirm_word.clone(),
    )
    .with_raw_mode(raw_mode))
}

fn record(
    config_file: Option<&Path>,
    output: &Path,
    force: bool,
    summary_path: Option<&Path>,
) -> Result<()> {
    let config = load_config(config_file)?;
    let map = config.hand_finger_map()?;
    let mut sink = RecordFile::create(output, force)?;
    let mut capture = keyboard_capture(&config)?;
    let mut rng = StdRng::from_entropy();

    let session = Session::new(SessionSettings::from_config(&config));
    let summary = session.run(&map, &mut rng, &mut capture, &mut sink, &mut io::stdout())?;

    let mut out = io::stdout();
    writeln!(out)?;
    match summary.outcome {
        SessionOutcome::Completed => writeln!(out, "Recording complete.")?,
        SessionOutcome::Cancelled => writeln!(out, "Recording stopped early.")?,
    }
    writeln!(
        out,
        "{} trigrams ({} timings) written to {} in {:.1} min.",
        summary.trigrams_recorded,
        summary.repetitions_recorded,
        sink.path().display(),
        summary.elapsed_minutes()
    )?;
    if !summary.skipped_chars.is_empty() {
        let skipped: String = summary.skipped_chars.iter().collect();
        writeln!(out, "Skipped characters without usable trigrams: {}", skipped)?;
    }

    if let Some(path) = summary_path {
        summary
            .export_json(path)
            .with_context(|| format!("failed to write summary {}", path.display()))?;
        writeln!(out, "Summary written to {}", path.display())?;
    }
    Ok(())
}

fn show(config_file: Option<&Path>, record: &Path, mode: EffortMode) -> Result<()> {
    let config = load_config(config_file)?;
    let map = config.hand_finger_map()?;
    let records = RecordReader::new(config.analysis.use_n_best).read(record)?;
    log::info!("Analysing {} trigrams with {} mode", records.len(), mode);

    let report = EffortReport::estimate(&records, &map, |hand| config.analysis.bias(hand), mode)?;
    report.write_to(&mut io::stdout())?;
    Ok(())
}

fn calibrate(config_file: Option<&Path>, hand: Hand, repetitions: usize) -> Result<()> {
    if repetitions == 0 {
        bail!("repetitions must be at least 1");
    }
    let config = load_config(config_file)?;
    let ready = config.ready.sequence(hand).to_string();
    let mut capture = keyboard_capture(&config)?;

    println!(
        "Type \"{}\" around itself {} times with your {} hand.",
        ready, repetitions, hand
    );
    match estimate_bias(&mut capture, hand, &ready, repetitions)? {
        Some(bias) => {
            println!("\nEstimated {} hand bias: {:.4} s", hand, bias);
            println!("Set `bias_{}` under [analysis] to apply it.", hand);
        }
        None => println!("\nNo captures finished, nothing to estimate."),
    }
    Ok(())
}

fn init_config(path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => config_path()?,
    };
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Config::default().save_to(&path)?;
    println!("Default configuration written to {}", path.display());
    Ok(())
}
