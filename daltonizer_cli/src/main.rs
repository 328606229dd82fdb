use anyhow::{Context, Result, bail};
use clap::Parser;
use daltonizer::{
    BatchConfig, ConsoleProgress, DaltonizeConfig, Deficiency, SilentProgress, Strength,
    daltonize_directory,
};
use log::{error, info};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

/// Recolors every PNG under a directory for protanopia, deuteranopia or tritanopia.
///
/// Files are overwritten in place. Anything not given on the command line is
/// asked for interactively.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory to process recursively.
    path: Option<PathBuf>,

    /// Deficiency to correct for; only the first letter (P, D or T) matters.
    #[arg(short, long)]
    kind: Option<String>,

    /// Correction strength, 0-100 (100 = full strength).
    #[arg(short, long)]
    strength: Option<String>,

    /// Maximum number of files handled by one worker.
    #[arg(long, default_value_t = daltonizer::config::DEFAULT_GROUP_SIZE)]
    group_size: usize,

    /// Do not draw the progress bar.
    #[arg(short, long)]
    quiet: bool,
}

fn prompt(question: &str) -> Result<String> {
    let mut stdout = io::stdout().lock();
    write!(stdout, "{question}")?;
    stdout.flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn answer_or_prompt(value: Option<String>, question: &str) -> Result<String> {
    match value {
        Some(value) => Ok(value),
        None => prompt(question),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let kind = answer_or_prompt(args.kind, "Protanopia, Deuteranopia, or Tritanopia? ")?;
    let path = match args.path {
        Some(path) => path,
        None => PathBuf::from(prompt("Path to pictures: ")?),
    };
    let strength = answer_or_prompt(
        args.strength,
        "Strength of colour compensation(0-100, 100 = Full Strength): ",
    )?;

    // Both are validated before anything on disk is touched.
    let kind = Deficiency::parse(&kind)?;
    let strength = Strength::parse(&strength)?;
    let config = DaltonizeConfig::new(kind, strength);
    let batch = BatchConfig::default().with_group_size(args.group_size);
    let quiet = args.quiet;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(num_cpus::get().max(1))
        .enable_all()
        .build()
        .context("failed to start the tokio runtime")?;

    let report = runtime.block_on(async {
        if quiet {
            daltonize_directory(&path, config, batch, SilentProgress).await
        } else {
            daltonize_directory(&path, config, batch, ConsoleProgress::new()).await
        }
    })?;

    for (file, err) in report.failures() {
        error!("{}: {err}", file.display());
    }
    info!(
        "{} of {} files corrected in {}",
        report.transformed(),
        report.processed(),
        path.display()
    );

    if !report.is_success() {
        bail!("{} files could not be corrected", report.failed());
    }
    Ok(())
}
