// Karacfg CLI
// Compiles a rule script into the remapping host's configuration file

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;

use karacfg_core::{Compiler, Script};

/// Keyboard remapping config compiler
#[derive(Parser, Debug)]
#[command(name = "karacfg")]
#[command(version)]
#[command(about = "Compile a rule script into karabiner.json", long_about = None)]
struct Args {
    /// TOML rule script
    #[arg(value_name = "SCRIPT")]
    script: PathBuf,

    /// Output file (default: ~/.config/karabiner/karabiner.json)
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Overwrite the output without asking
    #[arg(short, long)]
    yes: bool,

    /// Validate and compile, but write nothing
    #[arg(long)]
    check: bool,

    /// Print the JSON instead of writing a file
    #[arg(long)]
    stdout: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn output_path(&self) -> Result<PathBuf> {
        match &self.output {
            Some(path) => Ok(path.clone()),
            None => default_output(),
        }
    }
}

fn default_output() -> Result<PathBuf> {
    let home = dirs::home_dir().context("cannot locate the home directory")?;
    Ok(home.join(".config").join("karabiner").join("karabiner.json"))
}

/// Ask on stdin; anything but y/yes declines
fn confirm_overwrite(path: &Path) -> Result<bool> {
    print!("{} exists. Overwrite? (y/N) ", path.display());
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run(args: &Args) -> Result<()> {
    let script = Script::from_toml_path(&args.script)
        .with_context(|| format!("failed to load {}", args.script.display()))?;
    let config = script.to_config()?;

    let mut compiler = Compiler::new();
    let output = compiler.compile(&config)?;
    let json = output.to_json_pretty()?;
    log::debug!("{} combos claimed", compiler.registry().len());

    if args.check {
        println!("{} is valid", args.script.display());
        return Ok(());
    }
    if args.stdout {
        println!("{}", json);
        return Ok(());
    }

    let path = args.output_path()?;
    if path.exists() && !args.yes && !confirm_overwrite(&path)? {
        log::warn!("not overwriting {}", path.display());
        bail!("aborted: {} left untouched", path.display());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;

    log::info!("wrote {}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    run(&args)
}
