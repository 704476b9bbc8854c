use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gridsketch::render::{render_to_text, CellScale};
use gridsketch::script::parse_script;
use gridsketch::{ChangeSet, Editor, EditorConfig};

/// Grid-snapped diagram editor driven by gesture scripts
#[derive(Parser, Debug)]
#[command(name = "gridsketch")]
#[command(version, about, long_about = None)]
struct Args {
    /// Gesture script to replay (reads stdin when omitted)
    #[arg(value_name = "SCRIPT")]
    script: Option<PathBuf>,

    /// Config file to use instead of the default location
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the grid spacing
    #[arg(long, value_name = "UNITS")]
    grid_size: Option<i32>,

    /// Override the number of undo steps kept
    #[arg(long, value_name = "STEPS")]
    max_history: Option<usize>,

    /// Print every change notification as a JSON line
    #[arg(long)]
    events: bool,

    /// Verify scene integrity after every command
    #[arg(long)]
    check: bool,
}

fn load_config(args: &Args) -> Result<EditorConfig> {
    let mut config = match &args.config {
        Some(path) => EditorConfig::load_from(path)?,
        None => EditorConfig::load(),
    };
    if let Some(grid_size) = args.grid_size {
        config.grid_size = grid_size;
    }
    if let Some(max_history) = args.max_history {
        config.max_history = max_history;
    }
    Ok(config.normalized())
}

fn read_script(args: &Args) -> Result<String> {
    match &args.script {
        Some(path) => fs::read_to_string(path).with_context(|| format!("reading script {}", path.display())),
        None => {
            let mut source = String::new();
            io::stdin().read_to_string(&mut source).context("reading script from stdin")?;
            Ok(source)
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let commands = parse_script(&read_script(&args)?)?;
    info!(commands = commands.len(), grid_size = config.grid_size, "replaying script");

    let mut editor = Editor::new(config);
    if args.events {
        editor.subscribe(|changes: &ChangeSet| match serde_json::to_string(changes) {
            Ok(line) => println!("{}", line),
            Err(e) => tracing::error!(error = %e, "failed to encode change notification"),
        });
    }

    for (line, command) in &commands {
        command.apply(&mut editor);
        if args.check {
            editor
                .scene()
                .validate()
                .with_context(|| format!("integrity check failed after line {}", line))?;
        }
    }

    let text = render_to_text(editor.scene(), CellScale::default());
    if !text.is_empty() {
        println!("{}", text);
    }
    match editor.status_message() {
        Some(status) => println!("[{}] {}", editor.mode_label(), status),
        None => println!("[{}]", editor.mode_label()),
    }

    Ok(())
}
