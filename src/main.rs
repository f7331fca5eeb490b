//! Codepad - prompt for code, run it, chat about it.

use clap::Parser;
use codepad::cli::{run_interactive, run_single_prompt};
use codepad::{Database, XdgDirs};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Codepad - AI code generation with a built-in Python runner
#[derive(Parser, Debug)]
#[command(name = "codepad")]
#[command(version, about, long_about = None)]
struct Args {
    /// Generate code for a single prompt and exit
    #[arg(short, long)]
    prompt: Option<String>,

    /// Run the generated code (with --prompt)
    #[arg(long, requires = "prompt")]
    run: bool,

    /// Model to use for this session
    #[arg(short, long)]
    model: Option<String>,

    /// Database file (default: ~/.local/share/codepad/codepad.db)
    #[arg(long, env = "CODEPAD_DB")]
    db: Option<PathBuf>,

    /// Working directory (like git -C)
    #[arg(short = 'C', long, visible_alias = "directory")]
    cwd: Option<String>,

    /// Enable debug logging (equivalent to RUST_LOG=debug)
    #[arg(short = 'd', long)]
    debug: bool,

    /// Enable verbose logging (equivalent to RUST_LOG=trace)
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Change working directory if specified (do this early)
    if let Some(cwd) = &args.cwd {
        std::env::set_current_dir(cwd)?;
    }

    let default_filter = if args.verbose {
        "trace"
    } else if args.debug {
        "debug"
    } else {
        "warn"
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run(args))
}

async fn run(args: Args) -> anyhow::Result<()> {
    let (db, dirs) = match &args.db {
        Some(path) => {
            let root = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            (Database::open_at(path.clone())?, XdgDirs::rooted_at(root))
        }
        None => (Database::open()?, XdgDirs::new()),
    };
    db.migrate()?;
    dirs.ensure_dirs()?;
    tracing::debug!(db = %db.path().display(), "Database ready");

    match &args.prompt {
        Some(prompt) => {
            run_single_prompt(&db, &dirs, prompt, args.model.as_deref(), args.run).await
        }
        None => run_interactive(&db, &dirs, args.model.as_deref()).await,
    }
}
