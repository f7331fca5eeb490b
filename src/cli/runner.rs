//! CLI runner for interactive and single-prompt modes.

use crate::auth::CredentialStore;
use crate::cli::repl::Repl;
use crate::config::XdgDirs;
use crate::db::Database;
use crate::messaging::NoticeBus;

/// Generate code for one prompt, optionally run it, and exit.
///
/// Fails when no code came back so scripts can check the exit status.
pub async fn run_single_prompt(
    db: &Database,
    dirs: &XdgDirs,
    prompt: &str,
    model: Option<&str>,
    run: bool,
) -> anyhow::Result<()> {
    let bus = NoticeBus::new();
    let credentials = CredentialStore::open(db, bus.sender())?;
    let mut repl = Repl::open(db, &credentials, &bus, dirs)?;
    if let Some(model_name) = model {
        repl = repl.with_model(model_name);
    }

    let generated = repl.generate(prompt).await?;
    if generated.is_some() && run {
        repl.run_editor().await?;
    }
    repl.flush_notices();

    if generated.is_none() {
        anyhow::bail!("No response from the completion endpoint");
    }
    Ok(())
}

/// Run in interactive mode.
pub async fn run_interactive(
    db: &Database,
    dirs: &XdgDirs,
    model: Option<&str>,
) -> anyhow::Result<()> {
    print_banner();

    let bus = NoticeBus::new();
    let credentials = CredentialStore::open(db, bus.sender())?;
    let mut repl = Repl::open(db, &credentials, &bus, dirs)?;
    if let Some(model_name) = model {
        repl = repl.with_model(model_name);
    }
    if !credentials.exists() {
        bus.sender()
            .info("No API key stored yet. Add one with /key set");
    }

    repl.run().await
}

/// Print the welcome banner.
pub fn print_banner() {
    println!();
    println!("  \x1b[1;36m{{ codepad }}\x1b[0m  \x1b[2mv{}\x1b[0m", get_version());
    println!();
    println!("  \x1b[2mDescribe the code you want, then /run it.\x1b[0m");
    println!("  \x1b[2mType \x1b[0m\x1b[1;36m/help\x1b[0m\x1b[2m for commands.\x1b[0m");
    println!();
}

/// Get the application version string.
pub fn get_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Banner text without ANSI codes.
pub fn banner_text_lines() -> Vec<&'static str> {
    vec![
        "{ codepad }",
        "Describe the code you want, then /run it.",
        "/help",
    ]
}
