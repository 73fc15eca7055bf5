//! `completions` command: shell scripts for the `stylecard` CLI.
//!
//! The script is rendered in memory first, then either printed or written
//! under the shell's conventional file name (`stylecard.bash`, `_stylecard`, ...).

use std::{
    fs,
    io::{self, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::CommandFactory;
use clap_complete::{Generator, Shell as Target, generate};
use tracing::debug;

use crate::cli::{AppContext, Cli, CompletionsArgs, Shell};

/// Binary name baked into generated scripts
const BIN_NAME: &str = "stylecard";

impl Shell {
    fn target(&self) -> Target {
        match self {
            Shell::Bash => Target::Bash,
            Shell::Zsh => Target::Zsh,
            Shell::Fish => Target::Fish,
            Shell::PowerShell => Target::PowerShell,
            Shell::Elvish => Target::Elvish,
        }
    }

    /// File name the shell expects for a completion script
    pub fn script_name(&self) -> String {
        self.target().file_name(BIN_NAME)
    }
}

/// Render the completion script for `shell`
pub fn script(shell: &Shell) -> Vec<u8> {
    let mut cmd = Cli::command();
    let mut buf = Vec::new();
    generate(shell.target(), &mut cmd, BIN_NAME, &mut buf);
    buf
}

/// Write the script into `dir`, creating it as needed; returns the file path
pub fn write_script(shell: &Shell, dir: PathBuf) -> Result<PathBuf> {
    fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let path = dir.join(shell.script_name());
    fs::write(&path, script(shell))
        .with_context(|| format!("Failed to write {}", path.display()))?;

    debug!(path = %path.display(), "wrote completion script");
    Ok(path)
}

pub fn run(args: CompletionsArgs, ctx: &AppContext) -> Result<()> {
    if args.stdout {
        let mut out = io::stdout().lock();
        out.write_all(&script(&args.shell))
            .context("Failed to write completion script")?;
        return Ok(());
    }

    let dir = args
        .out_dir
        .context("--out-dir is required unless --stdout is set")?;
    let path = write_script(&args.shell, dir)?;

    if !ctx.quiet {
        eprintln!("Wrote completion to {}", path.display());
    }
    Ok(())
}
