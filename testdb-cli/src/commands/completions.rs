//! Shell completion generation.

use crate::cli::Cli;
use crate::error::CliError;
use crate::utils::GlobalOptions;
use clap::{Args, CommandFactory};
use clap_complete::{generate, Shell};
use std::io;

const BIN_NAME: &str = "testdb";

/// Generate shell completion scripts.
#[derive(Args)]
pub struct CompletionsCommand {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsCommand {
    /// Write the script to stdout and installation hints to stderr.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        if !global.quiet {
            eprintln!("{}", install_hint(self.shell));
        }

        generate(self.shell, &mut Cli::command(), BIN_NAME, &mut io::stdout());
        Ok(())
    }
}

fn install_hint(shell: Shell) -> String {
    match shell {
        Shell::Bash => format!("# Add to ~/.bashrc:\n#   source <({BIN_NAME} completions bash)"),
        Shell::Zsh => format!(
            "# Save to a directory on $fpath:\n#   {BIN_NAME} completions zsh > ~/.zfunc/_{BIN_NAME}"
        ),
        Shell::Fish => format!(
            "# Save to the fish completions directory:\n#   {BIN_NAME} completions fish > ~/.config/fish/completions/{BIN_NAME}.fish"
        ),
        Shell::PowerShell => {
            format!("# Add to $PROFILE:\n#   {BIN_NAME} completions powershell | Out-String | Invoke-Expression")
        }
        _ => format!("# Completions for {shell}"),
    }
}
