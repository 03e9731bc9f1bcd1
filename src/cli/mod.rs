mod session;

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;

pub use session::*;

/// Tellerline - Interactive Bank Ledger
#[derive(Parser, Debug)]
#[command(name = "tellerline")]
#[command(about = "A menu-driven, in-memory bank ledger: open accounts, move money, review history")]
#[command(version)]
pub struct Cli {
    /// Enable verbose (debug) logging on stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// Reject a malformed initial deposit instead of falling back to 0
    #[arg(long)]
    pub strict_amounts: bool,

    /// Currency symbol printed in front of every amount
    #[arg(long, default_value = "$")]
    pub currency: String,
}

/// Settings that shape how a session talks to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub strict_amounts: bool,
    pub currency: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            strict_amounts: false,
            currency: "$".to_string(),
        }
    }
}

impl Cli {
    pub fn config(&self) -> SessionConfig {
        SessionConfig {
            strict_amounts: self.strict_amounts,
            currency: self.currency.clone(),
        }
    }

    /// Default log filter when `RUST_LOG` is not set.
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "warn" }
    }

    /// Run an interactive session on the process's stdin/stdout.
    ///
    /// Ctrl-C prints the interrupt notice and ends the process with status 0.
    pub fn run(self) -> Result<SessionOutcome> {
        let config = self.config();
        debug!(?config, "starting session");
        install_interrupt_handler()?;

        // stdout stays unlocked between writes so the Ctrl-C handler can print.
        let stdin = io::stdin();
        let mut session = Session::new(stdin.lock(), io::stdout(), config);
        let outcome = session.run().context("Interactive session failed")?;

        debug!(
            ?outcome,
            accounts = session.service().account_count(),
            "session finished"
        );
        Ok(outcome)
    }
}

fn install_interrupt_handler() -> Result<()> {
    ctrlc::set_handler(|| {
        debug!("interrupt signal received");
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "{}", INTERRUPTED_MESSAGE);
        let _ = stdout.flush();
        std::process::exit(0);
    })
    .context("Failed to install the Ctrl-C handler")
}
