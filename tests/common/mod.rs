// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use tellerline::BankService;
use tellerline::cli::{Session, SessionConfig, SessionOutcome};
use tellerline::domain::{Cents, Ledger};

/// Transcript of a scripted session
pub struct Transcript {
    pub output: String,
    pub outcome: SessionOutcome,
    pub service: BankService,
}

/// Helper to open one account under a known number
pub fn service_with_account(number: &str, holder: &str, balance: Cents) -> Result<BankService> {
    let mut ledger = Ledger::new();
    ledger.open_account_with(holder, balance, || number.to_string())?;
    Ok(BankService::with_ledger(ledger))
}

/// Helper to feed `lines` to a session, one per prompt
pub fn run_session(lines: &[&str], service: BankService) -> Result<Transcript> {
    run_session_with(lines, service, SessionConfig::default())
}

pub fn run_session_with(
    lines: &[&str],
    service: BankService,
    config: SessionConfig,
) -> Result<Transcript> {
    let mut script = lines.join("\n");
    if !script.is_empty() {
        script.push('\n');
    }

    let mut output = Vec::new();
    let mut session = Session::with_service(script.as_bytes(), &mut output, service, config);
    let outcome = session.run()?;
    let service = session.into_service();

    Ok(Transcript {
        output: String::from_utf8(output)?,
        outcome,
        service,
    })
}
