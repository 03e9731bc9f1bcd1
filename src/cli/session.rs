use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::application::{AppError, BankService};
use crate::domain::{Cents, format_currency, parse_cents};

use super::SessionConfig;

const RULE: &str = "========================================";

/// Printed when the session ends without the user choosing "Exit".
pub const INTERRUPTED_MESSAGE: &str = "\n\nApplication interrupted.";

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The user picked "Exit".
    Exited,
    /// Input ran out (Ctrl-D, closed pipe) before the user exited.
    /// Ctrl-C is handled outside the loop, see [`crate::cli::Cli::run`].
    Interrupted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    CreateAccount,
    Deposit,
    Withdraw,
    CheckBalance,
    TransactionHistory,
    AllAccounts,
    Exit,
}

impl MenuChoice {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(MenuChoice::CreateAccount),
            "2" => Some(MenuChoice::Deposit),
            "3" => Some(MenuChoice::Withdraw),
            "4" => Some(MenuChoice::CheckBalance),
            "5" => Some(MenuChoice::TransactionHistory),
            "6" => Some(MenuChoice::AllAccounts),
            "7" => Some(MenuChoice::Exit),
            _ => None,
        }
    }
}

enum Flow {
    Continue,
    Exit,
}

/// The menu loop. Owns the bank and talks to the user over any line-oriented
/// reader and writer, so scripted input works the same as a terminal.
pub struct Session<R, W> {
    input: R,
    output: W,
    service: BankService,
    config: SessionConfig,
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(input: R, output: W, config: SessionConfig) -> Self {
        Self::with_service(input, output, BankService::new(), config)
    }

    pub fn with_service(
        input: R,
        output: W,
        service: BankService,
        config: SessionConfig,
    ) -> Self {
        Self {
            input,
            output,
            service,
            config,
        }
    }

    pub fn service(&self) -> &BankService {
        &self.service
    }

    pub fn into_service(self) -> BankService {
        self.service
    }

    /// Run the menu loop until the user exits or input runs out.
    ///
    /// Bad input never ends the loop. Only a failure to write to the output
    /// is returned as an error.
    pub fn run(&mut self) -> Result<SessionOutcome> {
        writeln!(self.output, "Welcome to Simple Banking App!")?;

        loop {
            self.display_menu()?;

            match self.step() {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit) => return Ok(SessionOutcome::Exited),
                Err(e) if is_interrupt(&e) => {
                    writeln!(self.output, "{}", INTERRUPTED_MESSAGE)?;
                    self.output.flush()?;
                    return Ok(SessionOutcome::Interrupted);
                }
                Err(e) => {
                    match e.downcast_ref::<AppError>() {
                        Some(app) if app.is_validation() => {
                            debug!(error = %e, "handler rejected input")
                        }
                        _ => warn!(error = %e, "handler failed"),
                    }
                    writeln!(self.output, "An error occurred: {}", e)?;
                }
            }
        }
    }

    fn step(&mut self) -> Result<Flow> {
        let choice = self.prompt("\nEnter your choice (1-7): ")?;
        let Some(choice) = MenuChoice::parse(&choice) else {
            debug!(input = %choice, "unrecognised menu choice");
            writeln!(
                self.output,
                "Invalid choice! Please enter a number between 1-7."
            )?;
            return Ok(Flow::Continue);
        };

        debug!(?choice, "dispatch");
        match choice {
            MenuChoice::CreateAccount => self.create_account()?,
            MenuChoice::Deposit => self.deposit_money()?,
            MenuChoice::Withdraw => self.withdraw_money()?,
            MenuChoice::CheckBalance => self.check_balance()?,
            MenuChoice::TransactionHistory => self.view_transaction_history()?,
            MenuChoice::AllAccounts => self.view_all_accounts()?,
            MenuChoice::Exit => {
                writeln!(self.output, "Thank you for using Simple Banking App!")?;
                self.output.flush()?;
                return Ok(Flow::Exit);
            }
        }
        Ok(Flow::Continue)
    }

    fn display_menu(&mut self) -> Result<()> {
        writeln!(self.output, "\n{}", RULE)?;
        writeln!(self.output, "        SIMPLE BANKING APPLICATION")?;
        writeln!(self.output, "{}", RULE)?;
        writeln!(self.output, "1. Create New Account")?;
        writeln!(self.output, "2. Deposit Money")?;
        writeln!(self.output, "3. Withdraw Money")?;
        writeln!(self.output, "4. Check Balance")?;
        writeln!(self.output, "5. View Transaction History")?;
        writeln!(self.output, "6. View All Accounts")?;
        writeln!(self.output, "7. Exit")?;
        writeln!(self.output, "{}", RULE)?;
        Ok(())
    }

    // ========================
    // Handlers
    // ========================

    fn create_account(&mut self) -> Result<()> {
        writeln!(self.output, "\n=== Create New Account ===")?;
        let name = self.prompt("Enter account holder name: ")?;
        if name.is_empty() {
            writeln!(self.output, "Name cannot be empty!")?;
            return Ok(());
        }

        let deposit_input = self.prompt("Enter initial deposit amount (default 0): ")?;
        let initial: Cents = if deposit_input.is_empty() {
            0
        } else {
            match parse_cents(&deposit_input) {
                Ok(cents) if cents < 0 => {
                    writeln!(self.output, "Initial deposit cannot be negative!")?;
                    return Ok(());
                }
                Ok(cents) => cents,
                Err(e) if self.config.strict_amounts => {
                    debug!(input = %deposit_input, error = %e, "malformed initial deposit, rejected");
                    writeln!(self.output, "Invalid amount!")?;
                    return Ok(());
                }
                Err(e) => {
                    debug!(input = %deposit_input, error = %e, "malformed initial deposit");
                    writeln!(self.output, "Invalid amount! Using default value 0.")?;
                    0
                }
            }
        };

        let account = self.service.open_account(&name, initial)?;
        let currency = &self.config.currency;
        writeln!(self.output, "\nAccount created successfully!")?;
        writeln!(self.output, "Account Number: {}", account.number())?;
        writeln!(self.output, "Account Holder: {}", account.holder_name())?;
        writeln!(
            self.output,
            "Initial Balance: {}",
            format_currency(account.balance(), currency)
        )?;
        Ok(())
    }

    fn deposit_money(&mut self) -> Result<()> {
        writeln!(self.output, "\n=== Deposit Money ===")?;
        let Some(number) = self.prompt_existing_account()? else {
            return Ok(());
        };
        let Some(amount) = self.prompt_amount("Enter deposit amount: ")? else {
            return Ok(());
        };

        match self.service.deposit(&number, amount) {
            Ok(balance) => {
                let currency = &self.config.currency;
                writeln!(
                    self.output,
                    "Successfully deposited {}",
                    format_currency(amount, currency)
                )?;
                writeln!(self.output, "New balance: {}", format_currency(balance, currency))?;
            }
            Err(AppError::InvalidAmount(_)) => {
                writeln!(self.output, "Invalid deposit amount!")?;
            }
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    fn withdraw_money(&mut self) -> Result<()> {
        writeln!(self.output, "\n=== Withdraw Money ===")?;
        let Some(number) = self.prompt_existing_account()? else {
            return Ok(());
        };
        let Some(amount) = self.prompt_amount("Enter withdrawal amount: ")? else {
            return Ok(());
        };

        match self.service.withdraw(&number, amount) {
            Ok(balance) => {
                let currency = &self.config.currency;
                writeln!(
                    self.output,
                    "Successfully withdrew {}",
                    format_currency(amount, currency)
                )?;
                writeln!(self.output, "New balance: {}", format_currency(balance, currency))?;
            }
            Err(AppError::InvalidAmount(_)) | Err(AppError::InsufficientFunds { .. }) => {
                writeln!(self.output, "Insufficient funds or invalid amount!")?;
            }
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    fn check_balance(&mut self) -> Result<()> {
        writeln!(self.output, "\n=== Check Balance ===")?;
        let Some(number) = self.prompt_existing_account()? else {
            return Ok(());
        };

        let account = self.service.account(&number)?;
        writeln!(self.output, "\n{}", account.summary(&self.config.currency))?;
        Ok(())
    }

    fn view_transaction_history(&mut self) -> Result<()> {
        writeln!(self.output, "\n=== Transaction History ===")?;
        let Some(number) = self.prompt_existing_account()? else {
            return Ok(());
        };

        let account = self.service.account(&number)?;
        let history = account.history();
        if history.is_empty() {
            writeln!(self.output, "No transactions found.")?;
            return Ok(());
        }

        let currency = &self.config.currency;
        writeln!(
            self.output,
            "\nTransaction History for {}:",
            account.holder_name()
        )?;
        for (i, tx) in history.iter().enumerate() {
            writeln!(
                self.output,
                "{}. {}: {} | Balance: {}",
                i + 1,
                tx.kind,
                format_currency(tx.amount_cents, currency),
                format_currency(tx.balance_after, currency)
            )?;
        }
        Ok(())
    }

    fn view_all_accounts(&mut self) -> Result<()> {
        writeln!(self.output, "\n=== All Accounts ===")?;
        if self.service.account_count() == 0 {
            writeln!(self.output, "No accounts found.")?;
            return Ok(());
        }

        let currency = &self.config.currency;
        for (i, account) in self.service.accounts().enumerate() {
            writeln!(
                self.output,
                "{}. {} - {} - Balance: {}",
                i + 1,
                account.holder_name(),
                account.number(),
                format_currency(account.balance(), currency)
            )?;
        }
        Ok(())
    }

    // ========================
    // Input helpers
    // ========================

    /// Ask for an account number. Prints the not-found message and yields
    /// `None` when no such account exists.
    fn prompt_existing_account(&mut self) -> Result<Option<String>> {
        let number = self.prompt("Enter account number: ")?;
        if self.service.account(&number).is_err() {
            debug!(account = %number, "account not found");
            writeln!(self.output, "Account not found!")?;
            return Ok(None);
        }
        Ok(Some(number))
    }

    /// Ask for an amount. The currency symbol ends the prompt.
    /// Prints "Invalid amount!" and yields `None` when the text does not parse.
    fn prompt_amount(&mut self, label: &str) -> Result<Option<Cents>> {
        let label = format!("{}{}", label, self.config.currency);
        let input = self.prompt(&label)?;
        match parse_cents(&input) {
            Ok(cents) => Ok(Some(cents)),
            Err(e) => {
                debug!(input = %input, error = %e, "unparsable amount");
                writeln!(self.output, "Invalid amount!")?;
                Ok(None)
            }
        }
    }

    /// Print `label` and read one trimmed line.
    /// End of input becomes [`AppError::Interrupted`].
    fn prompt(&mut self, label: &str) -> Result<String> {
        write!(self.output, "{}", label)?;
        self.output.flush()?;

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => Err(AppError::Interrupted.into()),
            Ok(_) => Ok(line.trim().to_string()),
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                Err(e).context("Input was not valid UTF-8")
            }
            Err(e) => {
                warn!(error = %e, "failed to read input");
                Err(AppError::Interrupted.into())
            }
        }
    }
}

fn is_interrupt(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<AppError>(), Some(AppError::Interrupted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Ledger;

    const ALICE: &str = "1000000001";

    fn run_script(
        script: &str,
        service: BankService,
        config: SessionConfig,
    ) -> (String, SessionOutcome, BankService) {
        let mut out = Vec::new();
        let mut session = Session::with_service(script.as_bytes(), &mut out, service, config);
        let outcome = session.run().unwrap();
        let service = session.into_service();
        (String::from_utf8(out).unwrap(), outcome, service)
    }

    fn alice_bank(balance: Cents) -> BankService {
        let mut ledger = Ledger::new();
        ledger
            .open_account_with("Alice", balance, || ALICE.to_string())
            .unwrap();
        BankService::with_ledger(ledger)
    }

    #[test]
    fn test_menu_choice_parse() {
        assert_eq!(MenuChoice::parse("1"), Some(MenuChoice::CreateAccount));
        assert_eq!(MenuChoice::parse(" 7 "), Some(MenuChoice::Exit));
        assert_eq!(MenuChoice::parse("8"), None);
        assert_eq!(MenuChoice::parse("exit"), None);
        assert_eq!(MenuChoice::parse(""), None);
    }

    #[test]
    fn test_exit_prints_farewell() {
        let (out, outcome, _) = run_script("7\n", BankService::new(), SessionConfig::default());
        assert_eq!(outcome, SessionOutcome::Exited);
        assert!(out.starts_with("Welcome to Simple Banking App!\n"));
        assert!(out.contains("        SIMPLE BANKING APPLICATION\n"));
        assert!(out.ends_with("Thank you for using Simple Banking App!\n"));
    }

    #[test]
    fn test_end_of_input_interrupts() {
        let (out, outcome, _) = run_script("", BankService::new(), SessionConfig::default());
        assert_eq!(outcome, SessionOutcome::Interrupted);
        assert!(out.ends_with("\n\nApplication interrupted.\n"));
    }

    #[test]
    fn test_end_of_input_inside_handler_interrupts() {
        let (out, outcome, service) =
            run_script("1\nCarol\n", BankService::new(), SessionConfig::default());
        assert_eq!(outcome, SessionOutcome::Interrupted);
        assert!(out.contains("Application interrupted."));
        assert_eq!(service.account_count(), 0);
    }

    #[test]
    fn test_invalid_choice_keeps_looping() {
        let (out, outcome, _) =
            run_script("9\nhello\n7\n", BankService::new(), SessionConfig::default());
        assert_eq!(outcome, SessionOutcome::Exited);
        assert_eq!(
            out.matches("Invalid choice! Please enter a number between 1-7.")
                .count(),
            2
        );
        assert_eq!(out.matches("1. Create New Account").count(), 3);
    }

    #[test]
    fn test_create_account() {
        let (out, _, service) = run_script(
            "1\n  Carol  \n25.5\n7\n",
            BankService::new(),
            SessionConfig::default(),
        );

        assert!(out.contains("\nAccount created successfully!\n"));
        assert!(out.contains("Account Holder: Carol\n"));
        assert!(out.contains("Initial Balance: $25.50\n"));

        let account = service.accounts().next().unwrap();
        assert_eq!(account.balance(), 2550);
        assert!(out.contains(&format!("Account Number: {}\n", account.number())));
    }

    #[test]
    fn test_create_account_empty_name() {
        let (out, _, service) =
            run_script("1\n   \n7\n", BankService::new(), SessionConfig::default());
        assert!(out.contains("Name cannot be empty!"));
        assert!(!out.contains("Enter initial deposit amount"));
        assert_eq!(service.account_count(), 0);
    }

    #[test]
    fn test_create_account_negative_deposit() {
        let (out, _, service) =
            run_script("1\nDan\n-5\n7\n", BankService::new(), SessionConfig::default());
        assert!(out.contains("Initial deposit cannot be negative!"));
        assert_eq!(service.account_count(), 0);
    }

    #[test]
    fn test_create_account_malformed_deposit_defaults_to_zero() {
        let (out, _, service) =
            run_script("1\nEve\nlots\n7\n", BankService::new(), SessionConfig::default());
        assert!(out.contains("Invalid amount! Using default value 0."));
        assert!(out.contains("Initial Balance: $0.00"));
        assert_eq!(service.accounts().next().unwrap().balance(), 0);
    }

    #[test]
    fn test_create_account_malformed_deposit_strict() {
        let config = SessionConfig {
            strict_amounts: true,
            ..SessionConfig::default()
        };
        let (out, _, service) = run_script("1\nEve\nlots\n7\n", BankService::new(), config);
        assert!(out.contains("Invalid amount!\n"));
        assert!(!out.contains("Account created successfully!"));
        assert_eq!(service.account_count(), 0);
    }

    #[test]
    fn test_deposit_unknown_account_skips_amount_prompt() {
        let (out, outcome, _) =
            run_script("2\n0000000000\n7\n", alice_bank(0), SessionConfig::default());
        assert_eq!(outcome, SessionOutcome::Exited);
        assert!(out.contains("Account not found!"));
        assert!(!out.contains("Enter deposit amount"));
    }

    #[test]
    fn test_deposit_and_withdraw_messages() {
        let script = format!("2\n{ALICE}\n50\n3\n{ALICE}\n30.00\n7\n");
        let (out, _, service) = run_script(&script, alice_bank(10000), SessionConfig::default());

        assert!(out.contains("Enter deposit amount: $"));
        assert!(out.contains("Successfully deposited $50.00\nNew balance: $150.00\n"));
        assert!(out.contains("Enter withdrawal amount: $"));
        assert!(out.contains("Successfully withdrew $30.00\nNew balance: $120.00\n"));
        assert_eq!(service.account(ALICE).unwrap().balance(), 12000);
    }

    #[test]
    fn test_deposit_rejections() {
        let script = format!("2\n{ALICE}\n0\n2\n{ALICE}\nten\n7\n");
        let (out, _, service) = run_script(&script, alice_bank(0), SessionConfig::default());

        assert!(out.contains("Invalid deposit amount!"));
        assert!(out.contains("Invalid amount!"));
        assert!(service.account(ALICE).unwrap().history().is_empty());
    }

    #[test]
    fn test_amounts_accept_plus_sign_and_round_sub_cents() {
        let script = format!("2\n{ALICE}\n+50\n2\n{ALICE}\n10.999\n3\n{ALICE}\n0.004\n7\n");
        let (out, _, service) = run_script(&script, alice_bank(0), SessionConfig::default());

        assert!(out.contains("Successfully deposited $50.00\nNew balance: $50.00\n"));
        assert!(out.contains("Successfully deposited $11.00\nNew balance: $61.00\n"));
        assert!(out.contains("Insufficient funds or invalid amount!"));

        let history = service.account(ALICE).unwrap().history();
        let amounts: Vec<Cents> = history.iter().map(|t| t.amount_cents).collect();
        assert_eq!(amounts, vec![5000, 1100]);
        assert_eq!(service.account(ALICE).unwrap().balance(), 6100);
    }

    #[test]
    fn test_withdraw_rejections_share_one_message() {
        let script = format!("3\n{ALICE}\n10\n3\n{ALICE}\n-1\n7\n");
        let (out, _, service) = run_script(&script, alice_bank(500), SessionConfig::default());

        assert_eq!(out.matches("Insufficient funds or invalid amount!").count(), 2);
        assert_eq!(service.account(ALICE).unwrap().balance(), 500);
    }

    #[test]
    fn test_check_balance() {
        let script = format!("4\n{ALICE}\n4\nnope\n7\n");
        let (out, _, _) = run_script(&script, alice_bank(4200), SessionConfig::default());

        assert!(out.contains(
            "\n=== Account Information ===\n\
             Account Holder: Alice\n\
             Account Number: 1000000001\n\
             Current Balance: $42.00\n\
             Opened: "
        ));
        assert!(!out.contains("Last activity:"));
        assert_eq!(out.matches("Account not found!").count(), 1);
    }

    #[test]
    fn test_check_balance_after_deposit_shows_last_activity() {
        let script = format!("2\n{ALICE}\n5\n4\n{ALICE}\n7\n");
        let (out, _, service) = run_script(&script, alice_bank(0), SessionConfig::default());

        let account = service.account(ALICE).unwrap();
        let stamp = account.history()[0].timestamp.format("%Y-%m-%d %H:%M:%S UTC");
        assert!(out.contains("Current Balance: $5.00\nOpened: "));
        assert!(out.contains(&format!("\nLast activity: {stamp}\n")));
    }

    #[test]
    fn test_history_listing() {
        let script = format!("5\n{ALICE}\n2\n{ALICE}\n50\n3\n{ALICE}\n30\n5\n{ALICE}\n7\n");
        let (out, _, _) = run_script(&script, alice_bank(10000), SessionConfig::default());

        assert!(out.contains("No transactions found."));
        assert!(out.contains(
            "\nTransaction History for Alice:\n\
             1. DEPOSIT: $50.00 | Balance: $150.00\n\
             2. WITHDRAWAL: $30.00 | Balance: $120.00\n"
        ));
    }

    #[test]
    fn test_all_accounts_listing() {
        let (out, _, _) = run_script("6\n7\n", BankService::new(), SessionConfig::default());
        assert!(out.contains("=== All Accounts ===\nNo accounts found."));

        let mut ledger = Ledger::new();
        ledger
            .open_account_with("Alice", 10000, || "1111111111".to_string())
            .unwrap();
        ledger
            .open_account_with("Bob", 0, || "2222222222".to_string())
            .unwrap();
        let (out, _, _) = run_script(
            "6\n7\n",
            BankService::with_ledger(ledger),
            SessionConfig::default(),
        );
        assert!(out.contains(
            "1. Alice - 1111111111 - Balance: $100.00\n\
             2. Bob - 2222222222 - Balance: $0.00\n"
        ));
    }

    #[test]
    fn test_custom_currency() {
        let config = SessionConfig {
            currency: "€".to_string(),
            ..SessionConfig::default()
        };
        let script = format!("2\n{ALICE}\n5\n7\n");
        let (out, _, _) = run_script(&script, alice_bank(0), config);

        assert!(out.contains("Enter deposit amount: €"));
        assert!(out.contains("New balance: €5.00"));
    }

    #[test]
    fn test_invalid_utf8_is_reported_and_loop_continues() {
        let mut input = vec![0xff, 0xfe, b'\n'];
        input.extend_from_slice(b"7\n");
        let mut out = Vec::new();
        let mut session = Session::new(input.as_slice(), &mut out, SessionConfig::default());

        let outcome = session.run().unwrap();
        drop(session);

        let out = String::from_utf8(out).unwrap();
        assert_eq!(outcome, SessionOutcome::Exited);
        assert!(out.contains("An error occurred: Input was not valid UTF-8"));
    }
}
