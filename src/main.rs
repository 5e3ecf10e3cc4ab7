//! Ledgerbook main entry point

use anyhow::{anyhow, bail, Context};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use ledgerbook_client::SheetClient;
use ledgerbook_config::{Config, ConfigError};
use ledgerbook_core::reports::{SnapshotReport, StatementReport, StudentBalance, SubmitSummary};
use ledgerbook_core::{
    CoreError, EntryBatch, EntryRow, LedgerBook, Period, SignFilter, TimeRange, Transaction,
};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::runtime::Runtime;

#[derive(Parser, Debug)]
#[command(name = "ledgerbook")]
#[command(version = "0.1.0")]
#[command(about = "Student balances and batch entry for a spreadsheet-backed ledger", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Print reports as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Roster with lifetime balances
    Students,
    /// One student's transactions for a period
    Statement {
        /// Student id or `name|class`
        student: String,
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
        /// month, quarter, year or all
        #[arg(long)]
        period: Option<TimeRange>,
    },
    /// Transactions of every student between two dates
    Snapshot {
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: Option<NaiveDate>,
        /// credit, debit or all
        #[arg(long)]
        sign: Option<SignFilter>,
    },
    /// Like `snapshot`, computed by the service
    RemoteSnapshot {
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(long)]
        sign: Option<SignFilter>,
    },
    /// Record debits and credits for one date
    Add {
        #[arg(long)]
        date: String,
        /// `<student>=<debit>,<credit>`, repeatable
        #[arg(long = "row", required = true)]
        rows: Vec<String>,
    },
    /// Print the default configuration
    InitConfig,
}

fn main() -> ExitCode {
    match execute(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{}", describe_error(&error));
            ExitCode::FAILURE
        }
    }
}

/// Error text for the terminal, with code and suggestions when known
fn describe_error(error: &anyhow::Error) -> String {
    let details = if let Some(core) = error.downcast_ref::<CoreError>() {
        Some(core.to_details().to_string())
    } else {
        error
            .downcast_ref::<ConfigError>()
            .map(|config| config.to_details().to_string())
    };

    match details {
        Some(details) if error.chain().count() > 1 => format!("{}\n{}", error, details),
        Some(details) => details,
        None => format!("{:#}", error),
    }
}

fn execute(args: Args) -> anyhow::Result<()> {
    if let Command::InitConfig = args.command {
        print!("{}", Config::generate_default());
        return Ok(());
    }

    let config = Config::load(&args.config)
        .with_context(|| format!("failed to load configuration from {}", args.config.display()))?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();
    log::info!("Config loaded: endpoint={}", config.service.endpoint);

    let rt = Runtime::new()?;
    rt.block_on(run(args, config))
}

async fn run(args: Args, config: Config) -> anyhow::Result<()> {
    let client = SheetClient::new(&config.service).map_err(CoreError::from)?;
    let book = LedgerBook::new(config, Arc::new(client));
    let out = Output::new(&book, args.json);
    let today = chrono::Local::now().date_naive();

    match args.command {
        Command::Students => {
            book.load().await?;
            out.students(&book.roster_balances()?)
        }
        Command::Statement { student, from, to, period } => {
            book.load().await?;
            let student = book.find_student(&student)?;
            let range = period.unwrap_or(book.config().report.default_period);
            let report = book.statement(&student, Period::from_args(range, from, to), today)?;
            out.statement(&report)
        }
        Command::Snapshot { from, to, sign } => {
            book.reload().await?;
            let sign = sign.unwrap_or(book.config().report.default_sign);
            let rows = book.snapshot_of(Some(from), to, sign)?;
            out.snapshot(from, to, sign, &rows)
        }
        Command::RemoteSnapshot { from, to, sign } => {
            let sign = sign.unwrap_or(book.config().report.default_sign);
            let rows = book.remote_snapshot(Some(from), to, sign).await?;
            out.snapshot(from, to, sign, &rows)
        }
        Command::Add { date, rows } => {
            book.load_roster().await?;
            let rows = rows
                .iter()
                .map(|row| parse_row(&book, row))
                .collect::<anyhow::Result<Vec<_>>>()?;
            let batch = EntryBatch::build(&date, &rows)?;
            let report = book.submit_report(&batch).await?;
            out.submitted(&SubmitSummary::new(&batch.date().to_string(), &report))?;
            report.into_result()?;
            Ok(())
        }
        Command::InitConfig => Ok(()),
    }
}

/// Parse `<student>=<debit>,<credit>`; either amount may be left blank
fn parse_row(book: &LedgerBook, row: &str) -> anyhow::Result<EntryRow> {
    let (student, amounts) = row
        .rsplit_once('=')
        .ok_or_else(|| anyhow!("row '{}' is not <student>=<debit>,<credit>", row))?;
    let (debit, credit) = amounts.split_once(',').unwrap_or((amounts, ""));
    if credit.contains(',') {
        bail!("row '{}' has more than two amounts", row);
    }

    let student = book.find_student(student)?;
    Ok(EntryRow::new(student.reference(), debit.trim(), credit.trim()))
}

// ==================== Output ====================

struct Output {
    json: bool,
    symbol: String,
    places: usize,
}

impl Output {
    fn new(book: &LedgerBook, json: bool) -> Self {
        let currency = &book.config().currency;
        Self {
            json,
            symbol: currency.symbol.clone(),
            places: currency.decimal_places as usize,
        }
    }

    fn money(&self, amount: Decimal) -> String {
        let sign = if amount.is_sign_negative() && !amount.is_zero() { "-" } else { "" };
        format!("{}{}{:.*}", sign, self.symbol, self.places, amount.abs())
    }

    fn print_json<T: serde::Serialize>(&self, value: &T) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    fn students(&self, balances: &[StudentBalance]) -> anyhow::Result<()> {
        if self.json {
            return self.print_json(&balances);
        }
        for b in balances {
            println!(
                "{:<8} {:<24} {:<6} {:>14}",
                b.id.as_deref().unwrap_or("-"),
                b.name,
                b.class,
                self.money(b.balance)
            );
        }
        Ok(())
    }

    fn statement(&self, report: &StatementReport) -> anyhow::Result<()> {
        if self.json {
            return self.print_json(report);
        }
        println!("{} ({}) - {}", report.student.name, report.student.class, report.period);
        for row in &report.rows {
            println!(
                "{}  {:>12}  {:>12}",
                row.date,
                self.money(-row.debit),
                self.money(row.credit)
            );
        }
        println!("Range total:    {}", self.money(report.range_total));
        println!("Lifetime total: {}", self.money(report.lifetime_total()));
        if !report.daily.is_empty() {
            println!("Daily:");
            for day in &report.daily {
                println!("  {}  {:>12}", day.date, self.money(day.net));
            }
        }
        Ok(())
    }

    fn snapshot(
        &self,
        from: NaiveDate,
        to: Option<NaiveDate>,
        sign: SignFilter,
        rows: &[Transaction],
    ) -> anyhow::Result<()> {
        let to = to.unwrap_or(from);
        let report = SnapshotReport::new(&from.to_string(), &to.to_string(), &sign.to_string(), rows);
        if self.json {
            return self.print_json(&report);
        }
        println!("{} to {} ({})", report.from, report.to, report.sign);
        for row in &report.rows {
            println!("{}  {:<28} {:>12}", row.date, row.student, self.money(row.net));
        }
        println!(
            "Debits: {}  Credits: {}",
            self.money(report.total_debit),
            self.money(report.total_credit)
        );
        Ok(())
    }

    fn submitted(&self, summary: &SubmitSummary) -> anyhow::Result<()> {
        if self.json {
            return self.print_json(summary);
        }
        println!("{}: saved {} of {}", summary.date, summary.saved, summary.attempted);
        for row in &summary.failed_rows {
            println!(
                "  not saved: {}  debit {}  credit {}",
                row.student,
                self.money(row.debit),
                self.money(row.credit)
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse_add_rows() {
        let args = Args::try_parse_from([
            "ledgerbook", "add", "--date", "2024-03-01", "--row", "S1=10,", "--row", "Ravi|8C=,5",
        ])
        .unwrap();
        match args.command {
            Command::Add { date, rows } => {
                assert_eq!(date, "2024-03-01");
                assert_eq!(rows, vec!["S1=10,", "Ravi|8C=,5"]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_args_parse_snapshot() {
        let args = Args::try_parse_from([
            "ledgerbook", "--json", "snapshot", "--from", "2024-01-01", "--sign", "credit",
        ])
        .unwrap();
        assert!(args.json);
        match args.command {
            Command::Snapshot { from, to, sign } => {
                assert_eq!(from, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
                assert_eq!(to, None);
                assert_eq!(sign, Some(SignFilter::Credit));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_config_error_shows_suggestions() {
        let error = anyhow::Error::new(ConfigError::FileNotFound {
            path: "missing.yaml".to_string(),
        })
        .context("failed to load configuration from missing.yaml");
        let text = describe_error(&error);

        assert!(text.starts_with("failed to load configuration from missing.yaml"));
        assert!(text.contains("[FILE_NOT_FOUND]"));
        assert!(text.contains("ledgerbook init-config"));
    }

    #[test]
    fn test_core_error_shows_suggestions() {
        let error = anyhow::Error::new(CoreError::StudentNotFound {
            query: "Z".to_string(),
        });
        let text = describe_error(&error);

        assert!(text.starts_with("[STUDENT_NOT_FOUND] Student not found: Z"));
        assert!(text.contains("Suggestions:"));
        assert_eq!(describe_error(&anyhow!("plain failure")), "plain failure");
    }

    #[test]
    fn test_money_format() {
        let out = Output {
            json: false,
            symbol: "₹".to_string(),
            places: 2,
        };
        assert_eq!(out.money(Decimal::new(-5, 0)), "-₹5.00");
        assert_eq!(out.money(Decimal::new(1205, 1)), "₹120.50");
        assert_eq!(out.money(Decimal::ZERO), "₹0.00");
    }
}
