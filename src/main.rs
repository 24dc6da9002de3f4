use std::{env, fs, fs::File, io, path::PathBuf, sync::Arc};

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use funds_engine::dlq::TracingDLQ;
use funds_engine::domain::money::parse_amount;
use funds_engine::domain::{
    AccountId, AchTransferRequest, EntryStatus, InboundReport, LedgerStore, TransferRequest,
    UserId,
};
use funds_engine::ingestion::{CsvAccountReader, seed_ledger};
use funds_engine::{AccountLocks, AchProcessor, Config, Engine, InMemoryLedger};

const USAGE: &str = "usage: funds_engine [--config <config.json>] <accounts.csv> <command>
commands:
  inbound <ach_file.json>
  outbound <ach_requests.json>
  transfer <from_account_id> <to_account_id> <amount> [description]";

enum Command {
    Inbound(PathBuf),
    Outbound(PathBuf),
    Transfer(TransferRequest),
}

struct Args {
    config: Option<PathBuf>,
    accounts: PathBuf,
    command: Command,
}

/// One entry of the outbound requests file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OutboundRequest {
    user_id: UserId,
    #[serde(flatten)]
    request: AchTransferRequest,
}

fn usage(problem: &str) -> Box<dyn std::error::Error> {
    format!("{}\n{}", problem, USAGE).into()
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args, Box<dyn std::error::Error>> {
    let mut first = args.next().ok_or_else(|| usage("missing arguments"))?;
    let mut config = None;
    if first == "--config" {
        config = Some(PathBuf::from(
            args.next().ok_or_else(|| usage("--config needs a path"))?,
        ));
        first = args.next().ok_or_else(|| usage("missing accounts file"))?;
    }
    let accounts = PathBuf::from(first);

    let command = match args.next().as_deref() {
        Some("inbound") => Command::Inbound(PathBuf::from(
            args.next().ok_or_else(|| usage("inbound needs a file"))?,
        )),
        Some("outbound") => Command::Outbound(PathBuf::from(
            args.next().ok_or_else(|| usage("outbound needs a file"))?,
        )),
        Some("transfer") => {
            let from: AccountId = args
                .next()
                .ok_or_else(|| usage("transfer needs a source account"))?
                .parse()?;
            let to: AccountId = args
                .next()
                .ok_or_else(|| usage("transfer needs a destination account"))?
                .parse()?;
            let raw_amount = args.next().ok_or_else(|| usage("transfer needs an amount"))?;
            let amount: Decimal = parse_amount(&raw_amount)
                .ok_or_else(|| usage(&format!("invalid amount: {}", raw_amount)))?;
            let description = args.next().unwrap_or_else(|| "Transfer".to_string());
            Command::Transfer(TransferRequest::new(from, to, amount, description))
        }
        Some(other) => return Err(usage(&format!("unknown command: {}", other))),
        None => return Err(usage("missing command")),
    };

    Ok(Args {
        config,
        accounts,
        command,
    })
}

async fn print_balances<S: LedgerStore>(
    store: &S,
    ids: &[AccountId],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record(["account", "number", "balance", "available"])?;
    for id in ids {
        if let Some(account) = store.get_account(*id).await? {
            writer.write_record([
                account.id.to_string(),
                account.masked_number(),
                format!("{:.2}", account.balance),
                format!("{:.2}", account.available),
            ])?;
        }
    }
    writer.flush()?;
    Ok(())
}

fn print_report(report: &InboundReport) -> Result<(), Box<dyn std::error::Error>> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record(["id", "status", "message"])?;
    for entry in &report.entries {
        let status = match entry.status {
            EntryStatus::Processed => "processed",
            EntryStatus::Failed => "failed",
        };
        writer.write_record([
            entry.id.as_str(),
            status,
            entry.message.as_deref().unwrap_or(""),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[tokio::main] // using Tokio runtime for async
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let args = parse_args(env::args().skip(1))?;
    let config = match &args.config {
        Some(path) => Config::from_path(path)?,
        None => Config::default(),
    };

    // Set up the components
    let store = Arc::new(InMemoryLedger::new());
    let seeded = seed_ledger(
        store.as_ref(),
        CsvAccountReader::new(File::open(&args.accounts)?).accounts(),
    )
    .await?;
    let ids: Vec<AccountId> = seeded.iter().map(|account| account.id).collect();

    let locks = AccountLocks::new();
    let engine = Engine::new(store.clone(), config.fraud, locks.clone());
    let ach = AchProcessor::new(store.clone(), locks, TracingDLQ::default(), config.originator);

    match args.command {
        Command::Inbound(path) => {
            let report = ach.process_inbound_file(&fs::read_to_string(path)?).await;
            if !report.success {
                return Err(report.message.unwrap_or_default().into());
            }
            print_report(&report)?;
            print_balances(store.as_ref(), &ids).await?;
        }
        Command::Outbound(path) => {
            let requests: Vec<OutboundRequest> =
                serde_json::from_reader(io::BufReader::new(File::open(path)?))?;
            let mut files = Vec::with_capacity(requests.len());
            for OutboundRequest { user_id, request } in requests {
                let originated = ach
                    .originate(user_id, request)
                    .await
                    .map_err(|rejection| rejection.to_string())?;
                files.push(originated);
            }
            println!("{}", serde_json::to_string_pretty(&files)?);
        }
        Command::Transfer(request) => {
            let outcome = engine.transfer(request).await;
            let body = match &outcome {
                Ok(committed) => json!({
                    "success": true,
                    "transfer": committed.transfer,
                    "transactions": {
                        "withdrawal": committed.withdrawal,
                        "deposit": committed.deposit,
                    },
                }),
                Err(rejection) => json!({
                    "success": false,
                    "message": rejection.to_string(),
                }),
            };
            println!("{}", serde_json::to_string_pretty(&body)?);
            print_balances(store.as_ref(), &ids).await?;
            outcome.map_err(|rejection| rejection.to_string())?;
        }
    }

    Ok(())
}
