use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use clutch_ride::blockchain::{BlockchainClient, EvmRideService};
use clutch_ride::config::{load_or_default, RideConfig};
use clutch_ride::observability::logging;
use clutch_ride::ride::{report, Command, Credential, GeoPoint, Severity, StdinPrompt};
use clutch_ride::storage::FileStore;
use clutch_ride::{Ledger, ProfileStore, RideWorkflow, SubmitOutcome};

#[derive(Parser)]
#[command(name = "ride-cli")]
#[command(about = "Request rides and inspect their on-chain history", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign and submit a ride request
    Request {
        /// Pickup as LAT,LNG
        #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
        pickup: GeoPoint,
        /// Dropoff as LAT,LNG
        #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
        dropoff: GeoPoint,
        #[arg(long)]
        fare: f64,
        /// Defaults to the saved profile
        #[arg(long)]
        public_key: Option<String>,
        /// Prompted for when neither given nor saved
        #[arg(long)]
        private_key: Option<String>,
    },
    /// Show the most recent ride requests, newest first
    History {
        /// Defaults to the saved profile
        #[arg(long)]
        public_key: Option<String>,
    },
    /// Manage the saved profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Save keys; without --remember any stored keys are forgotten
    Save {
        #[arg(long)]
        public_key: String,
        #[arg(long)]
        private_key: Option<String>,
        #[arg(long)]
        remember: bool,
    },
    /// Show the saved profile
    Show,
    /// Forget the saved profile
    Clear,
}

fn parse_point(value: &str) -> Result<GeoPoint, String> {
    let (lat, lng) = value
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LNG, got '{}'", value))?;
    let lat: f64 = lat.trim().parse().map_err(|e| format!("bad latitude: {}", e))?;
    let lng: f64 = lng.trim().parse().map_err(|e| format!("bad longitude: {}", e))?;
    let point = GeoPoint::new(lat, lng);
    if !point.is_valid() {
        return Err(format!("coordinates out of range: {}", value));
    }
    Ok(point)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_or_default(cli.config.as_deref())?;
    logging::init(&config.observability);

    let store = Arc::new(FileStore::open(&config.storage.path).await?);
    let profile = ProfileStore::with_config(store.clone(), &config.profile);
    let ledger = Arc::new(Ledger::with_config(store, &config.ledger));

    match cli.command {
        Commands::Request {
            pickup,
            dropoff,
            fare,
            public_key,
            private_key,
        } => {
            let credential = match public_key {
                Some(public_key) => Credential::new(public_key, private_key),
                None => {
                    let mut saved = profile
                        .load()
                        .await?
                        .ok_or("no public key given and no profile saved")?;
                    if private_key.is_some() {
                        saved.private_key = private_key;
                    }
                    saved
                }
            };
            request_ride(&config, ledger, credential, pickup, dropoff, fare).await?;
        }
        Commands::History { public_key } => {
            let public_key = match public_key {
                Some(public_key) => public_key,
                None => {
                    profile
                        .load()
                        .await?
                        .ok_or("no public key given and no profile saved")?
                        .public_key
                }
            };
            print_history(&ledger, &public_key).await;
        }
        Commands::Profile { action } => match action {
            ProfileAction::Save {
                public_key,
                private_key,
                remember,
            } => {
                let credential = Credential::new(public_key, private_key);
                profile.save(&credential, remember).await?;
                println!("Profile saved for {}", credential.masked_public_key());
            }
            ProfileAction::Show => match profile.load().await? {
                Some(credential) => {
                    println!("Public Key:  {}", credential.masked_public_key());
                    let private = if credential.private_key().is_some() {
                        "••••••••••••••••••••"
                    } else {
                        "Not stored"
                    };
                    println!("Private Key: {}", private);
                }
                None => println!("No profile saved"),
            },
            ProfileAction::Clear => {
                profile.clear().await?;
                println!("Profile cleared");
            }
        },
    }

    Ok(())
}

async fn request_ride(
    config: &RideConfig,
    ledger: Arc<Ledger<Arc<FileStore>>>,
    credential: Credential,
    pickup: GeoPoint,
    dropoff: GeoPoint,
    fare: f64,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = BlockchainClient::new(config.blockchain.clone())?;
    if !client.is_healthy().await {
        tracing::warn!(rpc_url = %config.blockchain.rpc_url, "RPC endpoint unreachable");
    }
    if let Err(e) = client.verify_chain_id().await {
        tracing::warn!(error = %e, "Chain verification failed");
    }
    let service = EvmRideService::new(client)?;
    let workflow = RideWorkflow::new(service, ledger, StdinPrompt, config.workflow.clone());

    workflow.handle(Command::SetPickup(pickup)).await;
    workflow.handle(Command::SetDropoff(dropoff)).await;
    workflow.handle(Command::SetFare(fare)).await;
    let outcome = workflow.handle(Command::Submit(credential)).await;

    let status = workflow.status();
    let (severity, message) = report(&status);
    match severity {
        Severity::Error => eprintln!("error: {}", message),
        Severity::None => {}
        severity => println!("{}: {}", severity, message),
    }
    exit_status(outcome.as_ref(), message).map_err(Into::into)
}

/// Only an acknowledged submission exits successfully; a cancelled one does not.
fn exit_status(outcome: Option<&SubmitOutcome>, message: &str) -> Result<(), String> {
    match outcome {
        Some(SubmitOutcome::Succeeded(_)) => Ok(()),
        Some(SubmitOutcome::Skipped) => {
            Err("ride request incomplete: check coordinates, fare and public key".to_string())
        }
        Some(SubmitOutcome::Cancelled) => Err("signing cancelled".to_string()),
        Some(SubmitOutcome::Failed { .. }) => Err(message.to_string()),
        Some(other) => Err(format!("ride request {}", other.label())),
        None => Err("no submission made".to_string()),
    }
}

async fn print_history(ledger: &Ledger<Arc<FileStore>>, public_key: &str) {
    let records = ledger.read(public_key).await;
    if records.is_empty() {
        println!("No transactions");
        return;
    }

    for record in records {
        println!("{}  {}ms", record.kind, record.timestamp);
        println!("  Pickup:  {}", record.pickup);
        println!("  Dropoff: {}", record.dropoff);
        println!("  Fare:    {}", record.fare);
        println!("  Status:  {}", record.status);
        if let Some(tx_hash) = &record.tx_hash {
            println!("  Tx:      {}", tx_hash);
        }
        if let Some(error) = &record.error {
            println!("  Error:   {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clutch_ride::blockchain::ServiceError;
    use clutch_ride::ride::{RideRequest, TransactionRecord};

    fn request() -> RideRequest {
        RideRequest {
            pickup: GeoPoint::new(27.19, 56.38),
            dropoff: GeoPoint::new(27.20, 56.39),
            fare: 5.0,
            rider: "pk1".to_string(),
        }
    }

    #[test]
    fn test_parse_point() {
        assert_eq!(
            parse_point("27.19, -56.38").unwrap(),
            GeoPoint::new(27.19, -56.38)
        );
        assert!(parse_point("27.19").is_err());
        assert!(parse_point("NaN,1").is_err());
        assert!(parse_point("91,1").is_err());
    }

    #[test]
    fn test_only_success_exits_cleanly() {
        let record = TransactionRecord::success(&request(), "0xabcdef01...".to_string());
        assert!(exit_status(Some(&SubmitOutcome::Succeeded(record)), "").is_ok());

        let failed = SubmitOutcome::Failed {
            error: ServiceError::Submission("rejected".to_string()),
            record: TransactionRecord::failure(&request(), "rejected".to_string()),
        };
        assert_eq!(exit_status(Some(&failed), "rejected").unwrap_err(), "rejected");
        assert!(exit_status(Some(&SubmitOutcome::Cancelled), "Signing cancelled").is_err());
        assert!(exit_status(Some(&SubmitOutcome::Skipped), "").is_err());
        assert!(exit_status(None, "").is_err());
    }
}
