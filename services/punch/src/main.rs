use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use client::models::PunchDirection;
use client::{ClientConfig, HrApi, NominatimGeocoder, SessionClient};
use common::{FileStore, KeyValueStore, LocalState, SessionStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use punch::biometric::{FaceUnlock, FaceUnlockOutcome};
use punch::config::DeviceConfig;
use punch::devices::{DeniedBiometrics, FileCamera, FixedLocator};
use punch::locator::BoundedLocator;
use punch::orchestrator::{STATUS_FALLBACK, SUBMIT_FALLBACK, USER_FALLBACK};
use punch::timer::SystemClock;
use punch::{Devices, PunchError, PunchOrchestrator};

#[derive(Parser)]
#[command(name = "punch")]
#[command(about = "HRMS attendance punch client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and remember the session
    Login { email: String, password: String },
    /// Forget the remembered session
    Logout,
    /// Show whether you are punched in
    Status,
    /// Punch in with the configured photo and position
    In,
    /// Punch out with the configured photo and position
    Out,
    /// Print the elapsed time every second until Ctrl-C
    Watch,
    /// Enroll or verify face unlock
    Face,
}

impl Commands {
    fn direction(&self) -> Option<PunchDirection> {
        match self {
            Commands::In => Some(PunchDirection::In),
            Commands::Out => Some(PunchDirection::Out),
            _ => None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr, command output to stdout
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    let client_config = ClientConfig::from_env()?;
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&client_config.store_path).await?);
    let local = LocalState::new(Arc::clone(&store));
    let client = SessionClient::new(&client_config, SessionStore::new(store))?;
    let api = Arc::new(HrApi::new(client));

    match cli.command {
        Commands::Login { email, password } => {
            let session = api.login(&email, &password).await?;
            println!("Signed in as {}", session.email);
        }
        Commands::Logout => {
            api.logout().await?;
            println!("Signed out");
        }
        Commands::Face => {
            let unlock = FaceUnlock::new(DeniedBiometrics, local);
            match unlock.authenticate().await? {
                FaceUnlockOutcome::Enrolled => println!("Face enrollment completed."),
                FaceUnlockOutcome::Verified => println!("Face authentication successful."),
            }
        }
        command @ (Commands::Status | Commands::In | Commands::Out | Commands::Watch) => {
            if !api.has_session().await? {
                bail!("Not signed in; run `punch login <email> <password>` first");
            }

            let device_config = DeviceConfig::from_env()?;
            let devices = Devices {
                camera: Arc::new(FileCamera::new(&device_config.photo_path)),
                locator: Arc::new(BoundedLocator::new(FixedLocator::new(
                    device_config.coordinates(),
                ))),
                geocoder: Arc::new(NominatimGeocoder::new(&client_config)?),
            };
            let mut orchestrator =
                PunchOrchestrator::new(api, devices, local, Arc::new(SystemClock));

            load(&mut orchestrator).await?;

            if let Some(direction) = command.direction() {
                match orchestrator.punch(direction).await {
                    Ok(receipt) => {
                        println!("Success: {}", receipt.message);
                        println!("Location: {}", receipt.address);
                    }
                    Err(e) => bail!("{}", e.notice(SUBMIT_FALLBACK)),
                }
                print_status(&orchestrator);
            } else if matches!(command, Commands::Watch) {
                watch(&orchestrator).await;
            } else {
                print_status(&orchestrator);
            }
        }
    }

    Ok(())
}

/// Run the load phases, reporting each failure; only a lost session aborts
async fn load(orchestrator: &mut PunchOrchestrator) -> Result<()> {
    orchestrator.check_permissions().await;

    let user = orchestrator.load_user().await.map(|_| ());
    report(user, USER_FALLBACK)?;

    let status = orchestrator.load_attendance_status().await;
    report(status, STATUS_FALLBACK)
}

fn report(result: Result<(), PunchError>, fallback: &str) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.requires_login() => bail!("{}", e.notice(fallback)),
        Err(e) => {
            warn!("{}", e);
            eprintln!("{}", e.notice(fallback));
            Ok(())
        }
    }
}

fn print_status(orchestrator: &PunchOrchestrator) {
    match orchestrator.user() {
        Some(user) => println!("{}, {}", orchestrator.greeting(), user.full_name()),
        None => println!("{}", orchestrator.greeting()),
    }

    match orchestrator.punched_in_since() {
        Some(since) if orchestrator.is_punched_in() => println!(
            "Punched in since {} ({})",
            since.format("%H:%M:%S"),
            orchestrator.timer().display()
        ),
        _ => println!("Not punched in"),
    }
}

async fn watch(orchestrator: &PunchOrchestrator) {
    if !orchestrator.is_punched_in() {
        print_status(orchestrator);
        return;
    }

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            _ = ticker.tick() => println!("{}", orchestrator.timer().display()),
            _ = tokio::signal::ctrl_c() => {
                info!("Stopped watching");
                break;
            }
        }
    }
}
