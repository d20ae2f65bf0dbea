use anyhow::Context;
use clap::{Parser, Subcommand};
use onboarding_core::{
    normalize, plan_records, ConfigValues, HttpBackend, OnboardingService, PatientId,
    RegistrationForm, RegistrationOutcome,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "onboard")]
#[command(about = "Patient onboarding CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a registration form and print the normalised payloads
    Normalize {
        /// Registration form as JSON
        #[arg(long)]
        form: PathBuf,
    },
    /// Print the medical-history calls a form would make
    Plan {
        /// Registration form as JSON
        #[arg(long)]
        form: PathBuf,
    },
    /// Register the patient against the configured backend
    Register {
        /// Registration form as JSON
        #[arg(long)]
        form: PathBuf,
    },
}

fn read_form(path: &Path) -> anyhow::Result<RegistrationForm> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read form {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid form JSON in {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("onboarding_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Normalize { form }) => {
            let normalized = normalize(&read_form(&form)?)?;
            println!("Email: {}", normalized.credentials.email);
            println!("Profile: {}", serde_json::to_string_pretty(&normalized.profile)?);
            println!("Intake: {}", serde_json::to_string_pretty(&normalized.intake)?);
        }
        Some(Commands::Plan { form }) => {
            let normalized = normalize(&read_form(&form)?)?;
            let today = chrono::Utc::now().date_naive();
            // The real id is only known once the patient exists.
            let requests = plan_records(&PatientId::Numeric(0), &normalized.intake, today);
            if requests.is_empty() {
                println!("No medical-history records to submit.");
            }
            for request in requests {
                println!(
                    "POST {} [{} #{}] {}",
                    request.category().endpoint(),
                    request.category(),
                    request.index,
                    request.record.label()
                );
            }
        }
        Some(Commands::Register { form }) => {
            let form = read_form(&form)?;
            let cfg = Arc::new(ConfigValues::from_env().resolve()?);
            println!("Registering against {}", cfg.api_base_url());
            let service = OnboardingService::new(HttpBackend::new(cfg)?);

            match service.run(&form).await {
                RegistrationOutcome::Registered(registered) => {
                    println!("Registered patient {}", registered.session.patient.id);
                    println!(
                        "Medical records saved: {}/{}",
                        registered.history.saved(),
                        registered.history.attempted()
                    );
                    for failure in registered.history.failures() {
                        eprintln!("Not saved: {}", failure);
                    }
                }
                RegistrationOutcome::Invalid(e) => anyhow::bail!("Form rejected: {}", e),
                RegistrationOutcome::AuthFailed(e) => anyhow::bail!("Account not created: {}", e),
                RegistrationOutcome::PatientFailed(e) => {
                    anyhow::bail!("Account created but patient profile failed: {}", e)
                }
            }
        }
        None => {
            println!("Use --help for available commands");
        }
    }

    Ok(())
}
