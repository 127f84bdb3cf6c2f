use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use portfolio_sync::auth::adapter::outgoing::HttpAuthApi;
use portfolio_sync::auth::application::services::SessionContext;
use portfolio_sync::auth::application::use_cases::login_user::{
    ILoginUserUseCase, LoginUserUseCase,
};
use portfolio_sync::auth::application::use_cases::logout_user::{ILogoutUseCase, LogoutUseCase};
use portfolio_sync::auth::application::use_cases::register_user::{
    IRegisterUserUseCase, RegisterUserUseCase,
};
use portfolio_sync::config::AppConfig;
use portfolio_sync::portfolio::adapter::outgoing::HttpPortfolioApi;
use portfolio_sync::portfolio::application::{
    KeepReason, PortfolioSynchronizer, ReconcileOutcome,
};
use portfolio_sync::portfolio::domain::entities::{PortfolioId, PortfolioPatch};
use portfolio_sync::portfolio::domain::period::{format_location, format_period};
use portfolio_sync::shared::api::ApiClient;
use portfolio_sync::shared::storage::{FileStore, KeyValueStore};

#[derive(Parser)]
#[command(name = "portfolio-sync")]
#[command(author, version, about = "Keeps cached portfolios in step with the backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the session and the active portfolio
    Status,

    /// Log in, then pull portfolios from the backend
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },

    /// Create an account (does not log in)
    Signup {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },

    /// Forget the cached session
    Logout,

    /// Make a portfolio the active one
    Switch { id: i64 },

    /// Create a portfolio
    NewPortfolio { name: String },

    /// Rename a portfolio
    RenamePortfolio { id: i64, name: String },

    /// Delete a portfolio
    DeletePortfolio { id: i64 },
}

struct Services {
    store: Arc<dyn KeyValueStore>,
    session: SessionContext,
    client: ApiClient,
}

impl Services {
    async fn synchronizer(&self) -> PortfolioSynchronizer {
        let api = Arc::new(HttpPortfolioApi::new(self.client.clone()));
        let (sync, outcome) =
            PortfolioSynchronizer::start(self.store.clone(), api, self.session.clone()).await;
        match outcome {
            ReconcileOutcome::Replaced { portfolios } => {
                println!("Pulled {portfolios} portfolio(s) from the server")
            }
            ReconcileOutcome::KeptLocal(KeepReason::Failed(e)) => {
                println!("Working offline: {e}")
            }
            ReconcileOutcome::KeptLocal(_) => {}
        }
        sync
    }
}

fn print_status(session: &SessionContext, sync: &PortfolioSynchronizer) {
    match session.current() {
        Some(s) => println!("Signed in as {} (user {})", s.user.email, s.user_id()),
        None => println!("Signed out"),
    }

    let profile = sync.profile();
    println!("{} - {}", profile.full_name, profile.job_title);

    for portfolio in sync.portfolios() {
        let marker = if portfolio.id == sync.active_portfolio_id() { "*" } else { " " };
        let origin = if portfolio.is_synced() { "synced" } else { "local" };
        println!(
            "{} [{}] {} ({}, {} entries)",
            marker,
            portfolio.id,
            portfolio.name,
            origin,
            portfolio.entry_count()
        );
    }

    for exp in sync.experiences() {
        println!(
            "    {} @ {} | {} | {}",
            exp.position,
            exp.employer,
            format_location(&exp.city, &exp.country),
            format_period(exp.start_date, exp.end_date, exp.ongoing)
        );
    }
    for edu in sync.educations() {
        println!(
            "    {} - {} | {}",
            edu.title,
            edu.institution,
            format_period(edu.start_date, edu.end_date, edu.ongoing)
        );
    }
}

#[tokio::main]
#[cfg(not(tarpaulin_include))]
async fn start() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,reqwest=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;
    info!("Using backend {}", config.api_base_url);

    let store: Arc<dyn KeyValueStore> = Arc::new(
        FileStore::open(&config.cache_dir)
            .with_context(|| format!("opening cache at {}", config.cache_dir.display()))?,
    );
    let session = SessionContext::restore(store.clone());
    let client = ApiClient::new(config.api_base_url.clone(), session.clone())?;
    let services = Services {
        store,
        session: session.clone(),
        client: client.clone(),
    };

    match cli.command {
        Commands::Status => {
            let sync = services.synchronizer().await;
            print_status(&session, &sync);
            sync.shutdown().await;
        }
        Commands::Login { email, password } => {
            let login = LoginUserUseCase::new(HttpAuthApi::new(client), session.clone());
            let signed_in = login.execute(email, password).await?;
            println!("Welcome {}", signed_in.user.email);

            let sync = services.synchronizer().await;
            print_status(&session, &sync);
            sync.shutdown().await;
        }
        Commands::Signup { email, password } => {
            let register = RegisterUserUseCase::new(HttpAuthApi::new(client));
            let user = register.execute(email, password).await?;
            println!("Account created for {}. You can log in now.", user.email);
        }
        Commands::Logout => {
            LogoutUseCase::new(session).execute();
            println!("Logged out");
        }
        Commands::Switch { id } => {
            let mut sync = services.synchronizer().await;
            sync.switch_portfolio(PortfolioId::from(id))?;
            print_status(&session, &sync);
            sync.shutdown().await;
        }
        Commands::NewPortfolio { name } => {
            let mut sync = services.synchronizer().await;
            let outcome = sync.add_portfolio(&name).await;
            print_status(&session, &sync);
            sync.shutdown().await;
            let id = outcome?;
            println!("Created portfolio {id}");
        }
        Commands::RenamePortfolio { id, name } => {
            let mut sync = services.synchronizer().await;
            sync.update_portfolio(PortfolioId::from(id), PortfolioPatch { name: Some(name) })
                .await?;
            sync.shutdown().await;
        }
        Commands::DeletePortfolio { id } => {
            let mut sync = services.synchronizer().await;
            sync.delete_portfolio(PortfolioId::from(id)).await?;
            sync.shutdown().await;
        }
    }

    Ok(())
}

#[cfg(not(tarpaulin_include))]
fn main() {
    if let Err(e) = start() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
