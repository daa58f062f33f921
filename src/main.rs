use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sessiongate::cli::{self, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sessiongate=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => cli::commands::init().await,
        Commands::Status { format } => cli::commands::status(format).await,
        Commands::Login {
            token,
            id,
            email,
            name,
            role,
        } => cli::commands::login(token, id, email, name, role).await,
        Commands::Logout => cli::commands::logout().await,
        Commands::UpdateProfile { name, email } => {
            cli::commands::update_profile(name, email).await
        }
        Commands::Check { level } => cli::commands::check(level).await,
    }
}
