use anyhow::Context;
use clap::{Parser, Subcommand};
use frontdesk_config::load as load_config;
use frontdesk_gateway::{create_router, GatewayState, TokenIssuer};
use frontdesk_runtime::{seed::seed_demo_data, telemetry, BackendServices};
use tokio::net::TcpListener;
use tracing::info;

#[derive(Parser)]
#[command(name = "frontdesk-server")]
#[command(about = "Frontdesk support inbox backend (serves HTTP by default)")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Create a demo workspace with users, teams and chats
    SeedData,
    /// Print every chat and its tickets
    DumpData,
    /// Sign a development bearer token for a user id
    DevToken {
        user_id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server().await,
        Commands::SeedData => seed_data().await,
        Commands::DumpData => dump_data().await,
        Commands::DevToken { user_id } => dev_token(&user_id),
    }
}

async fn run_server() -> anyhow::Result<()> {
    telemetry::init_tracing().context("failed to initialise tracing")?;

    info!("starting Frontdesk backend");

    let config = load_config().context("failed to load configuration")?;

    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    let state = GatewayState::new(services.db_pool.clone(), &config);
    let app = create_router(state);

    let address = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(frontdesk_runtime::shutdown_signal())
        .await
        .context("http server error")?;

    info!("backend shut down");
    Ok(())
}

async fn seed_data() -> anyhow::Result<()> {
    telemetry::init_tracing().context("failed to initialise tracing")?;

    let config = load_config().context("failed to load configuration")?;
    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    let summary = seed_demo_data(&services.directory).await?;
    if summary.created {
        println!("Database seeded with demo data:");
        println!("- {} users", summary.users);
        println!("- {} teams", summary.teams);
        println!("- {} chats", summary.chats);
        println!("Run 'dump-data' to see the inserted data");
    } else {
        println!("Demo workspace already exists, nothing to do");
    }

    Ok(())
}

async fn dump_data() -> anyhow::Result<()> {
    telemetry::init_tracing().context("failed to initialise tracing")?;

    let config = load_config().context("failed to load configuration")?;
    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    let workspace_ids = services
        .directory
        .list_workspace_ids()
        .await
        .context("failed to list workspaces")?;

    if workspace_ids.is_empty() {
        println!("No workspaces found in database");
        return Ok(());
    }

    for workspace_id in workspace_ids {
        let chats = services
            .directory
            .list_chats(&workspace_id)
            .await
            .with_context(|| format!("failed to fetch chats of {workspace_id}"))?;

        println!("=== {workspace_id} ({} chats) ===", chats.len());
        println!(
            "{:<38} {:<12} {:<12} {:<26} {:<26}",
            "Chat ID", "Contact", "Source", "Assignee", "Team"
        );
        println!("{}", "-".repeat(118));

        for chat in chats {
            println!(
                "{:<38} {:<12} {:<12} {:<26} {:<26}",
                chat.chat_id,
                chat.source_client_id,
                chat.source,
                chat.assignee_user_id.as_deref().unwrap_or("NULL"),
                chat.team_id.as_deref().unwrap_or("NULL"),
            );
            for ticket in &chat.tickets {
                println!(
                    "    ticket {:<20} {:<8} notes: {}",
                    ticket.ticket_id,
                    ticket.status.as_str(),
                    ticket.notes.len()
                );
            }
            if !chat.tags.is_empty() {
                let tags: Vec<&str> = chat.tags.iter().map(String::as_str).collect();
                println!("    tags: {}", tags.join(", "));
            }
        }
        println!();
    }

    Ok(())
}

fn dev_token(user_id: &str) -> anyhow::Result<()> {
    let config = load_config().context("failed to load configuration")?;
    let token = TokenIssuer::from_config(&config.auth)
        .issue(user_id)
        .context("failed to sign token")?;
    println!("{token}");
    Ok(())
}
