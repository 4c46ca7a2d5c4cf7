use std::path::PathBuf;
use std::sync::Arc;

use anyhow::bail;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use coursework::cli::{
    ADMIN_TOKEN_FILE, AdminCommands, ModeratorCommands, TokenCommands, UserCommands, run_init, run_moderator,
    run_sweep, run_token_create, run_token_list, run_token_revoke, run_user_add, run_user_list,
};
use coursework::config::ServerConfig;
use coursework::jobs::spawn_inactive_user_sweeper;
use coursework::notify::{NotificationDispatcher, NotificationQueue, spawn_worker};
use coursework::server::{AppState, create_router};
use coursework::store::{SqliteStore, Store};

#[derive(Parser)]
#[command(name = "coursework")]
#[command(about = "A course hosting and checkout server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Start the server
    Serve {
        /// Host to bind to (overrides the config file)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides the config file)
        #[arg(long, short)]
        port: Option<u16>,

        /// Data directory for the database and config file
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Path to a TOML config file (defaults to <data-dir>/coursework.toml)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn run_admin(command: AdminCommands) -> anyhow::Result<()> {
    match command {
        AdminCommands::Init {
            data_dir,
            non_interactive,
        } => run_init(data_dir, non_interactive),
        AdminCommands::User { command } => match command {
            UserCommands::Add {
                data_dir,
                email,
                password,
                moderator,
                create_token,
                non_interactive,
            } => run_user_add(
                data_dir,
                email,
                password,
                moderator,
                create_token,
                non_interactive,
            ),
            UserCommands::List { data_dir, json } => run_user_list(data_dir, json),
            UserCommands::Moderator { command } => match command {
                ModeratorCommands::Grant {
                    data_dir,
                    email,
                    non_interactive,
                } => run_moderator(data_dir, email, true, non_interactive),
                ModeratorCommands::Revoke {
                    data_dir,
                    email,
                    non_interactive,
                } => run_moderator(data_dir, email, false, non_interactive),
            },
        },
        AdminCommands::Token { command } => match command {
            TokenCommands::Create {
                data_dir,
                email,
                expires_days,
                non_interactive,
            } => run_token_create(data_dir, email, expires_days, non_interactive),
            TokenCommands::List {
                data_dir,
                email,
                non_interactive,
                json,
            } => run_token_list(data_dir, email, non_interactive, json),
            TokenCommands::Revoke {
                token_id,
                data_dir,
                yes,
                non_interactive,
            } => run_token_revoke(data_dir, token_id, yes, non_interactive),
        },
        AdminCommands::Sweep {
            data_dir,
            inactive_days,
        } => run_sweep(data_dir, inactive_days),
    }
}

async fn serve(
    host: Option<String>,
    port: Option<u16>,
    data_dir: String,
    config_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    let data_dir = PathBuf::from(data_dir);
    let mut config = ServerConfig::resolve(config_path.as_deref(), &data_dir)?;
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }

    let token_file = config.data_dir.join(ADMIN_TOKEN_FILE);
    if !token_file.exists() {
        bail!(
            "Server not initialized. Run 'coursework admin init' first to create the database and admin token."
        );
    }

    let store = SqliteStore::new(&config.db_path())?;
    if !store.has_admin_token()? {
        bail!(
            "Server not initialized. Run 'coursework admin init' first to create the database and admin token."
        );
    }
    let store: Arc<dyn Store> = Arc::new(store);

    info!("Admin token available at {}", token_file.display());

    let gateway = config.gateway.build()?;
    let mailer = config.mail.build()?;
    info!(provider = ?config.gateway.provider, "payment gateway configured");

    let (queue, rx) = NotificationQueue::new(config.jobs.queue_capacity);
    let dispatcher = NotificationDispatcher::new(
        store.clone(),
        mailer,
        config.mail.from_address.clone(),
    );
    spawn_worker(rx, Arc::new(dispatcher));
    spawn_inactive_user_sweeper(
        store.clone(),
        config.jobs.inactive_after(),
        config.jobs.sweep_interval(),
    );

    let state = Arc::new(AppState::new(store, gateway, queue));
    let app = create_router(state);
    let addr = config.socket_addr()?;

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("coursework=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Admin { command } => run_admin(command)?,
        Commands::Serve {
            host,
            port,
            data_dir,
            config,
        } => serve(host, port, data_dir, config).await?,
    }

    Ok(())
}
