/// Nest Server - nested playlist trees over HTTP
use clap::{Parser, Subcommand};
use nest_core::{OwnerId, TreeNode};
use nest_engine::MutationEngine;
use nest_server::{api, config::ServerConfig, AppState, AuthService, HttpCatalog};
use nest_storage::SqliteNodeStore;
use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "nest-server")]
#[command(about = "Nested playlist tree server", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "NEST_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Print a development access token for an owner
    IssueToken {
        /// Owner id placed in the token subject
        #[arg(short, long)]
        owner: String,
    },
    /// Print an owner's playlist forest
    PrintTree {
        /// Owner whose forest to print
        #[arg(short, long)]
        owner: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nest_server=info,nest_engine=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => ServerConfig::load_from(path)?,
        None => ServerConfig::load()?,
    };

    match cli.command {
        Commands::Serve => serve(config).await?,
        Commands::IssueToken { owner } => issue_token(&config, &owner)?,
        Commands::PrintTree { owner } => print_tree(&config, &owner).await?,
    }

    Ok(())
}

async fn open_engine(config: &ServerConfig) -> anyhow::Result<MutationEngine> {
    if let Some(dir) = config.database_dir() {
        tokio::fs::create_dir_all(&dir).await?;
    }

    let pool = nest_storage::create_pool(&config.storage.database_url).await?;
    nest_storage::run_migrations(&pool).await?;
    tracing::info!("Database connected");

    let catalog = HttpCatalog::new(
        config.catalog.base_url.clone(),
        config.catalog.access_token.clone(),
        Duration::from_secs(config.catalog.timeout_secs),
    )?;
    if config.catalog.access_token.is_none() {
        tracing::warn!("No catalog access token; track metadata will be unavailable");
    }

    Ok(MutationEngine::new(
        Arc::new(SqliteNodeStore::new(pool)),
        Arc::new(catalog),
    ))
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    config.validate()?;

    tracing::info!("Starting Nest Server");
    tracing::info!("Host: {}", config.server.host);
    tracing::info!("Port: {}", config.server.port);

    let engine = Arc::new(open_engine(&config).await?);

    let auth_service = Arc::new(AuthService::new(
        config.auth.jwt_secret.clone(),
        config.auth.jwt_expiration_hours,
    ));

    let app = api::router(AppState::new(engine, auth_service))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn issue_token(config: &ServerConfig, owner: &str) -> anyhow::Result<()> {
    config.validate()?;
    let auth_service = AuthService::new(
        config.auth.jwt_secret.clone(),
        config.auth.jwt_expiration_hours,
    );
    let token = auth_service.create_access_token(&OwnerId::new(owner))?;
    println!("{}", token);
    Ok(())
}

async fn print_tree(config: &ServerConfig, owner: &str) -> anyhow::Result<()> {
    let engine = open_engine(config).await?;
    let tree = engine.get_tree(&OwnerId::new(owner)).await?;

    if tree.is_empty() {
        println!("No playlists for {}", owner);
    }
    for root in &tree {
        print_node(root, 0);
    }
    Ok(())
}

fn print_node(node: &TreeNode, depth: usize) {
    println!(
        "{}{} {} ({} tracks) [{}]",
        "  ".repeat(depth),
        node.node.icon,
        node.node.name,
        node.track_count,
        node.node.id
    );
    for child in &node.children {
        print_node(child, depth + 1);
    }
}
