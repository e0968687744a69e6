//! namedb: a networked name-set server
//!
//! Clients connect over TCP and issue line-delimited text commands
//! (ADD, DEL, LIST, HELP, QUIT) against a shared in-memory set of names.
//!
//! Features:
//! - One concurrent connection-handling task per client
//! - Set persisted to a flat file after every mutation
//! - Append-only audit log of every ADD/DEL
//! - Configuration via CLI arguments or TOML file
//! - Bundled interactive console client

mod client;
mod config;
mod framer;
mod protocol;
mod server;
mod store;

use clap::Parser;
use config::{Cli, CliCommand, ClientArgs, Config, ServeArgs};
use server::Server;
use store::Store;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        CliCommand::Serve(args) => run_server(&args),
        CliCommand::Client(args) => run_client(&args),
    }
}

fn run_server(args: &ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load(args)?;

    init_logging(&config.log_level);

    info!(
        listen = %config.listen,
        db_file = %config.db_file.display(),
        log_file = %config.log_file.display(),
        "Starting namedb server"
    );

    let runtime = build_runtime(config.workers)?;
    runtime.block_on(async {
        let store = Store::open(&config.db_file, &config.log_file)?;
        let server = Server::bind(&config.listen, store).await?;
        server.run().await.map_err(Into::into)
    })
}

fn run_client(args: &ClientArgs) -> Result<(), Box<dyn std::error::Error>> {
    init_logging("warn");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(client::run(args)).map_err(Into::into)
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn build_runtime(workers: Option<usize>) -> std::io::Result<tokio::runtime::Runtime> {
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(workers) = workers {
        builder.worker_threads(workers);
    }
    builder.build()
}
