//! HTTP Mock Server - CLI Entry Point

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use httpmock_server::loader::load_stubs;
use httpmock_server::{MockServer, ServerConfig, StubRegistry};

#[derive(Parser, Debug)]
#[command(
    name = "httpmock-server",
    about = "Configurable HTTP mock server - request stubbing from files or at runtime",
    version
)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Directory tree of stub definition files to load at startup
    #[arg(short = 'd', long, default_value = "stubs")]
    stubs_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, default_value = "info")]
    log_level: Level,

    /// Load the stubs directory, report the result and exit
    #[arg(long)]
    validate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if args.validate {
        let registry = StubRegistry::new();
        let loaded = load_stubs(&registry, &args.stubs_dir);
        println!(
            "Loaded {} stub(s) from {}",
            loaded,
            args.stubs_dir.display()
        );
        return Ok(());
    }

    MockServer::with_config(ServerConfig {
        port: args.port,
        stubs_dir: args.stubs_dir,
        stubs: Vec::new(),
    })
    .run()
    .await
}
