//! PoolForge Backend - Service Entry Point
//!
//! Run modes:
//!   cargo run -- api             - Start the REST API server
//!   cargo run -- config          - Print the resolved configuration
//!   cargo run -- help            - Show usage

use poolforge::{api, config::PoolForgeConfig, logging};
use std::env;

#[tokio::main]
async fn main() {
    // Local development reads .env; production sets real env vars
    let _ = dotenv::dotenv();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    match args[1].as_str() {
        "api" => run_api_server(&args[2..]).await,
        "config" => show_config(),
        "help" | "--help" | "-h" => print_usage(),
        _ => print_usage(),
    }
}

fn print_usage() {
    println!("PoolForge Backend - Lending Pool Orchestration");
    println!();
    println!("Usage:");
    println!("  poolforge-api api [--port <port>]   Start REST API server (default: 3000)");
    println!("  poolforge-api config                Print resolved configuration");
    println!();
    println!("Environment Variables:");
    println!("  POOLFORGE_ENV                   production | staging | development");
    println!("  POOLFORGE_SIGNER_URL            Signing service base URL");
    println!("  POOLFORGE_SIGNER_API_KEY        Signing service API key");
    println!("  POOLFORGE_FACTORY_ADDRESS       Pool factory contract address");
    println!("  POOLFORGE_DEFAULT_WALLET_ID     Fallback deployment wallet");
    println!("  POOLFORGE_COLLATERAL_RATIO_WAD  Collateral ratio, 18-decimal fixed point");
    println!("  POOLFORGE_FEE_LEVEL             LOW | MEDIUM | HIGH");
    println!("  POOLFORGE_API_PORT              REST API port (default: 3000)");
    println!("  POOLFORGE_LOG_LEVEL             debug | info | warn | error");
}

fn load_config() -> Option<PoolForgeConfig> {
    match PoolForgeConfig::from_env() {
        Ok(config) => Some(config),
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            None
        }
    }
}

fn show_config() {
    if let Some(config) = load_config() {
        config.print_summary();
    }
}

/// Start the REST API server
async fn run_api_server(args: &[String]) {
    let mut config = match load_config() {
        Some(config) => config,
        None => return,
    };

    // Parse arguments
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--port" if i + 1 < args.len() => {
                config.api_port = args[i + 1].parse().unwrap_or(config.api_port);
                i += 2;
            }
            _ => i += 1,
        }
    }

    if let Err(e) = logging::init_from_config(&config) {
        eprintln!("Logging init error: {}", e);
        return;
    }

    config.print_summary();

    if let Err(e) = api::start_server(&config).await {
        eprintln!("API server error: {}", e);
    }
}
