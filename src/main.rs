use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tradepost::cli::{Args, build_jwt_config, init_logging, open_database};
use tradepost::rate_limit::RateLimitQuotas;
use tradepost::{ServerConfig, run_server};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(&args.log_format);

    let Some(jwt) = build_jwt_config(&args) else {
        std::process::exit(1);
    };

    let Some(db) = open_database(&args.database).await else {
        std::process::exit(1);
    };

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            error!(address = %addr, error = %e, "Failed to bind");
            std::process::exit(1);
        });

    let local_addr = listener.local_addr().unwrap();

    let config = ServerConfig {
        db,
        jwt: Arc::new(jwt),
        rate_limits: RateLimitQuotas::standard(),
    };

    info!(address = %local_addr, "Listening");

    if let Err(e) = run_server(config, listener).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
