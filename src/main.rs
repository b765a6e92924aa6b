use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use shortener::cli::Cli;
use shortener::config::{StaticConfig, get_config, init_config};
use shortener::runtime::run_server;
use shortener::system::init_logging;

#[actix_web::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.generate_config {
        println!("{}", StaticConfig::generate_sample_config());
        return ExitCode::SUCCESS;
    }

    // .env 不存在时忽略
    dotenvy::dotenv().ok();

    let config = match StaticConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e.format_colored());
            return ExitCode::FAILURE;
        }
    };
    init_config(config);
    let config: Arc<StaticConfig> = get_config();

    let _guard = match init_logging(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("[ERROR] Failed to initialize logging: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    match run_server(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Server exited with error: {:#}", e);
            eprintln!("[ERROR] {:#}", e);
            ExitCode::FAILURE
        }
    }
}
