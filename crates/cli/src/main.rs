//! # Sim Scenario CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 场景文件加载与验证
//! - 场景搭建与仿真循环驱动
//! - 优雅关闭处理

mod cli;
mod commands;
mod error;
mod session;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_info, run_session, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Sim Scenario CLI starting"
    );

    let result = match &cli.command {
        Commands::Run(args) => run_session(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Initialize logging based on CLI options
///
/// Metrics are installed later by `run` when a port is given.
fn init_logging(cli: &Cli) -> Result<()> {
    observability::init_with_config(
        ObservabilityConfig::from_verbosity(cli.verbose, cli.quiet)
            .with_format(cli.log_format.into()),
    )
}
