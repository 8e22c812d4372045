use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::op::{Op, OpContext};
use cli::Args;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let ctx = OpContext {
        config_path: args.config_dir.clone(),
    };

    let output = args.command.execute(&ctx).await?;
    let output = output.to_string();
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}
