use std::process::ExitCode;

use daily_briefing::config::{self, Config};
use daily_briefing::services::pipeline::Pipeline;
use log::{error, info};

async fn run() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let pipeline = Pipeline::from_config(&config)?;

    let briefing = pipeline.run().await?;
    println!("\n=== FINAL PROMPT TO SEND TO AI ===");
    println!("{}", briefing.document);
    println!("==================================");
    println!("{}", briefing.reply.text);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    config::init_logging();
    info!("Building daily briefing");

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
