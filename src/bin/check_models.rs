//! List the Gemini models this API key can use for text generation

use anyhow::{bail, Result};
use clap::Parser;
use smart_finance::ai::{GeminiClient, GeminiSettings};

#[derive(Debug, Parser)]
#[command(name = "check_models", about = "List Gemini models that support generateContent")]
struct Args {
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    google_api_key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    dotenv::dotenv().ok();
    let args = Args::parse();
    let Some(api_key) = args.google_api_key.filter(|k| !k.trim().is_empty()) else {
        bail!("GOOGLE_API_KEY is not set");
    };

    let prefix: String = api_key.chars().take(5).collect();
    println!("Using key {}...", prefix);

    let client = GeminiClient::new(GeminiSettings::new(api_key))?;
    let models = client.list_models().await?;

    if models.is_empty() {
        println!("No models support generateContent for this key.");
        return Ok(());
    }

    println!("Available models:");
    for model in &models {
        println!("  {} ({})", model.id, model.name);
    }
    Ok(())
}
