use anyhow::Result;
use clap::Parser;
use smart_finance::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    dotenv::dotenv().ok();
    let config = Config::parse();
    smart_finance::run(config).await
}
