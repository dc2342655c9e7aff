//! Load the demo user, three months of transactions and a credit card

use anyhow::Result;
use clap::Parser;
use smart_finance::config::{parse_database_url, DatabaseLocation};
use smart_finance::db::seed::{seed_demo_data, DEMO_EMAIL};

#[derive(Debug, Parser)]
#[command(name = "seed", about = "Seed the SmartFinance database with demo data")]
struct Args {
    #[arg(long, env = "DATABASE_URL", value_parser = parse_database_url)]
    database_url: DatabaseLocation,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    dotenv::dotenv().ok();
    let args = Args::parse();
    println!("Opening database: {}", args.database_url);
    let db = smart_finance::open_database(&args.database_url)?;

    let summary = seed_demo_data(&db, chrono::Local::now().date_naive())?;
    if summary.created_user {
        println!("Created demo user {}", DEMO_EMAIL);
    } else {
        println!("Demo user {} already exists, refreshing transactions", DEMO_EMAIL);
    }
    println!("Inserted {} transactions", summary.transactions);
    if summary.created_debt {
        println!("Added credit card debt");
    }

    println!("Done! Demo user id: {}", summary.user_id);
    Ok(())
}
