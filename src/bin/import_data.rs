use anyhow::Context;
use clap::Parser;
use shop_backoffice::config::{self, Settings};
use shop_backoffice::establish_connection;
use shop_backoffice::import::{Importer, Progress, Workbook};
use shop_backoffice::store::{MemoryStore, PgStore};
use std::env;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "import_data")]
#[command(about = "Load pickup points, products, users and orders from a workbook")]
struct Cli {
    /// Path to the .xlsx workbook
    workbook: PathBuf,

    /// Run against an in-memory store instead of the database
    #[arg(long)]
    dry_run: bool,
}

fn print_progress(progress: Progress<'_>) {
    println!("{progress}");
}

fn main() -> anyhow::Result<()> {
    if let Err(env::VarError::NotPresent) = env::var("RUST_LOG") {
        env::set_var("RUST_LOG", "info");
    }
    pretty_env_logger::formatted_timed_builder()
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    let workbook = Workbook::open(&cli.workbook)?;
    println!("Starting data import...");

    if cli.dry_run {
        dotenvy::dotenv().ok();
        let domains = config::email_domains(|name| env::var(name).ok())?;
        let mut store = MemoryStore::new();
        Importer::new(&mut store, domains).run(&workbook, print_progress)?;
        println!("Dry run finished, nothing was written.");
        return Ok(());
    }

    let settings = Settings::from_env()?;
    let mut conn = establish_connection(&settings).context("cannot connect to the database")?;
    let mut store = PgStore::new(&mut conn);
    Importer::new(&mut store, settings.email_domains.clone()).run(&workbook, print_progress)?;
    println!("Data import completed successfully!");
    Ok(())
}
