use clap::Parser;
use polaris::{load_dotenv, Application, UserModel};
use std::path::PathBuf;

mod config;
mod controllers;
mod middleware;
mod routes;

/// Demo application built on Polaris
#[derive(Parser)]
#[command(name = "app")]
#[command(about = "Polaris demo application server")]
struct Cli {
    /// Path of the INI configuration file
    #[arg(short, long, default_value = "polaris.ini")]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    load_dotenv(&std::env::current_dir().unwrap_or_default());

    let source = config::AppConfig::new(&cli.config);
    match Application::compose(source, UserModel::anonymous()).await {
        Ok(app) => app.run().await,
        Err(e) => {
            eprintln!("Failed to start application: {}", e);
            std::process::exit(1);
        }
    }
}
