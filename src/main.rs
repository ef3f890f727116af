use clap::Parser;
use std::io;
use std::path::Path;
use std::sync::{Arc, atomic::{AtomicBool, Ordering}};
use actix_web::web;

mod cli;
mod api;
mod core;
mod utils;
mod models;
mod crypto;
mod db;
mod generators;
mod tools;

use crate::cli::{Args, CliCommand};
use crate::core::config::Config;
use crate::core::events::AuthEventBus;
pub use crate::core::vault::Vault;

#[tokio::main]
async fn main() -> Result<(), io::Error> {
    // Load environment variables
    if Path::new(".env").exists() {
        dotenvy::dotenv().ok();
    }

    let args = Args::parse();
    let mut config = Config::load();

    // Command-line flags override environment configuration
    if let Some(db) = &args.db {
        config.database_url = db.clone();
    }
    if let Some(host) = &args.host {
        config.host = host.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    env_logger::Builder::new()
        .filter_level(config.log_level)
        .format_timestamp_secs()
        .init();

    // One-shot commands run without the database or the server
    if let Some(command) = &args.command {
        let result = match command {
            CliCommand::Generate {
                length,
                no_uppercase,
                no_lowercase,
                no_numbers,
                no_symbols,
            } => cli::handlers::handle_generate(
                *length,
                *no_uppercase,
                *no_lowercase,
                *no_numbers,
                *no_symbols,
                args.json,
            ),
            CliCommand::Strength { candidate } => {
                cli::handlers::handle_strength(candidate, args.json)
            }
        };

        return result.map_err(|e| {
            eprintln!("❌ {}", e);
            io::Error::new(io::ErrorKind::Other, e.to_string())
        });
    }

    log::info!("🔐 Starting KeyHaven - password manager backend");

    config.ensure_directories_exist();

    let db_url = config.get_database_url();
    let db = match db::init_db(&db_url).await {
        Ok(db) => {
            log::info!("✅ Database connection successful ({})", db.get_backend_type());
            db
        },
        Err(e) => {
            eprintln!("❌ Database connection failed: {e}");
            eprintln!("Troubleshooting:");
            eprintln!("• Is your DB server running?");
            eprintln!("• Are credentials correct?");
            eprintln!("• For SQLite: does the path exist?");
            eprintln!("• For Postgres: create the DB if needed: `createdb keyhaven -U postgres`");
            eprintln!("• Use --db or set DATABASE_URL in `.env`");
            return Ok(());
        }
    };

    let should_exit = Arc::new(AtomicBool::new(false));
    {
        let should_exit = Arc::clone(&should_exit);
        ctrlc::set_handler(move || {
            log::info!("🔴 Ctrl+C received. Shutting down...");
            should_exit.store(true, Ordering::SeqCst);
            std::process::exit(0);
        }).map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
    }

    let events = AuthEventBus::new();

    // Log auth-state changes as they happen
    {
        let mut receiver = events.subscribe();
        tokio::spawn(async move {
            while let Ok(event) = receiver.recv().await {
                log::info!("🔔 Auth event: {} for {}", event.kind, event.email);
            }
        });
    }

    let vault = web::Data::new(Vault::new(db, events, &config));

    // Sweep expired session files every hour
    {
        let vault = vault.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(3600));
            loop {
                interval.tick().await;
                vault.auth_manager.cleanup_expired_sessions();
            }
        });
    }

    api::start_server(vault, &config.host, config.port).await.map_err(|e| {
        log::error!("API server failed: {}", e);
        e
    })
}
