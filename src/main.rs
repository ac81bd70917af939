//! Roster demo client — entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load config
//!   3. Init logger at the configured level
//!   4. Build the user store and subscribe a printing observer
//!   5. Run one reconciliation pass against the remote endpoint

use tracing::{info, warn};

use roster::store::UserStore;
use roster::{config, logger};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), roster::AppError> {
    // Load .env if present — ignore errors (file is optional).
    let _ = dotenvy::dotenv();

    let config = config::load()?;

    logger::init(&config.log_level)?;

    info!(
        api_base_url = %config.api_base_url,
        storage_dir = %config.storage_dir.display(),
        log_level = %config.log_level,
        "config loaded"
    );

    let store = UserStore::new(&config)?;

    let _subscription = store.subscribe(|users| {
        println!("roster: {} user(s)", users.len());
        for user in users {
            let name = user
                .attr("username")
                .and_then(|v| v.as_str())
                .unwrap_or("<unnamed>");
            println!("  #{} {}", user.id, name);
        }
    });

    // A failed load is reported but not fatal; the roster just stays empty.
    match store.load_users().await {
        Ok(count) => info!(count, "roster loaded"),
        Err(e) => warn!("roster load failed: {e}"),
    }

    Ok(())
}
