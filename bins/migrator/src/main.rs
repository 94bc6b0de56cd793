//! Database migration runner for the Ikimina ledger.
//!
//! Usage:
//!   migrator up      - Apply the ledger schema
//!   migrator down    - Drop the ledger schema
//!   migrator status  - Show which migrations have run
//!   migrator fresh   - Drop everything and re-apply

use ikimina_db::migration::Migrator;
use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Reads DATABASE_URL and sets up its own tracing.
    cli::run_cli(Migrator).await;
}
