//! Seeds a demo cooperative for local development.
//!
//! Registers three members with savings, takes one loan through approval and
//! a first repayment, then logs a dividend preview. Skips seeding when the
//! ledger already has members.
//!
//! Usage: cargo run --bin seeder

use chrono::{Datelike, Months, NaiveDate, Utc};
use ikimina_core::dividend::DividendBasis;
use ikimina_core::ledger::{Actor, LedgerEngine, capability};
use ikimina_core::loan::{LoanApplication, LoanDecision};
use ikimina_core::member::NewMember;
use ikimina_db::{SeaOrmStore, migration::Migrator};
use ikimina_shared::AppConfig;
use ikimina_shared::types::PageRequest;
use rust_decimal::Decimal;
use sea_orm_migration::MigratorTrait;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Demo members as (name, phone, shares, opening savings).
const MEMBERS: [(&str, &str, u32, i64); 3] = [
    ("Aline Uwase", "+250788123456", 10, 150_000),
    ("Eric Niyigena", "+250788654321", 6, 90_000),
    ("Claudine Imanishimwe", "+250788777888", 4, 60_000),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ikimina=debug,seeder=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;
    let db = ikimina_db::connect(&config.database).await?;
    Migrator::up(&db, None).await?;
    info!("Schema up to date");

    let engine = LedgerEngine::new(SeaOrmStore::new(db), config.ledger);
    if engine.members(PageRequest::default()).await?.meta.total > 0 {
        info!("Ledger already has members, skipping seed");
        return Ok(());
    }

    let today = Utc::now().date_naive();
    let joined_on = today.checked_sub_months(Months::new(12)).unwrap_or(today);

    let mut members = Vec::with_capacity(MEMBERS.len());
    for (name, phone, shares, opening) in MEMBERS {
        let member = engine
            .register_member(NewMember {
                name: name.to_string(),
                phone: phone.to_string(),
                shares,
                opening_savings: Decimal::from(opening),
                joined_on,
            })
            .await?;
        info!(member_id = %member.id, name, "Seeded member");
        members.push(member);
    }

    let chair = Actor::new(members[0].id, "chair")
        .with_capability(capability::ADMIN)
        .with_capability(capability::APPROVE_LOAN);

    for member in &members {
        engine
            .record_contribution(member.id, Decimal::from(20_000), month_start(today), None)
            .await?;
    }

    let borrower = &members[1];
    let loan = engine
        .apply_loan(LoanApplication {
            member_id: borrower.id,
            principal: Decimal::from(300_000),
            term_months: 6,
            interest_rate: Decimal::new(2, 2),
            note: Some("Stock for the shop".to_string()),
        })
        .await?;
    engine
        .decide_loan(loan.id, LoanDecision::Approve, &chair)
        .await?;
    let receipt = engine
        .record_repayment(
            loan.id,
            Decimal::from(50_000),
            today,
            &Actor::new(borrower.id, "member"),
        )
        .await?;
    info!(
        loan_id = %loan.id,
        outstanding = %receipt.loan.outstanding_balance,
        "Seeded loan"
    );

    let preview = engine
        .compute_dividends(DividendBasis::Shares, Decimal::from(120_000))
        .await?;
    for record in &preview {
        info!(
            member = %record.member_name,
            percent = %record.percent.round_dp(4),
            dividend = %record.dividend,
            "Dividend preview"
        );
    }

    info!("Seeding complete");
    Ok(())
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day0(0).unwrap_or(date)
}
