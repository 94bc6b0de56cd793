//! Initial database migration.
//!
//! Creates the member, journal, loan and dividend tables together with the
//! check constraints that back the ledger invariants.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: MEMBERS & SAVINGS JOURNAL
        // ============================================================
        db.execute_unprepared(MEMBERS_SQL).await?;
        db.execute_unprepared(CONTRIBUTIONS_SQL).await?;

        // ============================================================
        // PART 3: LOANS
        // ============================================================
        db.execute_unprepared(LOANS_SQL).await?;
        db.execute_unprepared(REPAYMENTS_SQL).await?;

        // ============================================================
        // PART 4: DIVIDENDS
        // ============================================================
        db.execute_unprepared(DIVIDENDS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
CREATE TYPE loan_status AS ENUM (
    'pending',
    'approved',
    'declined',
    'active',
    'closed'
);

CREATE TYPE dividend_basis AS ENUM (
    'shares',
    'contributions'
);
";

const MEMBERS_SQL: &str = r"
CREATE TABLE members (
    id UUID PRIMARY KEY,
    name VARCHAR(255) NOT NULL CHECK (btrim(name) <> ''),
    phone VARCHAR(32) NOT NULL CHECK (btrim(phone) <> ''),
    shares INTEGER NOT NULL DEFAULT 0 CHECK (shares >= 0),
    savings_balance NUMERIC(19, 4) NOT NULL DEFAULT 0 CHECK (savings_balance >= 0),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_members_name ON members (name);
";

const CONTRIBUTIONS_SQL: &str = r"
CREATE TABLE contributions (
    id UUID PRIMARY KEY,
    member_id UUID NOT NULL REFERENCES members (id),
    contribution_date DATE NOT NULL,
    amount NUMERIC(19, 4) NOT NULL CHECK (amount > 0),
    note TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_contributions_member_date
    ON contributions (member_id, contribution_date DESC, id DESC);
";

const LOANS_SQL: &str = r"
CREATE TABLE loans (
    id UUID PRIMARY KEY,
    member_id UUID NOT NULL REFERENCES members (id),
    principal NUMERIC(19, 4) NOT NULL CHECK (principal > 0),
    term_months INTEGER NOT NULL CHECK (term_months > 0),
    interest_rate NUMERIC(9, 6) NOT NULL CHECK (interest_rate >= 0),
    note TEXT,
    status loan_status NOT NULL DEFAULT 'pending',
    applied_date DATE NOT NULL,
    approved_date DATE,
    decided_by UUID,
    outstanding_balance NUMERIC(19, 4) NOT NULL,
    next_due_date DATE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_loans_outstanding_range
        CHECK (outstanding_balance >= 0 AND outstanding_balance <= principal),
    CONSTRAINT chk_loans_pending_untouched
        CHECK (status <> 'pending' OR (approved_date IS NULL AND outstanding_balance = principal)),
    CONSTRAINT chk_loans_closed_iff_repaid
        CHECK ((status = 'closed') = (outstanding_balance = 0)),
    CONSTRAINT chk_loans_closed_no_due_date
        CHECK (status <> 'closed' OR next_due_date IS NULL)
);

CREATE INDEX idx_loans_member ON loans (member_id, applied_date DESC);
CREATE INDEX idx_loans_due ON loans (next_due_date)
    WHERE status IN ('approved', 'active');
";

const REPAYMENTS_SQL: &str = r"
CREATE TABLE repayments (
    id UUID PRIMARY KEY,
    loan_id UUID NOT NULL REFERENCES loans (id),
    repayment_date DATE NOT NULL,
    amount NUMERIC(19, 4) NOT NULL CHECK (amount > 0),
    recorded_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_repayments_loan_date
    ON repayments (loan_id, repayment_date DESC, id DESC);
";

const DIVIDENDS_SQL: &str = r"
CREATE TABLE dividend_runs (
    id UUID PRIMARY KEY,
    year INTEGER NOT NULL,
    basis dividend_basis NOT NULL,
    total_profit NUMERIC(19, 4) NOT NULL CHECK (total_profit >= 0),
    computed_on DATE NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_dividend_runs_year ON dividend_runs (year DESC);

CREATE TABLE dividend_records (
    run_id UUID NOT NULL REFERENCES dividend_runs (id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    member_id UUID NOT NULL REFERENCES members (id),
    member_name VARCHAR(255) NOT NULL,
    basis_value NUMERIC NOT NULL CHECK (basis_value >= 0),
    percent NUMERIC NOT NULL CHECK (percent >= 0 AND percent <= 1),
    dividend NUMERIC(19, 4) NOT NULL,
    PRIMARY KEY (run_id, position)
);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS dividend_records;
DROP TABLE IF EXISTS dividend_runs;
DROP TABLE IF EXISTS repayments;
DROP TABLE IF EXISTS loans;
DROP TABLE IF EXISTS contributions;
DROP TABLE IF EXISTS members;
DROP TYPE IF EXISTS dividend_basis;
DROP TYPE IF EXISTS loan_status;
";
