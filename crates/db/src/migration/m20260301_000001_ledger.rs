//! Ledger schema.
//!
//! Creates accounts, the append-only journal, source document tables and the
//! triggers that keep every journal transaction balanced.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: CHART OF ACCOUNTS
        // ============================================================
        db.execute_unprepared(ACCOUNTS_SQL).await?;

        // ============================================================
        // PART 2: JOURNAL
        // ============================================================
        db.execute_unprepared(LEDGER_COUNTERS_SQL).await?;
        db.execute_unprepared(JOURNAL_TRANSACTIONS_SQL).await?;
        db.execute_unprepared(JOURNAL_LINES_SQL).await?;

        // ============================================================
        // PART 3: SOURCE DOCUMENTS
        // ============================================================
        db.execute_unprepared(TRANSFERS_SQL).await?;
        db.execute_unprepared(PAYMENTS_SQL).await?;
        db.execute_unprepared(EXPENSES_SQL).await?;

        // ============================================================
        // PART 4: TRIGGERS & FUNCTIONS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

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

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id UUID PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    account_type VARCHAR(40) NOT NULL,
    detail_type VARCHAR(255) NOT NULL,
    account_number VARCHAR(50),
    description TEXT,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    is_sub_account BOOLEAN NOT NULL DEFAULT FALSE,
    parent_name VARCHAR(255),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_account_type CHECK (account_type IN (
        'Bank', 'Accounts Receivable', 'Other Current Assets', 'Fixed Assets',
        'Accounts Payable', 'Credit Card', 'Other Current Liabilities',
        'Long-Term Liabilities', 'Equity', 'Income', 'Cost of Goods Sold',
        'Expenses', 'Other Income', 'Other Expenses'
    )),
    CONSTRAINT chk_account_name_not_blank CHECK (length(trim(name)) > 0)
);

CREATE UNIQUE INDEX idx_accounts_name_lower ON accounts (lower(name));
CREATE INDEX idx_accounts_type ON accounts (account_type);
";

const LEDGER_COUNTERS_SQL: &str = r"
-- Gapless entry numbering: the row lock serializes concurrent posters.
CREATE TABLE ledger_counters (
    name VARCHAR(50) PRIMARY KEY,
    value BIGINT NOT NULL
);

INSERT INTO ledger_counters (name, value) VALUES ('journal_entry', 0);
";

const JOURNAL_TRANSACTIONS_SQL: &str = r"
CREATE TABLE journal_transactions (
    id UUID PRIMARY KEY,
    entry_number VARCHAR(20) NOT NULL UNIQUE,
    entry_date DATE NOT NULL,
    memo TEXT,
    source VARCHAR(20) NOT NULL,
    reverses UUID REFERENCES journal_transactions(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_source CHECK (source IN (
        'journal', 'expense', 'payment', 'transfer', 'invoice', 'bill',
        'bill_payment', 'reversal'
    )),
    CONSTRAINT chk_reversal_link CHECK ((source = 'reversal') = (reverses IS NOT NULL))
);

CREATE UNIQUE INDEX idx_journal_transactions_reverses
    ON journal_transactions (reverses) WHERE reverses IS NOT NULL;
CREATE INDEX idx_journal_transactions_date ON journal_transactions (entry_date);
";

const JOURNAL_LINES_SQL: &str = r"
CREATE TABLE journal_lines (
    id UUID PRIMARY KEY,
    transaction_id UUID NOT NULL REFERENCES journal_transactions(id),
    line_no INTEGER NOT NULL,
    account_id UUID NOT NULL REFERENCES accounts(id),
    entry_date DATE NOT NULL,
    amount NUMERIC(19, 2) NOT NULL,
    description TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_amount_non_zero CHECK (amount <> 0),
    UNIQUE (transaction_id, line_no)
);

CREATE INDEX idx_journal_lines_account_date ON journal_lines (account_id, entry_date);
CREATE INDEX idx_journal_lines_date ON journal_lines (entry_date);
";

const TRANSFERS_SQL: &str = r"
CREATE TABLE transfers (
    id UUID PRIMARY KEY,
    from_account_id UUID NOT NULL REFERENCES accounts(id),
    to_account_id UUID NOT NULL REFERENCES accounts(id),
    amount NUMERIC(19, 2) NOT NULL,
    transfer_date DATE NOT NULL,
    memo TEXT,
    transaction_id UUID NOT NULL UNIQUE REFERENCES journal_transactions(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_transfer_amount CHECK (amount > 0),
    CONSTRAINT chk_transfer_accounts CHECK (from_account_id <> to_account_id)
);
";

const PAYMENTS_SQL: &str = r"
CREATE TABLE payments (
    id UUID PRIMARY KEY,
    direction VARCHAR(20) NOT NULL,
    payment_date DATE NOT NULL,
    amount NUMERIC(19, 2) NOT NULL,
    payment_method VARCHAR(20) NOT NULL,
    reference_number VARCHAR(100),
    memo TEXT,
    cash_account_id UUID NOT NULL REFERENCES accounts(id),
    allocations JSONB NOT NULL,
    gateway_reference VARCHAR(255),
    transaction_id UUID NOT NULL UNIQUE REFERENCES journal_transactions(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_payment_amount CHECK (amount > 0),
    CONSTRAINT chk_payment_direction CHECK (direction IN ('received', 'disbursed'))
);

CREATE INDEX idx_payments_date ON payments (payment_date);
";

const EXPENSES_SQL: &str = r"
CREATE TABLE expenses (
    id UUID PRIMARY KEY,
    payee_name VARCHAR(255),
    expense_date DATE NOT NULL,
    expense_account_id UUID NOT NULL REFERENCES accounts(id),
    payment_account_id UUID NOT NULL REFERENCES accounts(id),
    subtotal NUMERIC(19, 2) NOT NULL,
    tax_amount NUMERIC(19, 2) NOT NULL DEFAULT 0,
    total NUMERIC(19, 2) NOT NULL,
    memo TEXT,
    transaction_id UUID NOT NULL UNIQUE REFERENCES journal_transactions(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    deleted_at TIMESTAMPTZ,
    reversal_transaction_id UUID REFERENCES journal_transactions(id),
    CONSTRAINT chk_expense_total CHECK (total = subtotal + tax_amount),
    CONSTRAINT chk_expense_deletion CHECK ((deleted_at IS NULL) = (reversal_transaction_id IS NULL))
);

CREATE INDEX idx_expenses_date ON expenses (expense_date) WHERE deleted_at IS NULL;
";

const TRIGGERS_SQL: &str = r"
-- ============================================================
-- FUNCTION: check_journal_balance
-- Every journal transaction has at least two lines summing to zero
-- ============================================================
CREATE OR REPLACE FUNCTION check_journal_balance()
RETURNS TRIGGER AS $$
DECLARE
    line_total NUMERIC(19, 2);
    line_count INTEGER;
BEGIN
    SELECT COALESCE(SUM(amount), 0), COUNT(*)
    INTO line_total, line_count
    FROM journal_lines
    WHERE transaction_id = NEW.transaction_id;

    IF line_count < 2 THEN
        RAISE EXCEPTION 'Journal transaction % has fewer than 2 lines', NEW.transaction_id;
    END IF;

    IF line_total <> 0 THEN
        RAISE EXCEPTION 'Journal transaction % is not balanced. Difference: %',
            NEW.transaction_id, line_total;
    END IF;

    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE CONSTRAINT TRIGGER trg_check_journal_balance
AFTER INSERT ON journal_lines
DEFERRABLE INITIALLY DEFERRED
FOR EACH ROW
EXECUTE FUNCTION check_journal_balance();

-- ============================================================
-- FUNCTION: prevent_journal_modification
-- The journal is append-only; corrections are reversing entries
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_journal_modification()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION 'Journal rows cannot be modified. Create a reversing entry instead.';
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_journal_transactions_append_only
BEFORE UPDATE OR DELETE ON journal_transactions
FOR EACH ROW
EXECUTE FUNCTION prevent_journal_modification();

CREATE TRIGGER trg_journal_lines_append_only
BEFORE UPDATE OR DELETE ON journal_lines
FOR EACH ROW
EXECUTE FUNCTION prevent_journal_modification();
";

const DROP_ALL_SQL: &str = r"
-- Drop triggers
DROP TRIGGER IF EXISTS trg_journal_lines_append_only ON journal_lines;
DROP TRIGGER IF EXISTS trg_journal_transactions_append_only ON journal_transactions;
DROP TRIGGER IF EXISTS trg_check_journal_balance ON journal_lines;

-- Drop functions
DROP FUNCTION IF EXISTS prevent_journal_modification();
DROP FUNCTION IF EXISTS check_journal_balance();

-- Drop tables (reverse order of creation)
DROP TABLE IF EXISTS expenses;
DROP TABLE IF EXISTS payments;
DROP TABLE IF EXISTS transfers;
DROP TABLE IF EXISTS journal_lines;
DROP TABLE IF EXISTS journal_transactions;
DROP TABLE IF EXISTS ledger_counters;
DROP TABLE IF EXISTS accounts;
";
