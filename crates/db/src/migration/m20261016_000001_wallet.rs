//! Wallet schema: users with balances and two-phase top-up transactions.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(WALLET_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            r"
DROP TABLE IF EXISTS wallet_transactions CASCADE;
DROP TABLE IF EXISTS wallet_users CASCADE;
DROP TYPE IF EXISTS wallet_transaction_status;
",
        )
        .await?;
        Ok(())
    }
}

const WALLET_SQL: &str = r"
CREATE TYPE wallet_transaction_status AS ENUM ('verified', 'completed');

CREATE TABLE wallet_users (
    id UUID PRIMARY KEY,
    balance NUMERIC(14, 2) NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE wallet_transactions (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL REFERENCES wallet_users(id) ON DELETE CASCADE,
    amount NUMERIC(14, 2) NOT NULL,
    payment_method VARCHAR(64) NOT NULL,
    status wallet_transaction_status NOT NULL DEFAULT 'verified',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    expires_at TIMESTAMPTZ NOT NULL,
    completed_at TIMESTAMPTZ,
    CONSTRAINT chk_amount_positive CHECK (amount > 0),
    CONSTRAINT chk_payment_method_present CHECK (length(trim(payment_method)) > 0),
    CONSTRAINT chk_completed_at CHECK ((status = 'completed') = (completed_at IS NOT NULL))
);

-- User's transaction history
CREATE INDEX idx_wallet_transactions_user ON wallet_transactions(user_id, created_at DESC);

-- Purge of abandoned verified transactions
CREATE INDEX idx_wallet_transactions_pending_expiry
    ON wallet_transactions(status, expires_at)
    WHERE status = 'verified';
";
