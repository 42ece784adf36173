//! Deposit Indexer
//!
//! Long-running cooperative task that polls the chain API for inbound
//! transfers to the operator's receiving address and turns them into
//! `deposit` ledger entries. An explicit `start`/`stop`-owned worker, not a
//! module-level singleton; `stop` sets a shutdown flag the loop checks at
//! the top of every iteration and then awaits the task's completion.

pub mod client;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::CoreError;
use crate::models::{ChainDepositRecord, DepositStatus, LedgerEntryType, User};
use crate::services::ledger::LedgerService;

use self::client::{ChainClient, ChainTransaction};

const TRANSACTIONS_PER_POLL: u32 = 50;

pub struct DepositIndexer {
    pool: PgPool,
    client: Arc<ChainClient>,
    receiving_address: String,
    poll_interval: Duration,
    deposit_rate: i64,
    min_deposit_chain_units: i64,
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl DepositIndexer {
    pub fn new(
        pool: PgPool,
        client: ChainClient,
        receiving_address: String,
        poll_interval: Duration,
        deposit_rate: i64,
        min_deposit_chain_units: i64,
    ) -> Self {
        Self {
            pool,
            client: Arc::new(client),
            receiving_address,
            poll_interval,
            deposit_rate,
            min_deposit_chain_units,
            shutdown: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    /// Spawns the polling task. A second call while already running is a
    /// no-op.
    pub fn start(&mut self) {
        if self.handle.is_some() {
            warn!("deposit indexer already running");
            return;
        }

        self.shutdown.store(false, Ordering::SeqCst);

        let pool = self.pool.clone();
        let client = Arc::clone(&self.client);
        let address = self.receiving_address.clone();
        let poll_interval = self.poll_interval;
        let deposit_rate = self.deposit_rate;
        let min_units = self.min_deposit_chain_units;
        let shutdown = Arc::clone(&self.shutdown);

        info!(address = %address, interval_secs = poll_interval.as_secs(), "starting deposit indexer");

        self.handle = Some(tokio::spawn(async move {
            while !shutdown.load(Ordering::SeqCst) {
                if let Err(e) = poll_once(&pool, &client, &address, deposit_rate, min_units).await {
                    error!(error = %e, "deposit indexer poll failed");
                }
                tokio::time::sleep(poll_interval).await;
            }
            info!("deposit indexer loop exited");
        }));
    }

    /// Flags the loop to stop and waits for the current iteration to finish.
    pub async fn stop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                error!(error = %e, "deposit indexer task panicked");
            }
        }
        info!("deposit indexer stopped");
    }
}

async fn poll_once(
    pool: &PgPool,
    client: &ChainClient,
    address: &str,
    deposit_rate: i64,
    min_deposit_chain_units: i64,
) -> Result<(), CoreError> {
    let transactions = client.get_transactions(address, TRANSACTIONS_PER_POLL).await?;
    if transactions.is_empty() {
        debug!("no transactions returned by chain API");
        return Ok(());
    }

    let mut processed = 0u32;
    for tx in &transactions {
        match process_transaction(pool, client, tx, deposit_rate, min_deposit_chain_units).await {
            Ok(true) => processed += 1,
            Ok(false) => {}
            Err(e) => error!(tx_hash = %tx.hash, error = %e, "failed to process deposit candidate"),
        }
    }

    if processed > 0 {
        info!(processed, "credited new deposits");
    }
    Ok(())
}

/// Returns `Ok(true)` iff this transaction was a new deposit that got
/// credited.
async fn process_transaction(
    pool: &PgPool,
    client: &ChainClient,
    tx: &ChainTransaction,
    deposit_rate: i64,
    min_deposit_chain_units: i64,
) -> Result<bool, CoreError> {
    if !tx.success || tx.sender.is_empty() {
        return Ok(false);
    }
    if tx.amount_chain_units < min_deposit_chain_units {
        return Ok(false);
    }

    let Some(body) = &tx.body else {
        return Ok(false);
    };
    let Some(external_user_id) = client.parse_deposit_memo(body) else {
        return Ok(false);
    };

    if deposit_rate == 0 {
        warn!(tx_hash = %tx.hash, "deposit rate is not configured, refusing to credit");
        return Ok(false);
    }

    let mut db_tx = pool.begin().await?;

    let already_processed: Option<i64> =
        sqlx::query_scalar("SELECT id FROM chain_deposit_records WHERE tx_hash = $1")
            .bind(&tx.hash)
            .fetch_optional(&mut *db_tx)
            .await?;
    if already_processed.is_some() {
        return Ok(false);
    }

    let user_id = find_or_create_user(&mut db_tx, external_user_id).await?;
    let amount_kopecks = chain_units_to_kopecks(tx.amount_chain_units, deposit_rate);

    let ledger_entry_id =
        LedgerService::append(&mut *db_tx, user_id, amount_kopecks, LedgerEntryType::Deposit, None).await?;

    let record: ChainDepositRecord = sqlx::query_as(
        r#"
        INSERT INTO chain_deposit_records
            (tx_hash, logical_time, sender_address, amount_chain_units, user_id, status, ledger_entry_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(&tx.hash)
    .bind(tx.logical_time)
    .bind(&tx.sender)
    .bind(tx.amount_chain_units)
    .bind(user_id)
    .bind(DepositStatus::Credited)
    .bind(ledger_entry_id)
    .fetch_one(&mut *db_tx)
    .await?;

    db_tx.commit().await?;

    info!(
        tx_hash = %record.tx_hash,
        user_id,
        amount_kopecks,
        "credited chain deposit"
    );

    Ok(true)
}

/// `kopecks = floor(chain_amount / 10^9 * RATE)`, done in i128 to avoid the
/// precision loss a literal floating-point division would introduce.
pub fn chain_units_to_kopecks(amount_chain_units: i64, deposit_rate: i64) -> i64 {
    (amount_chain_units as i128 * deposit_rate as i128 / 1_000_000_000) as i64
}

async fn find_or_create_user(
    db_tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    external_id: i64,
) -> Result<i64, CoreError> {
    let existing: Option<User> = sqlx::query_as("SELECT * FROM users WHERE external_id = $1")
        .bind(external_id)
        .fetch_optional(&mut **db_tx)
        .await?;

    if let Some(user) = existing {
        return Ok(user.id);
    }

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO users (external_id, display_name) VALUES ($1, NULL) RETURNING id",
    )
    .bind(external_id)
    .fetch_one(&mut **db_tx)
    .await?;

    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_whole_chain_units_at_rate_one() {
        // 1 TON (10^9 chain units) at a rate of 100 kopecks per TON.
        assert_eq!(chain_units_to_kopecks(1_000_000_000, 100), 100);
    }

    #[test]
    fn floors_fractional_kopecks() {
        assert_eq!(chain_units_to_kopecks(1_500_000_000, 100), 150);
        assert_eq!(chain_units_to_kopecks(1, 1), 0);
    }

    #[test]
    fn zero_chain_units_credits_nothing() {
        assert_eq!(chain_units_to_kopecks(0, 100), 0);
    }
}
