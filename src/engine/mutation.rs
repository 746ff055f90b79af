//! Mutation execution pipeline
//!
//! Every mutation runs the same sequence: cache gate, context resolution,
//! cross-instance lock, then a single database transaction that inserts or
//! replays the idempotency row, row-locks the wallets in canonical order,
//! checks the source balance, posts the two ledger legs, and bumps wallet
//! versions under the optimistic predicate. The commit is the linearization
//! point; the cache write-through happens strictly after it.

use axum::http::StatusCode;

use crate::amount::format_amount;
use crate::cache::CachedResponse;
use crate::concurrency::{OptimisticUpdate, assert_optimistic_updates, sort_unique_wallet_ids};
use crate::error::{AppError, ErrorCode};
use crate::store::models::{AssetType, TransactionStatus, TransactionType, Wallet, TREASURY};
use crate::store::{
    AssetTypeRepository, InsertOutcome, LedgerEntryRepository, NewTransaction,
    TransactionRepository, WalletRepository,
};

use super::WalletEngine;
use super::types::{MutationOutcome, MutationRequest, SuccessPayload};

pub(super) async fn execute(
    engine: &WalletEngine,
    tx_type: TransactionType,
    req: MutationRequest,
) -> Result<MutationOutcome, AppError> {
    if req.idempotency_key.is_empty() {
        return Err(AppError::idempotency_key_missing());
    }
    if req.request_fingerprint.is_empty() {
        return Err(AppError::idempotency_context_missing());
    }

    // 1. Fast replay gate. Advisory only: a miss falls through to the
    //    authoritative transactions row inside the DB transaction.
    if let Some(cached) = engine.cache.get(&req.idempotency_key).await {
        if cached.fingerprint != req.request_fingerprint {
            return Err(AppError::idempotency_key_reused());
        }
        tracing::debug!(
            idempotency_key = %req.idempotency_key,
            "Replaying mutation from idempotency cache"
        );
        return Ok(MutationOutcome {
            status_code: cached.status_code,
            body: cached.body,
            replayed: true,
        });
    }

    // 2. Context resolution
    let asset_code = req.asset_code.to_uppercase();
    let asset = AssetTypeRepository::get_by_code(engine.db.pool(), &asset_code)
        .await?
        .ok_or_else(|| AppError::asset_type_not_found(&asset_code))?;

    let user_wallet = WalletRepository::get_user_wallet(engine.db.pool(), req.user_id, asset.id)
        .await?
        .ok_or_else(|| AppError::user_wallet_not_found(&asset_code))?;

    let treasury_wallet = WalletRepository::get_system_wallet(engine.db.pool(), TREASURY, asset.id)
        .await?
        .ok_or_else(|| AppError::treasury_not_configured(&asset_code))?;

    // TOPUP / BONUS credit the user from TREASURY; SPEND flows back.
    let (source, destination) = match tx_type {
        TransactionType::Topup | TransactionType::Bonus => (&treasury_wallet, &user_wallet),
        TransactionType::Spend => (&user_wallet, &treasury_wallet),
    };

    // 3. Cross-instance lock over both wallets, released on every exit path.
    let guard = engine.lock.acquire(&[source.id, destination.id]).await?;
    let result = run_transaction(engine, tx_type, &req, &asset, &user_wallet, source, destination).await;
    guard.release().await;

    // 4. Write-through after commit: every Ok outcome is authoritative
    //    (posted, failed-and-persisted, or replayed from the row).
    if let Ok(outcome) = &result {
        engine
            .cache
            .put(
                &req.idempotency_key,
                &CachedResponse {
                    fingerprint: req.request_fingerprint.clone(),
                    status_code: outcome.status_code,
                    body: outcome.body.clone(),
                },
            )
            .await;
    }

    result
}

#[allow(clippy::too_many_arguments)]
async fn run_transaction(
    engine: &WalletEngine,
    tx_type: TransactionType,
    req: &MutationRequest,
    asset: &AssetType,
    user_wallet: &Wallet,
    source: &Wallet,
    destination: &Wallet,
) -> Result<MutationOutcome, AppError> {
    let mut tx = engine.db.begin_mutation().await?;

    // a. Insert-or-replay on the idempotency key. The unique index makes
    //    exactly one concurrent first-timer win.
    let new = NewTransaction {
        idempotency_key: &req.idempotency_key,
        request_fingerprint: &req.request_fingerprint,
        tx_type,
        amount: req.amount,
        asset_type_id: asset.id,
        source_wallet_id: source.id,
        destination_wallet_id: destination.id,
    };

    let record = match TransactionRepository::insert_processing(&mut tx, &new).await? {
        InsertOutcome::Inserted(record) => record,
        InsertOutcome::DuplicateKey => {
            let existing = TransactionRepository::get_by_idempotency_key(&mut tx, &req.idempotency_key)
                .await?
                .ok_or_else(|| AppError::idempotency_state_not_found(&req.idempotency_key))?;

            if existing.request_fingerprint != req.request_fingerprint {
                return Err(AppError::idempotency_key_reused());
            }

            return match (existing.response_code, existing.response_body) {
                (Some(code), Some(body)) => {
                    tx.rollback().await?;
                    tracing::info!(
                        idempotency_key = %req.idempotency_key,
                        transaction_id = %existing.id,
                        "Replaying mutation from transaction row"
                    );
                    Ok(MutationOutcome {
                        status_code: code as u16,
                        body,
                        replayed: true,
                    })
                }
                // PROCESSING row without a response: the first attempt is
                // still inside its critical section (or crashed there).
                _ => Err(AppError::request_in_progress()),
            };
        }
    };

    // b. Row-lock both wallets in canonical order.
    let ordered = sort_unique_wallet_ids(&[source.id, destination.id]);
    let locked = WalletRepository::lock_rows(&mut tx, &ordered).await?;
    if locked.len() != ordered.len() {
        return Err(AppError::locked_wallet_mismatch(ordered.len(), locked.len()));
    }

    // c. Balance check on the locked source wallet.
    let source_balance = LedgerEntryRepository::balance(&mut tx, source.id, asset.id).await?;
    if source_balance < req.amount {
        let failure = AppError::insufficient_funds();
        let body = failure.to_body();
        TransactionRepository::finalize(
            &mut tx,
            record.id,
            TransactionStatus::Failed,
            StatusCode::CONFLICT.as_u16() as i32,
            &body,
            Some(ErrorCode::InsufficientFunds.as_str()),
        )
        .await?;
        tx.commit().await?;

        tracing::info!(
            transaction_id = %record.id,
            idempotency_key = %req.idempotency_key,
            source_balance,
            amount = req.amount,
            "Mutation failed: insufficient funds"
        );
        return Ok(MutationOutcome {
            status_code: StatusCode::CONFLICT.as_u16(),
            body,
            replayed: false,
        });
    }

    // d. Post the double entry.
    LedgerEntryRepository::append_posting(
        &mut tx,
        record.id,
        asset.id,
        source.id,
        destination.id,
        req.amount,
    )
    .await?;

    // e. Bump wallet versions under the optimistic predicate. A conflict
    //    rolls back everything, ledger legs included.
    let mut updates = Vec::with_capacity(locked.len());
    for wallet in &locked {
        let updated_count = WalletRepository::bump_version(&mut tx, wallet.id, wallet.version).await?;
        updates.push(OptimisticUpdate {
            wallet_id: wallet.id,
            updated_count,
        });
    }
    assert_optimistic_updates(&updates)?;

    // f. Compose and persist the success body.
    let user_balance = LedgerEntryRepository::balance(&mut tx, user_wallet.id, asset.id).await?;
    let payload = SuccessPayload {
        transaction_id: record.id,
        idempotency_key: req.idempotency_key.clone(),
        operation: tx_type.operation(),
        user_id: req.user_id,
        asset_code: asset.code.clone(),
        amount: format_amount(req.amount),
        balance: format_amount(user_balance),
        from_wallet_id: source.id,
        to_wallet_id: destination.id,
        created_at: record.created_at,
    };
    let body = serde_json::to_value(&payload)
        .map_err(|e| AppError::internal(format!("Response serialization failed: {}", e)))?;

    TransactionRepository::finalize(
        &mut tx,
        record.id,
        TransactionStatus::Posted,
        StatusCode::OK.as_u16() as i32,
        &body,
        None,
    )
    .await?;

    // g. Commit: the linearization point.
    tx.commit().await?;

    tracing::info!(
        transaction_id = %record.id,
        idempotency_key = %req.idempotency_key,
        operation = tx_type.operation(),
        amount = req.amount,
        "Mutation posted"
    );

    Ok(MutationOutcome {
        status_code: StatusCode::OK.as_u16(),
        body,
        replayed: false,
    })
}
