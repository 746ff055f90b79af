//! Concurrency control primitives
//!
//! The canonical wallet ordering lives here. Every locker — the distributed
//! lock and the database row locks — must derive its order from
//! [`sort_unique_wallet_ids`]; agreeing on one order is what rules out
//! deadlock between mutations over overlapping wallet sets.

use uuid::Uuid;

use crate::error::AppError;

/// Deduplicate and sort wallet ids ascending by their canonical string form.
pub fn sort_unique_wallet_ids(ids: &[Uuid]) -> Vec<Uuid> {
    let mut sorted: Vec<Uuid> = ids.to_vec();
    sorted.sort_by_key(|id| id.to_string());
    sorted.dedup();
    sorted
}

/// Derive distributed-lock keys (`lock:wallet:{id}`) in canonical order.
pub fn wallet_lock_keys(ids: &[Uuid]) -> Vec<String> {
    sort_unique_wallet_ids(ids)
        .iter()
        .map(|id| format!("lock:wallet:{}", id))
        .collect()
}

/// Result of one conditional version bump.
#[derive(Debug, Clone, Copy)]
pub struct OptimisticUpdate {
    pub wallet_id: Uuid,
    pub updated_count: u64,
}

/// Verify that every conditional version bump touched exactly one row.
///
/// Any other count means a concurrent writer moved the version between our
/// row lock and update, and the whole transaction must roll back.
pub fn assert_optimistic_updates(results: &[OptimisticUpdate]) -> Result<(), AppError> {
    for result in results {
        if result.updated_count != 1 {
            return Err(AppError::optimistic_conflict(result.wallet_id)
                .with_details(serde_json::json!({ "walletId": result.wallet_id })));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(s: &str) -> Uuid {
        Uuid::parse_str(s).unwrap()
    }

    #[test]
    fn test_sort_is_deterministic_and_deduplicates() {
        let a = uid("00000000-0000-0000-0000-00000000000a");
        let b = uid("00000000-0000-0000-0000-00000000000b");
        let sorted = sort_unique_wallet_ids(&[b, a, b, a]);
        assert_eq!(sorted, vec![a, b]);

        // Order of input never changes the output
        assert_eq!(sort_unique_wallet_ids(&[a, b]), sort_unique_wallet_ids(&[b, a]));
    }

    #[test]
    fn test_lock_key_derivation() {
        let a = uid("00000000-0000-0000-0000-00000000000a");
        let b = uid("00000000-0000-0000-0000-00000000000b");
        let keys = wallet_lock_keys(&[b, a]);
        assert_eq!(
            keys,
            vec![
                format!("lock:wallet:{}", a),
                format!("lock:wallet:{}", b),
            ]
        );
    }

    #[test]
    fn test_empty_input_yields_no_keys() {
        assert!(wallet_lock_keys(&[]).is_empty());
    }

    #[test]
    fn test_optimistic_assert_passes_on_single_updates() {
        let results = [
            OptimisticUpdate { wallet_id: Uuid::new_v4(), updated_count: 1 },
            OptimisticUpdate { wallet_id: Uuid::new_v4(), updated_count: 1 },
        ];
        assert!(assert_optimistic_updates(&results).is_ok());
    }

    #[test]
    fn test_optimistic_assert_names_offending_wallet() {
        let loser = Uuid::new_v4();
        let results = [
            OptimisticUpdate { wallet_id: Uuid::new_v4(), updated_count: 1 },
            OptimisticUpdate { wallet_id: loser, updated_count: 0 },
        ];
        let err = assert_optimistic_updates(&results).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::OptimisticLockConflict);
        assert_eq!(
            err.details.unwrap()["walletId"],
            serde_json::json!(loser)
        );
    }
}
