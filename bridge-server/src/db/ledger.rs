//! Idempotency ledger access
//!
//! Append-only mapping of idempotency key to the accepted voucher
//! number. A row is written only inside the commit transaction, after
//! the destination confirmed acceptance of that exact number.

use shared::models::IdempotencyRecord;
use sqlx::{SqliteConnection, SqlitePool};

/// Previously committed record for a key, if any
pub async fn lookup(
    pool: &SqlitePool,
    idempotency_key: &str,
) -> Result<Option<IdempotencyRecord>, sqlx::Error> {
    sqlx::query_as::<_, IdempotencyRecord>(
        "SELECT idempotency_key, region, voucher_type, voucher_no, created_at
         FROM idempotency_record WHERE idempotency_key = ?1",
    )
    .bind(idempotency_key)
    .fetch_optional(pool)
    .await
}

/// Record a committed mapping inside the caller's transaction.
///
/// Plain INSERT: the lookup-first protocol means a duplicate key can only
/// happen if the protocol was violated, so the primary-key conflict is
/// left to fail loudly rather than being swallowed with ON CONFLICT.
pub async fn record(
    conn: &mut SqliteConnection,
    idempotency_key: &str,
    region: &str,
    voucher_type: &str,
    voucher_no: &str,
) -> Result<(), sqlx::Error> {
    let now = shared::util::now_millis();
    sqlx::query(
        "INSERT INTO idempotency_record (idempotency_key, region, voucher_type, voucher_no, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(idempotency_key)
    .bind(region)
    .bind(voucher_type)
    .bind(voucher_no)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_in_memory;

    #[tokio::test]
    async fn test_lookup_missing_key() {
        let pool = connect_in_memory().await.unwrap();
        assert!(lookup(&pool, "k-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_record_then_lookup() {
        let pool = connect_in_memory().await.unwrap();

        let mut tx = pool.begin().await.unwrap();
        record(&mut tx, "k-1", "nepal", "sales", "AQNS/001")
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let found = lookup(&pool, "k-1").await.unwrap().unwrap();
        assert_eq!(found.voucher_no, "AQNS/001");
        assert_eq!(found.region, "nepal");
        assert_eq!(found.voucher_type, "sales");
    }

    #[tokio::test]
    async fn test_duplicate_key_fails_loudly() {
        let pool = connect_in_memory().await.unwrap();

        let mut tx = pool.begin().await.unwrap();
        record(&mut tx, "k-1", "nepal", "sales", "AQNS/001")
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let mut tx = pool.begin().await.unwrap();
        let result = record(&mut tx, "k-1", "nepal", "sales", "AQNS/002").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_rollback_leaves_no_row() {
        let pool = connect_in_memory().await.unwrap();

        let mut tx = pool.begin().await.unwrap();
        record(&mut tx, "k-1", "nepal", "sales", "AQNS/001")
            .await
            .unwrap();
        tx.rollback().await.unwrap();

        assert!(lookup(&pool, "k-1").await.unwrap().is_none());
    }
}
