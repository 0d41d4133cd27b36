//! Voucher counter access
//!
//! One row per (region, voucher type, fiscal year). The row is created
//! lazily at zero and only ever advanced by `commit_next`, which runs
//! inside the same transaction as the ledger insert.

use shared::models::VoucherCounter;
use sqlx::{SqliteConnection, SqlitePool};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Insert a zero-initialized counter row if the key has none. Idempotent.
pub async fn ensure_row(
    pool: &SqlitePool,
    region: &str,
    voucher_type: &str,
    fiscal_year: &str,
) -> Result<(), sqlx::Error> {
    let now = shared::util::now_millis();
    sqlx::query(
        "INSERT INTO voucher_counter (region, voucher_type, fiscal_year, current_no, created_at, updated_at)
         VALUES (?1, ?2, ?3, 0, ?4, ?4) ON CONFLICT DO NOTHING",
    )
    .bind(region)
    .bind(voucher_type)
    .bind(fiscal_year)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

/// Last committed number for the key (0 for a fresh row).
///
/// Only a read taken under the sequence lock may be used as the basis
/// for a commit.
pub async fn read_current(
    pool: &SqlitePool,
    region: &str,
    voucher_type: &str,
    fiscal_year: &str,
) -> Result<i64, sqlx::Error> {
    let current: Option<i64> = sqlx::query_scalar(
        "SELECT current_no FROM voucher_counter
         WHERE region = ?1 AND voucher_type = ?2 AND fiscal_year = ?3",
    )
    .bind(region)
    .bind(voucher_type)
    .bind(fiscal_year)
    .fetch_optional(pool)
    .await?;
    Ok(current.unwrap_or(0))
}

/// Advance the counter to `next` inside the caller's transaction.
///
/// The update is guarded by `current_no = next - 1`; anything other than
/// exactly one affected row means the row vanished or the counter moved
/// underneath the lock, and must abort the enclosing transaction.
pub async fn commit_next(
    conn: &mut SqliteConnection,
    region: &str,
    voucher_type: &str,
    fiscal_year: &str,
    next: i64,
) -> Result<(), BoxError> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE voucher_counter SET current_no = ?1, updated_at = ?2
         WHERE region = ?3 AND voucher_type = ?4 AND fiscal_year = ?5 AND current_no = ?6",
    )
    .bind(next)
    .bind(now)
    .bind(region)
    .bind(voucher_type)
    .bind(fiscal_year)
    .bind(next - 1)
    .execute(&mut *conn)
    .await?;

    if rows.rows_affected() != 1 {
        return Err(format!(
            "voucher counter {region}/{voucher_type} missing or moved (expected current_no {})",
            next - 1
        )
        .into());
    }
    Ok(())
}

/// All counter rows, for the inspection API
pub async fn list(pool: &SqlitePool) -> Result<Vec<VoucherCounter>, sqlx::Error> {
    sqlx::query_as::<_, VoucherCounter>(
        "SELECT region, voucher_type, fiscal_year, current_no, created_at, updated_at
         FROM voucher_counter ORDER BY region, voucher_type, fiscal_year",
    )
    .fetch_all(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_in_memory;

    #[tokio::test]
    async fn test_ensure_row_is_idempotent() {
        let pool = connect_in_memory().await.unwrap();

        ensure_row(&pool, "nepal", "sales", "").await.unwrap();
        ensure_row(&pool, "nepal", "sales", "").await.unwrap();

        assert_eq!(read_current(&pool, "nepal", "sales", "").await.unwrap(), 0);
        assert_eq!(list(&pool).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_commit_next_advances_counter() {
        let pool = connect_in_memory().await.unwrap();
        ensure_row(&pool, "nepal", "sales", "").await.unwrap();

        let mut tx = pool.begin().await.unwrap();
        commit_next(&mut tx, "nepal", "sales", "", 1).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(read_current(&pool, "nepal", "sales", "").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_commit_next_fails_on_missing_row() {
        let pool = connect_in_memory().await.unwrap();

        let mut tx = pool.begin().await.unwrap();
        let result = commit_next(&mut tx, "nepal", "sales", "", 1).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_commit_next_fails_on_moved_counter() {
        let pool = connect_in_memory().await.unwrap();
        ensure_row(&pool, "nepal", "sales", "").await.unwrap();

        let mut tx = pool.begin().await.unwrap();
        commit_next(&mut tx, "nepal", "sales", "", 1).await.unwrap();
        tx.commit().await.unwrap();

        // A second commit based on the stale read (current_no = 0) must fail
        let mut tx = pool.begin().await.unwrap();
        let result = commit_next(&mut tx, "nepal", "sales", "", 1).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_counters_are_independent_per_key() {
        let pool = connect_in_memory().await.unwrap();
        ensure_row(&pool, "nepal", "sales", "").await.unwrap();
        ensure_row(&pool, "nepal", "sales", "2082/83").await.unwrap();

        let mut tx = pool.begin().await.unwrap();
        commit_next(&mut tx, "nepal", "sales", "", 1).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(read_current(&pool, "nepal", "sales", "").await.unwrap(), 1);
        assert_eq!(
            read_current(&pool, "nepal", "sales", "2082/83").await.unwrap(),
            0
        );
    }
}
