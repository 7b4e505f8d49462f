//! # Order Repository
//!
//! Orders, their frozen lines and the conditional status transitions.
//!
//! ## Status Transitions
//! ```text
//! mark_completed     UPDATE ... SET status = 'completed' WHERE status = 'pending'
//! mark_cancelled_on  UPDATE ... SET status = 'cancelled' WHERE status = 'pending'
//! ```
//! Zero rows affected means the order was missing or already terminal;
//! callers re-read to tell which. Of two concurrent transitions on the same
//! order exactly one affects a row.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use clipper_core::earnings::EarningRecord;
use clipper_core::{Order, OrderLine, OrderStatus};

/// Header row of an order, before its lines are attached.
#[derive(Debug, FromRow)]
struct OrderRow {
    id: String,
    user_id: String,
    status: OrderStatus,
    price_cents: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, lines: Vec<OrderLine>) -> Order {
        Order {
            id: self.id,
            user_id: self.user_id,
            status: self.status,
            lines,
            price_cents: self.price_cents,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Gets an order with its lines.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        Self::get_on(&mut conn, id).await
    }

    /// Orders placed by `user_id`, newest first.
    pub async fn list_for_user(&self, user_id: &str) -> DbResult<Vec<Order>> {
        let mut conn = self.pool.acquire().await?;

        let rows = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, user_id, status, price_cents, created_at, updated_at
            FROM orders
            WHERE user_id = ?1
            ORDER BY created_at DESC, id
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let lines = Self::lines_on(&mut conn, &row.id).await?;
            orders.push(row.into_order(lines));
        }

        Ok(orders)
    }

    /// Moves a pending order to Completed.
    ///
    /// Returns `false` if the order is missing or not pending.
    pub async fn mark_completed(&self, id: &str, now: DateTime<Utc>) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = 'completed',
                updated_at = ?2
            WHERE id = ?1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        debug!(order_id = %id, rows = result.rows_affected(), "Mark completed");
        Ok(result.rows_affected() == 1)
    }

    /// Completed-order earnings records created in `from..=to`.
    pub async fn earning_records(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<Vec<EarningRecord>> {
        let records = sqlx::query_as::<_, EarningRecord>(
            r#"
            SELECT created_on AS day, COALESCE(price_cents, 0) AS amount_cents
            FROM orders
            WHERE status = 'completed'
              AND created_on BETWEEN ?1 AND ?2
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    // =========================================================================
    // Connection-scoped operations
    // =========================================================================

    /// Gets an order with its lines, read on `conn`.
    pub async fn get_on(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, user_id, status, price_cents, created_at, updated_at
            FROM orders
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        match row {
            Some(row) => {
                let lines = Self::lines_on(conn, &row.id).await?;
                Ok(Some(row.into_order(lines)))
            }
            None => Ok(None),
        }
    }

    /// The persisted lines of an order, in the order they were requested.
    pub async fn lines_on(conn: &mut SqliteConnection, order_id: &str) -> DbResult<Vec<OrderLine>> {
        let lines = sqlx::query_as::<_, OrderLine>(
            r#"
            SELECT product_id, name_snapshot, unit_price_cents, quantity
            FROM order_items
            WHERE order_id = ?1
            ORDER BY position
            "#,
        )
        .bind(order_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(lines)
    }

    /// Writes an order header and all of its lines on `conn`.
    pub async fn insert_on(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
        debug!(
            id = %order.id,
            user_id = %order.user_id,
            lines = order.lines.len(),
            "Inserting order"
        );

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, user_id, status, price_cents, created_at, created_on, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&order.id)
        .bind(&order.user_id)
        .bind(order.status)
        .bind(order.price_cents)
        .bind(order.created_at)
        .bind(order.created_at.date_naive())
        .bind(order.updated_at)
        .execute(&mut *conn)
        .await?;

        for (position, line) in order.lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    order_id, position, product_id, name_snapshot, unit_price_cents, quantity
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(&order.id)
            .bind(i64::try_from(position).unwrap_or(i64::MAX))
            .bind(&line.product_id)
            .bind(&line.name_snapshot)
            .bind(line.unit_price_cents)
            .bind(line.quantity)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    /// Moves a pending order to Cancelled on `conn`.
    ///
    /// Returns `false` if the order is missing or not pending.
    pub async fn mark_cancelled_on(
        conn: &mut SqliteConnection,
        id: &str,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = 'cancelled',
                updated_at = ?2
            WHERE id = ?1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        debug!(order_id = %id, rows = result.rows_affected(), "Mark cancelled");
        Ok(result.rows_affected() == 1)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{fixtures, generate_id};
    use crate::Database;
    use clipper_core::Role;

    async fn order_for(db: &Database, status: OrderStatus) -> Order {
        let user = fixtures::user(db, "Cli", Role::Client).await;
        let pomade = fixtures::product(db, 1250, 10).await;
        let comb = fixtures::product(db, 300, 10).await;
        let now = Utc::now();

        let order = Order {
            id: generate_id(),
            user_id: user.id,
            status,
            lines: vec![
                OrderLine {
                    product_id: pomade.id,
                    name_snapshot: "Pomade".to_string(),
                    unit_price_cents: 1250,
                    quantity: 2,
                },
                OrderLine {
                    product_id: comb.id,
                    name_snapshot: "Comb".to_string(),
                    unit_price_cents: 300,
                    quantity: 1,
                },
            ],
            price_cents: Some(2800),
            created_at: now,
            updated_at: now,
        };

        let mut tx = db.begin().await.unwrap();
        OrderRepository::insert_on(&mut tx, &order).await.unwrap();
        tx.commit().await.unwrap();
        order
    }

    #[tokio::test]
    async fn test_insert_and_get_keeps_line_order() {
        let db = fixtures::db().await;
        let order = order_for(&db, OrderStatus::Pending).await;

        let stored = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.lines, order.lines);
        assert_eq!(stored.price_cents, Some(2800));
        assert_eq!(stored.status, OrderStatus::Pending);

        assert!(db.orders().get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_transitions_only_from_pending() {
        let db = fixtures::db().await;
        let order = order_for(&db, OrderStatus::Pending).await;

        assert!(db.orders().mark_completed(&order.id, Utc::now()).await.unwrap());
        assert!(!db.orders().mark_completed(&order.id, Utc::now()).await.unwrap());

        let mut conn = db.pool().acquire().await.unwrap();
        assert!(!OrderRepository::mark_cancelled_on(&mut conn, &order.id, Utc::now())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_rolled_back_insert_leaves_nothing() {
        let db = fixtures::db().await;
        let user = fixtures::user(&db, "Cli", Role::Client).await;
        let now = Utc::now();
        let order = Order {
            id: generate_id(),
            user_id: user.id.clone(),
            status: OrderStatus::Pending,
            lines: Vec::new(),
            price_cents: Some(0),
            created_at: now,
            updated_at: now,
        };

        {
            let mut tx = db.begin().await.unwrap();
            OrderRepository::insert_on(&mut tx, &order).await.unwrap();
            tx.rollback().await.unwrap();
        }

        assert!(db.orders().get_by_id(&order.id).await.unwrap().is_none());
        assert!(db.orders().list_for_user(&user.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_earning_records_only_completed() {
        let db = fixtures::db().await;
        let paid = order_for(&db, OrderStatus::Pending).await;
        order_for(&db, OrderStatus::Pending).await;
        db.orders().mark_completed(&paid.id, Utc::now()).await.unwrap();

        let today = Utc::now().date_naive();
        let records = db.orders().earning_records(today, today).await.unwrap();
        assert_eq!(records, vec![EarningRecord::new(today, 2800)]);
    }
}
