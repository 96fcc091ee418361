use anyhow::{Context, anyhow};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, SqliteConnection};

use crate::domain::auth::models::user::UserId;
use crate::domain::device::models::device::DeviceId;
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::transaction::models::transaction::{
    CreateDeviceTransactionError, CreateDeviceTransactionRequest, DeleteDeviceTransactionError,
    DeviceTransaction, GetDeviceTransactionError, GetDeviceTransactionsError, TransactionFilter,
    TransactionId, TransactionSortField, TransactionStatus, UpdateDeviceTransactionError,
    UpdateDeviceTransactionRequest,
};
use crate::domain::transaction::ports::DeviceTransactionRepository;
use crate::outbound::sqlite::{Sqlite, push_page, unique_constraint_violation};

#[derive(Debug, FromRow)]
struct TransactionRow {
    id: String,
    device_id: String,
    user_id: String,
    issued_on: DateTime<Utc>,
    due_date: DateTime<Utc>,
    submitted_on: Option<DateTime<Utc>>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for DeviceTransaction {
    type Error = anyhow::Error;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        Ok(DeviceTransaction::new(
            TransactionId::new(&row.id)?,
            DeviceId::new(&row.device_id)?,
            UserId::new(&row.user_id)?,
            row.issued_on,
            row.due_date,
            row.submitted_on,
            row.status.parse::<TransactionStatus>()?,
            row.created_at,
            row.updated_at,
        ))
    }
}

const SELECT_TRANSACTIONS: &str = "SELECT id, device_id, user_id, issued_on, due_date, \
     submitted_on, status, created_at, updated_at FROM device_transactions";

fn sort_column(field: TransactionSortField) -> &'static str {
    match field {
        TransactionSortField::IssuedOn => "issued_on",
        TransactionSortField::DueDate => "due_date",
        TransactionSortField::SubmittedOn => "submitted_on",
        TransactionSortField::Status => "status",
        TransactionSortField::CreatedAt => "created_at",
        TransactionSortField::UpdatedAt => "updated_at",
    }
}

fn push_filter(query_builder: &mut QueryBuilder<'_, sqlx::Sqlite>, filter: &TransactionFilter) {
    query_builder.push(" WHERE 1 = 1");

    if let Some(device_id) = filter.device_id() {
        query_builder
            .push(" AND device_id = ")
            .push_bind(device_id.to_string());
    }
    if let Some(user_id) = filter.user_id() {
        query_builder
            .push(" AND user_id = ")
            .push_bind(user_id.to_string());
    }
    if !filter.statuses().is_empty() {
        query_builder.push(" AND status IN (");
        let mut statuses = query_builder.separated(", ");
        for status in filter.statuses() {
            statuses.push_bind(status.as_str());
        }
        statuses.push_unseparated(")");
    }
}

impl Sqlite {
    async fn find_transaction(
        conn: &mut SqliteConnection,
        id: &TransactionId,
    ) -> Result<Option<DeviceTransaction>, anyhow::Error> {
        let row = QueryBuilder::<sqlx::Sqlite>::new(SELECT_TRANSACTIONS)
            .push(" WHERE id = ")
            .push_bind(id.to_string())
            .build_query_as::<TransactionRow>()
            .fetch_optional(conn)
            .await
            .with_context(|| format!("failed to fetch device transaction {}", id))?;

        row.map(DeviceTransaction::try_from).transpose()
    }

    async fn find_active_transaction(
        conn: &mut SqliteConnection,
        device_id: &DeviceId,
    ) -> Result<Option<DeviceTransaction>, anyhow::Error> {
        let row = QueryBuilder::<sqlx::Sqlite>::new(SELECT_TRANSACTIONS)
            .push(" WHERE device_id = ")
            .push_bind(device_id.to_string())
            .push(" AND status != ")
            .push_bind(TransactionStatus::Closed.as_str())
            .build_query_as::<TransactionRow>()
            .fetch_optional(conn)
            .await
            .with_context(|| format!("failed to fetch active transaction of device {}", device_id))?;

        row.map(DeviceTransaction::try_from).transpose()
    }
}

impl DeviceTransactionRepository for Sqlite {
    async fn create_transaction(
        &self,
        req: &CreateDeviceTransactionRequest,
    ) -> Result<DeviceTransaction, CreateDeviceTransactionError> {
        let mut tx = self.begin_write().await?;

        if Self::find_active_transaction(&mut tx, req.device_id())
            .await?
            .is_some()
        {
            return Err(CreateDeviceTransactionError::DeviceAlreadyBooked {
                id: *req.device_id(),
            });
        }

        let id = TransactionId::generate();
        let now = Utc::now();
        let status = TransactionStatus::BookingHold;

        sqlx::query(
            "INSERT INTO device_transactions (id, device_id, user_id, issued_on, due_date, \
             submitted_on, status, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, NULL, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(req.device_id().to_string())
        .bind(req.user_id().to_string())
        .bind(now)
        .bind(*req.due_date())
        .bind(status.as_str())
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if unique_constraint_violation(&e).is_some() {
                CreateDeviceTransactionError::DeviceAlreadyBooked {
                    id: *req.device_id(),
                }
            } else {
                anyhow!(e)
                    .context(format!(
                        "failed to save transaction for device {}",
                        req.device_id()
                    ))
                    .into()
            }
        })?;

        tx.commit()
            .await
            .context("failed to commit SQLite transaction")?;

        Ok(DeviceTransaction::new(
            id,
            *req.device_id(),
            *req.user_id(),
            now,
            *req.due_date(),
            None,
            status,
            now,
            now,
        ))
    }

    async fn get_transaction_by_id(
        &self,
        id: &TransactionId,
    ) -> Result<DeviceTransaction, GetDeviceTransactionError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .context("failed to acquire SQLite connection")?;

        Self::find_transaction(&mut conn, id)
            .await?
            .ok_or(GetDeviceTransactionError::NotFound { id: *id })
    }

    async fn get_active_transaction_for_device(
        &self,
        device_id: &DeviceId,
    ) -> Result<Option<DeviceTransaction>, anyhow::Error> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .context("failed to acquire SQLite connection")?;

        Self::find_active_transaction(&mut conn, device_id).await
    }

    async fn get_transactions(
        &self,
        filter: &TransactionFilter,
        page: &PageRequest<TransactionSortField>,
    ) -> Result<Page<DeviceTransaction>, GetDeviceTransactionsError> {
        let mut count_query = QueryBuilder::new("SELECT COUNT(*) FROM device_transactions");
        push_filter(&mut count_query, filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .context("failed to count device transactions")?;

        let mut query = QueryBuilder::new(SELECT_TRANSACTIONS);
        push_filter(&mut query, filter);
        push_page(&mut query, page, sort_column);
        let rows = query
            .build_query_as::<TransactionRow>()
            .fetch_all(&self.pool)
            .await
            .context("failed to list device transactions")?;

        let transactions = rows
            .into_iter()
            .map(DeviceTransaction::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(
            transactions,
            page,
            u64::try_from(total).unwrap_or_default(),
        ))
    }

    async fn update_transaction_by_id(
        &self,
        id: &TransactionId,
        req: &UpdateDeviceTransactionRequest,
    ) -> Result<DeviceTransaction, UpdateDeviceTransactionError> {
        let mut tx = self.begin_write().await?;

        let current = Self::find_transaction(&mut tx, id)
            .await?
            .ok_or(UpdateDeviceTransactionError::NotFound { id: *id })?;
        let next = current.apply(req, Utc::now())?;

        sqlx::query(
            "UPDATE device_transactions SET due_date = ?, submitted_on = ?, status = ?, \
             updated_at = ? WHERE id = ?",
        )
        .bind(*next.due_date())
        .bind(next.submitted_on().copied())
        .bind(next.status().as_str())
        .bind(*next.updated_at())
        .bind(id.to_string())
        .execute(&mut *tx)
        .await
        .with_context(|| format!("failed to update device transaction {}", id))?;

        tx.commit()
            .await
            .context("failed to commit SQLite transaction")?;

        Ok(next)
    }

    async fn delete_transaction_by_id(
        &self,
        id: &TransactionId,
    ) -> Result<(), DeleteDeviceTransactionError> {
        let mut tx = self.begin_write().await?;

        let current = Self::find_transaction(&mut tx, id)
            .await?
            .ok_or(DeleteDeviceTransactionError::NotFound { id: *id })?;
        current.ensure_deletable()?;

        sqlx::query("DELETE FROM device_transactions WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to delete device transaction {}", id))?;

        tx.commit()
            .await
            .context("failed to commit SQLite transaction")?;

        Ok(())
    }
}
