use anyhow::{Context, anyhow};
use chrono::Utc;

use crate::domain::device::models::device::{GetDeviceError, UpdateDeviceError, UpdateDeviceRequest};
use crate::domain::device::ports::DeviceRepository;
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::transaction::models::transaction::{
    CreateDeviceTransactionError, CreateDeviceTransactionRequest, DeleteDeviceTransactionError,
    DeviceTransaction, GetDeviceTransactionError, GetDeviceTransactionsError, TransactionFilter,
    TransactionId, TransactionSortField, UpdateDeviceTransactionError,
    UpdateDeviceTransactionRequest,
};
use crate::domain::transaction::ports::{BookingService, DeviceTransactionRepository};

/// Canonical implementation of the [BookingService] port.
///
/// A status change is a two step write: the transaction first, then the device. The steps are
/// not atomic; if the device write fails the transaction keeps its new status and the error is
/// returned. The second step recomputes the device status from the stored transaction, so
/// re-running it on its own is always safe.
#[derive(Debug, Clone)]
pub struct Service<D: DeviceRepository, T: DeviceTransactionRepository> {
    devices: D,
    transactions: T,
}

impl<D: DeviceRepository, T: DeviceTransactionRepository> Service<D, T> {
    pub fn new(devices: D, transactions: T) -> Self {
        Self {
            devices,
            transactions,
        }
    }

    /// Re-reads the transaction and writes the device status its stored status calls for.
    pub async fn sync_device_status(
        &self,
        id: &TransactionId,
    ) -> Result<DeviceTransaction, anyhow::Error> {
        let transaction = self
            .transactions
            .get_transaction_by_id(id)
            .await
            .map_err(|e| anyhow!(e))
            .context("failed to re-read device transaction")?;

        let device_status = transaction.status().device_status();
        let req = UpdateDeviceRequest::default().with_status(device_status);

        self.devices
            .update_device_by_id(transaction.device_id(), &req)
            .await
            .map_err(|e| match e {
                UpdateDeviceError::Unknown(cause) => cause,
                other => anyhow!(other),
            })
            .with_context(|| {
                format!(
                    "failed to set device {} to {}",
                    transaction.device_id(),
                    device_status
                )
            })?;

        tracing::info!(
            transaction_id = %transaction.id(),
            device_id = %transaction.device_id(),
            transaction_status = %transaction.status(),
            %device_status,
            "device status synchronised"
        );

        Ok(transaction)
    }
}

impl<D: DeviceRepository, T: DeviceTransactionRepository> BookingService for Service<D, T> {
    async fn create_device_transaction(
        &self,
        req: &CreateDeviceTransactionRequest,
    ) -> Result<DeviceTransaction, CreateDeviceTransactionError> {
        if *req.due_date() <= Utc::now() {
            return Err(CreateDeviceTransactionError::DueDateNotInFuture);
        }

        let device = self
            .devices
            .get_device_by_id(req.device_id())
            .await
            .map_err(|e| match e {
                GetDeviceError::NotFound { id } => CreateDeviceTransactionError::DeviceNotFound { id },
                GetDeviceError::Unknown(cause) => CreateDeviceTransactionError::Unknown(cause),
            })?;

        // The device flag and the open transaction are checked independently; they can drift.
        if device.status().is_issued() {
            return Err(CreateDeviceTransactionError::DeviceAlreadyBooked { id: *device.id() });
        }
        if self
            .transactions
            .get_active_transaction_for_device(device.id())
            .await?
            .is_some()
        {
            return Err(CreateDeviceTransactionError::DeviceAlreadyBooked { id: *device.id() });
        }

        let transaction = self.transactions.create_transaction(req).await?;
        tracing::info!(
            transaction_id = %transaction.id(),
            device_id = %transaction.device_id(),
            user_id = %transaction.user_id(),
            "device booked"
        );

        self.sync_device_status(transaction.id()).await.map_err(|e| {
            tracing::error!("{:?}", e);
            CreateDeviceTransactionError::Unknown(e)
        })
    }

    async fn get_device_transactions(
        &self,
        filter: &TransactionFilter,
        page: &PageRequest<TransactionSortField>,
    ) -> Result<Page<DeviceTransaction>, GetDeviceTransactionsError> {
        self.transactions.get_transactions(filter, page).await
    }

    async fn get_device_transaction_by_id(
        &self,
        id: &TransactionId,
    ) -> Result<DeviceTransaction, GetDeviceTransactionError> {
        self.transactions.get_transaction_by_id(id).await
    }

    async fn update_device_transaction_by_id(
        &self,
        id: &TransactionId,
        req: &UpdateDeviceTransactionRequest,
    ) -> Result<DeviceTransaction, UpdateDeviceTransactionError> {
        let transaction = self.transactions.update_transaction_by_id(id, req).await?;

        let Some(status) = req.status() else {
            return Ok(transaction);
        };
        tracing::info!(transaction_id = %id, %status, "transaction status changed");

        self.sync_device_status(id).await.map_err(|e| {
            tracing::error!("{:?}", e);
            UpdateDeviceTransactionError::Unknown(e)
        })
    }

    async fn delete_device_transaction_by_id(
        &self,
        id: &TransactionId,
    ) -> Result<(), DeleteDeviceTransactionError> {
        self.transactions.delete_transaction_by_id(id).await?;
        tracing::info!(transaction_id = %id, "device transaction deleted");

        Ok(())
    }
}
