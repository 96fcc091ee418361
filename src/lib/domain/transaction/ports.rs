use std::future::Future;

use crate::domain::device::models::device::DeviceId;
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::transaction::models::transaction::{
    CreateDeviceTransactionError, CreateDeviceTransactionRequest, DeleteDeviceTransactionError,
    DeviceTransaction, GetDeviceTransactionError, GetDeviceTransactionsError, TransactionFilter,
    TransactionId, TransactionSortField, UpdateDeviceTransactionError,
    UpdateDeviceTransactionRequest,
};

/// `BookingService` is the public API for device transactions. Every call that changes a
/// transaction's status also brings the booked device's status in line.
pub trait BookingService: Clone + Send + Sync + 'static {
    fn create_device_transaction(
        &self,
        req: &CreateDeviceTransactionRequest,
    ) -> impl Future<Output = Result<DeviceTransaction, CreateDeviceTransactionError>> + Send;

    fn get_device_transactions(
        &self,
        filter: &TransactionFilter,
        page: &PageRequest<TransactionSortField>,
    ) -> impl Future<Output = Result<Page<DeviceTransaction>, GetDeviceTransactionsError>> + Send;

    fn get_device_transaction_by_id(
        &self,
        id: &TransactionId,
    ) -> impl Future<Output = Result<DeviceTransaction, GetDeviceTransactionError>> + Send;

    fn update_device_transaction_by_id(
        &self,
        id: &TransactionId,
        req: &UpdateDeviceTransactionRequest,
    ) -> impl Future<Output = Result<DeviceTransaction, UpdateDeviceTransactionError>> + Send;

    fn delete_device_transaction_by_id(
        &self,
        id: &TransactionId,
    ) -> impl Future<Output = Result<(), DeleteDeviceTransactionError>> + Send;
}

/// `DeviceTransactionRepository` represents a store of device transactions.
///
/// At most one transaction per device may be active (not closed) at any time. Implementations
/// check update and delete rules against the stored record within a single write.
pub trait DeviceTransactionRepository: Send + Sync + Clone + 'static {
    /// Stores a new transaction in [BOOKING_HOLD] issued now. Never touches the device.
    ///
    /// [BOOKING_HOLD]: crate::domain::transaction::models::transaction::TransactionStatus::BookingHold
    fn create_transaction(
        &self,
        req: &CreateDeviceTransactionRequest,
    ) -> impl Future<Output = Result<DeviceTransaction, CreateDeviceTransactionError>> + Send;

    fn get_transaction_by_id(
        &self,
        id: &TransactionId,
    ) -> impl Future<Output = Result<DeviceTransaction, GetDeviceTransactionError>> + Send;

    fn get_active_transaction_for_device(
        &self,
        device_id: &DeviceId,
    ) -> impl Future<Output = Result<Option<DeviceTransaction>, anyhow::Error>> + Send;

    fn get_transactions(
        &self,
        filter: &TransactionFilter,
        page: &PageRequest<TransactionSortField>,
    ) -> impl Future<Output = Result<Page<DeviceTransaction>, GetDeviceTransactionsError>> + Send;

    fn update_transaction_by_id(
        &self,
        id: &TransactionId,
        req: &UpdateDeviceTransactionRequest,
    ) -> impl Future<Output = Result<DeviceTransaction, UpdateDeviceTransactionError>> + Send;

    fn delete_transaction_by_id(
        &self,
        id: &TransactionId,
    ) -> impl Future<Output = Result<(), DeleteDeviceTransactionError>> + Send;
}
