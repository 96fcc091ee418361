use std::future::Future;

use crate::domain::device::models::device::{
    CreateDeviceError, CreateDeviceRequest, DeleteDeviceError, Device, DeviceFilter, DeviceId,
    DeviceSortField, GetDeviceError, GetDevicesError, UpdateDeviceError, UpdateDeviceRequest,
};
use crate::domain::pagination::{Page, PageRequest};

/// `DeviceService` is the public API for the device domain.
pub trait DeviceService: Clone + Send + Sync + 'static {
    fn add_device(
        &self,
        req: &CreateDeviceRequest,
    ) -> impl Future<Output = Result<Device, CreateDeviceError>> + Send;

    fn get_devices(
        &self,
        filter: &DeviceFilter,
        page: &PageRequest<DeviceSortField>,
    ) -> impl Future<Output = Result<Page<Device>, GetDevicesError>> + Send;

    fn get_device_by_id(
        &self,
        id: &DeviceId,
    ) -> impl Future<Output = Result<Device, GetDeviceError>> + Send;

    fn update_device_by_id(
        &self,
        id: &DeviceId,
        req: &UpdateDeviceRequest,
    ) -> impl Future<Output = Result<Device, UpdateDeviceError>> + Send;

    fn delete_device_by_id(
        &self,
        id: &DeviceId,
    ) -> impl Future<Output = Result<(), DeleteDeviceError>> + Send;
}

/// `DeviceRepository` represents a store of device data.
///
/// Serial numbers and hardware UUIDs are unique across all stored devices; a write that would
/// break this must fail without changing anything.
pub trait DeviceRepository: Send + Sync + Clone + 'static {
    fn create_device(
        &self,
        req: &CreateDeviceRequest,
    ) -> impl Future<Output = Result<Device, CreateDeviceError>> + Send;

    fn get_devices(
        &self,
        filter: &DeviceFilter,
        page: &PageRequest<DeviceSortField>,
    ) -> impl Future<Output = Result<Page<Device>, GetDevicesError>> + Send;

    fn get_device_by_id(
        &self,
        id: &DeviceId,
    ) -> impl Future<Output = Result<Device, GetDeviceError>> + Send;

    /// Merges `req` into the stored device. Also the path through which device status changes,
    /// nothing here restricts who sets it.
    fn update_device_by_id(
        &self,
        id: &DeviceId,
        req: &UpdateDeviceRequest,
    ) -> impl Future<Output = Result<Device, UpdateDeviceError>> + Send;

    fn delete_device_by_id(
        &self,
        id: &DeviceId,
    ) -> impl Future<Output = Result<(), DeleteDeviceError>> + Send;
}
