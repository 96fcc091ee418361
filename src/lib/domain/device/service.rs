use crate::domain::device::models::device::{
    CreateDeviceError, CreateDeviceRequest, DeleteDeviceError, Device, DeviceFilter, DeviceId,
    DeviceSortField, GetDeviceError, GetDevicesError, UpdateDeviceError, UpdateDeviceRequest,
};
use crate::domain::device::ports::{DeviceRepository, DeviceService};
use crate::domain::pagination::{Page, PageRequest};

/// Canonical implementation of the [DeviceService] port, through which the device domain API is
/// consumed.
#[derive(Debug, Clone)]
pub struct Service<R: DeviceRepository> {
    repo: R,
}

impl<R: DeviceRepository> Service<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }
}

impl<R: DeviceRepository> DeviceService for Service<R> {
    async fn add_device(&self, req: &CreateDeviceRequest) -> Result<Device, CreateDeviceError> {
        let device = self.repo.create_device(req).await?;
        tracing::info!(device_id = %device.id(), "device added");

        Ok(device)
    }

    async fn get_devices(
        &self,
        filter: &DeviceFilter,
        page: &PageRequest<DeviceSortField>,
    ) -> Result<Page<Device>, GetDevicesError> {
        self.repo.get_devices(filter, page).await
    }

    async fn get_device_by_id(&self, id: &DeviceId) -> Result<Device, GetDeviceError> {
        self.repo.get_device_by_id(id).await
    }

    async fn update_device_by_id(
        &self,
        id: &DeviceId,
        req: &UpdateDeviceRequest,
    ) -> Result<Device, UpdateDeviceError> {
        if let Some(status) = req.status() {
            tracing::warn!(device_id = %id, %status, "device status overwritten outside a booking");
        }

        self.repo.update_device_by_id(id, req).await
    }

    async fn delete_device_by_id(&self, id: &DeviceId) -> Result<(), DeleteDeviceError> {
        self.repo.delete_device_by_id(id).await?;
        tracing::info!(device_id = %id, "device deleted");

        Ok(())
    }
}
