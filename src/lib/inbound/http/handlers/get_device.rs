use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};

use crate::domain::auth::models::role::Permission;
use crate::domain::auth::ports::AuthService;
use crate::domain::device::models::device::DeviceId;
use crate::domain::device::ports::DeviceService;
use crate::domain::transaction::ports::BookingService;
use crate::inbound::http::AppState;
use crate::inbound::http::auth::authorize;
use crate::inbound::http::responses::{ApiError, ApiSuccess, DeviceResponseData};

pub async fn get_device<DS: DeviceService, BS: BookingService, AS: AuthService>(
    headers: HeaderMap,
    State(state): State<AppState<DS, BS, AS>>,
    id: Result<Path<String>, PathRejection>,
) -> Result<ApiSuccess<DeviceResponseData>, ApiError> {
    authorize(state.auth_service.as_ref(), &headers, &[Permission::GetDevices]).await?;

    let Path(id) = id?;
    let id = DeviceId::new(&id)?;

    state
        .device_service
        .get_device_by_id(&id)
        .await
        .map_err(ApiError::from)
        .map(|ref device| ApiSuccess::new(StatusCode::OK, device.into()))
}
