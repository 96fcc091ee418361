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
use crate::inbound::http::responses::ApiError;

pub async fn delete_device<DS: DeviceService, BS: BookingService, AS: AuthService>(
    headers: HeaderMap,
    State(state): State<AppState<DS, BS, AS>>,
    id: Result<Path<String>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    authorize(state.auth_service.as_ref(), &headers, &[Permission::DeleteDevice]).await?;

    let Path(id) = id?;
    let id = DeviceId::new(&id)?;

    state
        .device_service
        .delete_device_by_id(&id)
        .await
        .map_err(ApiError::from)
        .map(|_| StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::device::ports::DeviceRepository;
    use crate::inbound::http::handlers::test_support::TestApp;

    #[tokio::test]
    async fn test_delete_device_success() {
        let app = TestApp::new().await;
        let device = app.seed_device("SN1").await;

        let result = delete_device(
            app.admin_headers(),
            State(app.state.clone()),
            Ok(Path(device.id().to_string())),
        )
        .await;

        assert_eq!(result, Ok(StatusCode::NO_CONTENT));
        assert!(app.sqlite.get_device_by_id(device.id()).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_device_not_found() {
        let app = TestApp::new().await;

        let result = delete_device(
            app.admin_headers(),
            State(app.state.clone()),
            Ok(Path(DeviceId::generate().to_string())),
        )
        .await;

        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_device_requires_admin() {
        let app = TestApp::new().await;
        let device = app.seed_device("SN1").await;

        let result = delete_device(
            app.user_headers(),
            State(app.state.clone()),
            Ok(Path(device.id().to_string())),
        )
        .await;

        assert_eq!(result, Err(ApiError::Forbidden("Forbidden".to_string())));
    }
}
