use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use crate::domain::auth::models::role::Permission;
use crate::domain::auth::ports::AuthService;
use crate::domain::device::models::device::{
    DeviceFilter, DeviceSortField, DeviceStatus, DeviceStatusInvalidError,
};
use crate::domain::device::ports::DeviceService;
use crate::domain::pagination::{PageRequest, SortByInvalidError};
use crate::domain::transaction::ports::BookingService;
use crate::inbound::http::AppState;
use crate::inbound::http::auth::authorize;
use crate::inbound::http::responses::{ApiError, ApiSuccess, DeviceResponseData, PageResponseData};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetDevicesHttpQuery {
    #[serde(alias = "modalName")]
    model_name: Option<String>,
    status: Option<String>,
    is_issued: Option<bool>,
    sort_by: Option<String>,
    limit: Option<i64>,
    page: Option<i64>,
}

#[derive(Debug, Clone, Error)]
enum ParseGetDevicesHttpQueryError {
    #[error(transparent)]
    Status(#[from] DeviceStatusInvalidError),
    #[error(transparent)]
    SortBy(#[from] SortByInvalidError),
}

impl From<ParseGetDevicesHttpQueryError> for ApiError {
    fn from(e: ParseGetDevicesHttpQueryError) -> Self {
        Self::BadRequest(e.to_string())
    }
}

impl GetDevicesHttpQuery {
    fn try_into_domain(
        self,
    ) -> Result<(DeviceFilter, PageRequest<DeviceSortField>), ParseGetDevicesHttpQueryError> {
        let status = self
            .status
            .as_deref()
            .map(str::parse::<DeviceStatus>)
            .transpose()?;
        let filter = DeviceFilter::new(self.model_name, status, self.is_issued);
        let page = PageRequest::new(self.sort_by.as_deref(), self.limit, self.page)?;

        Ok((filter, page))
    }
}

pub async fn get_devices<DS: DeviceService, BS: BookingService, AS: AuthService>(
    headers: HeaderMap,
    State(state): State<AppState<DS, BS, AS>>,
    query: Result<Query<GetDevicesHttpQuery>, QueryRejection>,
) -> Result<ApiSuccess<PageResponseData<DeviceResponseData>>, ApiError> {
    authorize(state.auth_service.as_ref(), &headers, &[Permission::GetDevices]).await?;

    let Query(query) = query?;
    let (filter, page) = query.try_into_domain()?;

    state
        .device_service
        .get_devices(&filter, &page)
        .await
        .map_err(ApiError::from)
        .map(|ref devices| ApiSuccess::new(StatusCode::OK, devices.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::device::ports::DeviceRepository;
    use crate::domain::device::models::device::UpdateDeviceRequest;
    use crate::inbound::http::handlers::test_support::TestApp;

    #[tokio::test]
    async fn test_get_devices_paginates() {
        let app = TestApp::new().await;
        for serial in ["SN1", "SN2", "SN3"] {
            app.seed_device(serial).await;
        }

        let query = GetDevicesHttpQuery {
            sort_by: Some("srNo:desc".to_string()),
            limit: Some(2),
            page: Some(1),
            ..Default::default()
        };
        let result = get_devices(app.user_headers(), State(app.state.clone()), Ok(Query(query)))
            .await
            .unwrap();

        let data = result.data();
        assert_eq!(data.total_results, 3);
        assert_eq!(data.total_pages, 2);
        assert_eq!(data.limit, 2);
        let serials: Vec<&str> = data.results.iter().map(|d| d.sr_no.as_str()).collect();
        assert_eq!(serials, vec!["SN3", "SN2"]);
    }

    #[tokio::test]
    async fn test_get_devices_filters_on_issued() {
        let app = TestApp::new().await;
        let booked = app.seed_device("SN1").await;
        app.seed_device("SN2").await;
        app.sqlite
            .update_device_by_id(
                booked.id(),
                &UpdateDeviceRequest::default().with_status(DeviceStatus::Booked),
            )
            .await
            .unwrap();

        let query = GetDevicesHttpQuery {
            is_issued: Some(true),
            ..Default::default()
        };
        let result = get_devices(app.user_headers(), State(app.state.clone()), Ok(Query(query)))
            .await
            .unwrap();

        let data = result.data();
        assert_eq!(data.total_results, 1);
        assert_eq!(data.results[0].id, booked.id().to_string());
        assert!(data.results[0].is_issued);
    }

    #[tokio::test]
    async fn test_get_devices_rejects_unknown_sort_field() {
        let app = TestApp::new().await;

        let query = GetDevicesHttpQuery {
            sort_by: Some("password:asc".to_string()),
            ..Default::default()
        };
        let result =
            get_devices(app.user_headers(), State(app.state.clone()), Ok(Query(query))).await;

        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_get_devices_rejects_unknown_status() {
        let app = TestApp::new().await;

        let query = GetDevicesHttpQuery {
            status: Some("LOST".to_string()),
            ..Default::default()
        };
        let result =
            get_devices(app.user_headers(), State(app.state.clone()), Ok(Query(query))).await;

        assert_eq!(
            result,
            Err(ApiError::BadRequest(
                "LOST is not a valid device status".to_string()
            ))
        );
    }
}
