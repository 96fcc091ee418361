use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use crate::domain::auth::models::role::Permission;
use crate::domain::auth::ports::AuthService;
use crate::domain::device::models::device::{
    Category, CategoryInvalidError, CreateDeviceRequest, DeviceDetails, DeviceUuid,
    DeviceUuidInvalidError, Manufacturer, ManufacturerInvalidError, ModelName,
    ModelNameInvalidError, PictureUrl, PictureUrlInvalidError, SerialNumber,
    SerialNumberInvalidError, Variant, VariantInvalidError,
};
use crate::domain::device::ports::DeviceService;
use crate::domain::transaction::ports::BookingService;
use crate::inbound::http::AppState;
use crate::inbound::http::auth::authorize;
use crate::inbound::http::responses::{ApiError, ApiSuccess, DeviceResponseData};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeviceHttpRequestBody {
    #[serde(alias = "modalName")]
    model_name: String,
    sr_no: String,
    uuid: String,
    variant: String,
    category: String,
    manufacturer: String,
    picture: Option<String>,
}

/// Any invalid device attribute in a request body.
#[derive(Debug, Clone, Error)]
pub(crate) enum ParseDeviceHttpRequestError {
    #[error(transparent)]
    ModelName(#[from] ModelNameInvalidError),
    #[error(transparent)]
    SerialNumber(#[from] SerialNumberInvalidError),
    #[error(transparent)]
    Uuid(#[from] DeviceUuidInvalidError),
    #[error(transparent)]
    Variant(#[from] VariantInvalidError),
    #[error(transparent)]
    Category(#[from] CategoryInvalidError),
    #[error(transparent)]
    Manufacturer(#[from] ManufacturerInvalidError),
    #[error(transparent)]
    Picture(#[from] PictureUrlInvalidError),
}

impl From<ParseDeviceHttpRequestError> for ApiError {
    fn from(e: ParseDeviceHttpRequestError) -> Self {
        Self::BadRequest(e.to_string())
    }
}

impl CreateDeviceHttpRequestBody {
    fn try_into_domain(self) -> Result<CreateDeviceRequest, ParseDeviceHttpRequestError> {
        let picture = self
            .picture
            .as_deref()
            .map(PictureUrl::new)
            .transpose()?;

        let details = DeviceDetails::new(
            ModelName::new(&self.model_name)?,
            SerialNumber::new(&self.sr_no)?,
            DeviceUuid::new(&self.uuid)?,
            Variant::new(&self.variant)?,
            Category::new(&self.category)?,
            Manufacturer::new(&self.manufacturer)?,
            picture,
        );

        Ok(CreateDeviceRequest::new(details))
    }
}

pub async fn create_device<DS: DeviceService, BS: BookingService, AS: AuthService>(
    headers: HeaderMap,
    State(state): State<AppState<DS, BS, AS>>,
    body: Result<Json<CreateDeviceHttpRequestBody>, JsonRejection>,
) -> Result<ApiSuccess<DeviceResponseData>, ApiError> {
    authorize(state.auth_service.as_ref(), &headers, &[Permission::AddDevice]).await?;

    let Json(body) = body?;
    let domain_req = body.try_into_domain()?;

    state
        .device_service
        .add_device(&domain_req)
        .await
        .map_err(ApiError::from)
        .map(|ref device| ApiSuccess::new(StatusCode::CREATED, device.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::http::handlers::test_support::TestApp;

    fn body(sr_no: &str, uuid: &str) -> CreateDeviceHttpRequestBody {
        CreateDeviceHttpRequestBody {
            model_name: "Pixel 8".to_string(),
            sr_no: sr_no.to_string(),
            uuid: uuid.to_string(),
            variant: "128GB".to_string(),
            category: "Phone".to_string(),
            manufacturer: "Google".to_string(),
            picture: Some("https://cdn.example.com/pixel.png".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_device_success() {
        let app = TestApp::new().await;

        let result = create_device(
            app.admin_headers(),
            State(app.state.clone()),
            Ok(Json(body("SN100", "U100"))),
        )
        .await
        .unwrap();

        assert_eq!(result.status(), StatusCode::CREATED);
        let data = result.data();
        assert_eq!(data.model_name, "Pixel 8");
        assert_eq!(data.sr_no, "SN100");
        assert_eq!(data.status, "AVAILABLE");
        assert!(!data.is_issued);
        assert_eq!(
            data.picture.as_deref(),
            Some("https://cdn.example.com/pixel.png")
        );
    }

    #[test]
    fn test_create_device_accepts_legacy_field_name() {
        let raw = r#"{"modalName":"Galaxy S24","srNo":"SN1","uuid":"U1","variant":"Ultra",
            "category":"Phone","manufacturer":"Samsung"}"#;
        let parsed: CreateDeviceHttpRequestBody = serde_json::from_str(raw).unwrap();

        assert_eq!(parsed.model_name, "Galaxy S24");
        assert_eq!(parsed.picture, None);
    }

    #[tokio::test]
    async fn test_create_device_duplicate_serial() {
        let app = TestApp::new().await;
        app.seed_device("SN100").await;

        let result = create_device(
            app.admin_headers(),
            State(app.state.clone()),
            Ok(Json(body("SN100", "U999"))),
        )
        .await;

        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_create_device_invalid_field() {
        let app = TestApp::new().await;

        let result = create_device(
            app.admin_headers(),
            State(app.state.clone()),
            Ok(Json(body("SN-100", "U100"))),
        )
        .await;

        assert_eq!(
            result,
            Err(ApiError::BadRequest(
                "serial number should be alphanumeric".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn test_create_device_requires_admin() {
        let app = TestApp::new().await;

        let result = create_device(
            app.user_headers(),
            State(app.state.clone()),
            Ok(Json(body("SN100", "U100"))),
        )
        .await;

        assert_eq!(result, Err(ApiError::Forbidden("Forbidden".to_string())));
    }

    #[tokio::test]
    async fn test_create_device_requires_token() {
        let app = TestApp::new().await;

        let result = create_device(
            HeaderMap::new(),
            State(app.state.clone()),
            Ok(Json(body("SN100", "U100"))),
        )
        .await;

        assert_eq!(
            result,
            Err(ApiError::Unauthorized("Please authenticate".to_string()))
        );
    }
}
