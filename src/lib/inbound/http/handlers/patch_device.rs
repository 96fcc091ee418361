use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use serde::{Deserialize, Deserializer};

use crate::domain::auth::models::role::Permission;
use crate::domain::auth::ports::AuthService;
use crate::domain::device::models::device::{
    Category, DeviceId, DeviceStatus, DeviceUuid, Manufacturer, ModelName, PictureUrl,
    SerialNumber, UpdateDeviceRequest, Variant,
};
use crate::domain::device::ports::DeviceService;
use crate::domain::transaction::ports::BookingService;
use crate::inbound::http::AppState;
use crate::inbound::http::auth::authorize;
use crate::inbound::http::handlers::create_device::ParseDeviceHttpRequestError;
use crate::inbound::http::responses::{ApiError, ApiSuccess, DeviceResponseData};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchDeviceHttpRequestBody {
    #[serde(alias = "modalName")]
    model_name: Option<String>,
    sr_no: Option<String>,
    uuid: Option<String>,
    variant: Option<String>,
    category: Option<String>,
    manufacturer: Option<String>,
    /// Outer `None` when absent, inner `None` when sent as `null`.
    #[serde(default, deserialize_with = "present")]
    picture: Option<Option<String>>,
    status: Option<String>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

fn parse_field<T, E>(
    raw: Option<String>,
    parse: impl Fn(&str) -> Result<T, E>,
) -> Result<Option<T>, ParseDeviceHttpRequestError>
where
    ParseDeviceHttpRequestError: From<E>,
{
    raw.as_deref()
        .map(parse)
        .transpose()
        .map_err(ParseDeviceHttpRequestError::from)
}

impl PatchDeviceHttpRequestBody {
    fn try_into_domain(self) -> Result<UpdateDeviceRequest, ApiError> {
        let mut req = UpdateDeviceRequest::default();

        if let Some(model_name) = parse_field(self.model_name, ModelName::new)? {
            req = req.with_model_name(model_name);
        }
        if let Some(serial_number) = parse_field(self.sr_no, SerialNumber::new)? {
            req = req.with_serial_number(serial_number);
        }
        if let Some(uuid) = parse_field(self.uuid, DeviceUuid::new)? {
            req = req.with_uuid(uuid);
        }
        if let Some(variant) = parse_field(self.variant, Variant::new)? {
            req = req.with_variant(variant);
        }
        if let Some(category) = parse_field(self.category, Category::new)? {
            req = req.with_category(category);
        }
        if let Some(manufacturer) = parse_field(self.manufacturer, Manufacturer::new)? {
            req = req.with_manufacturer(manufacturer);
        }
        match self.picture {
            Some(Some(raw)) => {
                let picture = PictureUrl::new(&raw).map_err(ParseDeviceHttpRequestError::from)?;
                req = req.with_picture(picture);
            }
            Some(None) => req = req.without_picture(),
            None => {}
        }
        if let Some(raw) = self.status {
            let status = raw
                .parse::<DeviceStatus>()
                .map_err(|e| ApiError::BadRequest(e.to_string()))?;
            req = req.with_status(status);
        }

        if req.is_empty() {
            return Err(ApiError::BadRequest(
                "at least one field must be provided".to_string(),
            ));
        }

        Ok(req)
    }
}

pub async fn patch_device<DS: DeviceService, BS: BookingService, AS: AuthService>(
    headers: HeaderMap,
    State(state): State<AppState<DS, BS, AS>>,
    id: Result<Path<String>, PathRejection>,
    body: Result<Json<PatchDeviceHttpRequestBody>, JsonRejection>,
) -> Result<ApiSuccess<DeviceResponseData>, ApiError> {
    authorize(state.auth_service.as_ref(), &headers, &[Permission::UpdateDevice]).await?;

    let Path(id) = id?;
    let id = DeviceId::new(&id)?;
    let Json(body) = body?;
    let domain_req = body.try_into_domain()?;

    state
        .device_service
        .update_device_by_id(&id, &domain_req)
        .await
        .map_err(ApiError::from)
        .map(|ref device| ApiSuccess::new(StatusCode::OK, device.into()))
}
