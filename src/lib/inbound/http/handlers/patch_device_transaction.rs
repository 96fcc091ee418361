use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use crate::domain::auth::models::role::Permission;
use crate::domain::auth::ports::AuthService;
use crate::domain::device::ports::DeviceService;
use crate::domain::transaction::models::transaction::{
    DueDateInvalidError, TransactionId, TransactionStatus, TransactionStatusInvalidError,
    UpdateDeviceTransactionRequest, UpdateFieldsError, parse_due_date,
};
use crate::domain::transaction::ports::BookingService;
use crate::inbound::http::AppState;
use crate::inbound::http::auth::authorize;
use crate::inbound::http::responses::{ApiError, ApiSuccess, DeviceTransactionResponseData};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchDeviceTransactionHttpRequestBody {
    due_date: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Clone, Error)]
enum ParsePatchDeviceTransactionHttpRequestError {
    #[error(transparent)]
    DueDate(#[from] DueDateInvalidError),
    #[error(transparent)]
    Status(#[from] TransactionStatusInvalidError),
    #[error(transparent)]
    Fields(#[from] UpdateFieldsError),
}

impl From<ParsePatchDeviceTransactionHttpRequestError> for ApiError {
    fn from(e: ParsePatchDeviceTransactionHttpRequestError) -> Self {
        Self::BadRequest(e.to_string())
    }
}

impl PatchDeviceTransactionHttpRequestBody {
    fn try_into_domain(
        self,
    ) -> Result<UpdateDeviceTransactionRequest, ParsePatchDeviceTransactionHttpRequestError> {
        let due_date = self.due_date.as_deref().map(parse_due_date).transpose()?;
        let status = self
            .status
            .as_deref()
            .map(str::parse::<TransactionStatus>)
            .transpose()?;

        Ok(UpdateDeviceTransactionRequest::new(due_date, status)?)
    }
}

pub async fn patch_device_transaction<DS: DeviceService, BS: BookingService, AS: AuthService>(
    headers: HeaderMap,
    State(state): State<AppState<DS, BS, AS>>,
    id: Result<Path<String>, PathRejection>,
    body: Result<Json<PatchDeviceTransactionHttpRequestBody>, JsonRejection>,
) -> Result<ApiSuccess<DeviceTransactionResponseData>, ApiError> {
    authorize(
        state.auth_service.as_ref(),
        &headers,
        &[Permission::ManageDeviceTransactions],
    )
    .await?;

    let Path(id) = id?;
    let id = TransactionId::new(&id)?;
    let Json(body) = body?;
    let domain_req = body.try_into_domain()?;

    state
        .booking_service
        .update_device_transaction_by_id(&id, &domain_req)
        .await
        .map_err(ApiError::from)
        .map(|ref transaction| ApiSuccess::new(StatusCode::OK, transaction.into()))
}
