use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::domain::auth::models::token::{AuthenticateError, AuthorizeError};
use crate::domain::auth::models::user::UserIdError;
use crate::domain::device::models::device::{
    CreateDeviceError, DeleteDeviceError, Device, DeviceIdError, GetDeviceError, GetDevicesError,
    UpdateDeviceError,
};
use crate::domain::pagination::{Page, SortByInvalidError};
use crate::domain::transaction::models::transaction::{
    CreateDeviceTransactionError, DeleteDeviceTransactionError, DeviceTransaction,
    GetDeviceTransactionError, GetDeviceTransactionsError, TransactionIdError,
    UpdateDeviceTransactionError,
};

#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize + PartialEq>(StatusCode, Json<T>);

impl<T> PartialEq for ApiSuccess<T>
where
    T: Serialize + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1.0 == other.1.0
    }
}

impl<T: Serialize + PartialEq> ApiSuccess<T> {
    pub(crate) fn new(status: StatusCode, data: T) -> Self {
        ApiSuccess(status, Json(data))
    }

    #[cfg(test)]
    pub(crate) fn status(&self) -> StatusCode {
        self.0
    }

    #[cfg(test)]
    pub(crate) fn data(&self) -> &T {
        &self.1.0
    }
}

impl<T: Serialize + PartialEq> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    InternalServerError(String),
}

impl ApiError {
    fn internal(cause: anyhow::Error) -> Self {
        tracing::error!("{:?}\n{}", cause, cause.backtrace());
        Self::InternalServerError("Internal server error".to_string())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::internal(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<DeviceIdError> for ApiError {
    fn from(e: DeviceIdError) -> Self {
        Self::BadRequest(e.to_string())
    }
}

impl From<TransactionIdError> for ApiError {
    fn from(e: TransactionIdError) -> Self {
        Self::BadRequest(e.to_string())
    }
}

impl From<UserIdError> for ApiError {
    fn from(e: UserIdError) -> Self {
        Self::BadRequest(e.to_string())
    }
}

impl From<SortByInvalidError> for ApiError {
    fn from(e: SortByInvalidError) -> Self {
        Self::BadRequest(e.to_string())
    }
}

impl From<AuthenticateError> for ApiError {
    fn from(e: AuthenticateError) -> Self {
        match e {
            AuthenticateError::WrongTokenType => Self::Unauthorized("Invalid token type".to_string()),
            AuthenticateError::InvalidToken(_) | AuthenticateError::UnknownUser { .. } => {
                Self::Unauthorized("Please authenticate".to_string())
            }
            AuthenticateError::Unknown(cause) => Self::internal(cause),
        }
    }
}

impl From<AuthorizeError> for ApiError {
    fn from(e: AuthorizeError) -> Self {
        tracing::debug!("{}", e);
        Self::Forbidden("Forbidden".to_string())
    }
}

impl From<CreateDeviceError> for ApiError {
    fn from(e: CreateDeviceError) -> Self {
        match e {
            CreateDeviceError::DuplicateSerialNumber { .. }
            | CreateDeviceError::DuplicateUuid { .. } => Self::BadRequest(e.to_string()),
            CreateDeviceError::Unknown(cause) => Self::internal(cause),
        }
    }
}

impl From<GetDeviceError> for ApiError {
    fn from(e: GetDeviceError) -> Self {
        match e {
            GetDeviceError::NotFound { .. } => Self::NotFound(e.to_string()),
            GetDeviceError::Unknown(cause) => Self::internal(cause),
        }
    }
}

impl From<GetDevicesError> for ApiError {
    fn from(e: GetDevicesError) -> Self {
        Self::internal(e.into())
    }
}

impl From<UpdateDeviceError> for ApiError {
    fn from(e: UpdateDeviceError) -> Self {
        match e {
            UpdateDeviceError::NotFound { .. } => Self::NotFound(e.to_string()),
            UpdateDeviceError::DuplicateSerialNumber { .. }
            | UpdateDeviceError::DuplicateUuid { .. } => Self::BadRequest(e.to_string()),
            UpdateDeviceError::Unknown(cause) => Self::internal(cause),
        }
    }
}

impl From<DeleteDeviceError> for ApiError {
    fn from(e: DeleteDeviceError) -> Self {
        match e {
            DeleteDeviceError::NotFound { .. } => Self::NotFound(e.to_string()),
            DeleteDeviceError::Unknown(cause) => Self::internal(cause),
        }
    }
}

impl From<CreateDeviceTransactionError> for ApiError {
    fn from(e: CreateDeviceTransactionError) -> Self {
        match e {
            CreateDeviceTransactionError::DeviceNotFound { .. }
            | CreateDeviceTransactionError::DeviceAlreadyBooked { .. }
            | CreateDeviceTransactionError::DueDateNotInFuture => Self::BadRequest(e.to_string()),
            CreateDeviceTransactionError::Unknown(cause) => Self::internal(cause),
        }
    }
}

impl From<GetDeviceTransactionError> for ApiError {
    fn from(e: GetDeviceTransactionError) -> Self {
        match e {
            GetDeviceTransactionError::NotFound { .. } => Self::NotFound(e.to_string()),
            GetDeviceTransactionError::Unknown(cause) => Self::internal(cause),
        }
    }
}

impl From<GetDeviceTransactionsError> for ApiError {
    fn from(e: GetDeviceTransactionsError) -> Self {
        Self::internal(e.into())
    }
}

impl From<UpdateDeviceTransactionError> for ApiError {
    fn from(e: UpdateDeviceTransactionError) -> Self {
        match e {
            UpdateDeviceTransactionError::NotFound { .. } => Self::NotFound(e.to_string()),
            UpdateDeviceTransactionError::Rule(rule) => Self::BadRequest(rule.to_string()),
            UpdateDeviceTransactionError::Unknown(cause) => Self::internal(cause),
        }
    }
}

impl From<DeleteDeviceTransactionError> for ApiError {
    fn from(e: DeleteDeviceTransactionError) -> Self {
        match e {
            DeleteDeviceTransactionError::NotFound { .. } => Self::NotFound(e.to_string()),
            DeleteDeviceTransactionError::Rule(rule) => Self::BadRequest(rule.to_string()),
            DeleteDeviceTransactionError::Unknown(cause) => Self::internal(cause),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use ApiError::*;

        let (status, message) = match self {
            BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Unauthorized(message) => (StatusCode::UNAUTHORIZED, message),
            Forbidden(message) => (StatusCode::FORBIDDEN, message),
            NotFound(message) => (StatusCode::NOT_FOUND, message),
            InternalServerError(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        (status, Json(ErrorResponseData::new(status, message))).into_response()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponseData {
    pub code: u16,
    pub message: String,
}

impl ErrorResponseData {
    fn new(status: StatusCode, message: String) -> Self {
        Self {
            code: status.as_u16(),
            message,
        }
    }
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceResponseData {
    pub(crate) id: String,
    pub(crate) model_name: String,
    pub(crate) sr_no: String,
    pub(crate) uuid: String,
    pub(crate) variant: String,
    pub(crate) category: String,
    pub(crate) manufacturer: String,
    pub(crate) picture: Option<String>,
    pub(crate) status: String,
    pub(crate) is_issued: bool,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl From<&Device> for DeviceResponseData {
    fn from(device: &Device) -> Self {
        let details = device.details();
        Self {
            id: device.id().to_string(),
            model_name: details.model_name().to_string(),
            sr_no: details.serial_number().to_string(),
            uuid: details.uuid().to_string(),
            variant: details.variant().to_string(),
            category: details.category().to_string(),
            manufacturer: details.manufacturer().to_string(),
            picture: details.picture().map(|p| p.to_string()),
            status: device.status().as_str().to_string(),
            is_issued: device.status().is_issued(),
            created_at: timestamp(device.created_at()),
            updated_at: timestamp(device.updated_at()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceTransactionResponseData {
    pub(crate) id: String,
    pub(crate) device_id: String,
    pub(crate) user_id: String,
    pub(crate) issued_on: String,
    pub(crate) due_date: String,
    pub(crate) submitted_on: Option<String>,
    pub(crate) status: String,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl From<&DeviceTransaction> for DeviceTransactionResponseData {
    fn from(transaction: &DeviceTransaction) -> Self {
        Self {
            id: transaction.id().to_string(),
            device_id: transaction.device_id().to_string(),
            user_id: transaction.user_id().to_string(),
            issued_on: timestamp(transaction.issued_on()),
            due_date: timestamp(transaction.due_date()),
            submitted_on: transaction.submitted_on().map(timestamp),
            status: transaction.status().as_str().to_string(),
            created_at: timestamp(transaction.created_at()),
            updated_at: timestamp(transaction.updated_at()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponseData<T: Serialize + PartialEq> {
    pub(crate) results: Vec<T>,
    pub(crate) page: u32,
    pub(crate) limit: u32,
    pub(crate) total_pages: u32,
    pub(crate) total_results: u64,
}

impl<'a, E, T> From<&'a Page<E>> for PageResponseData<T>
where
    T: Serialize + PartialEq + From<&'a E>,
{
    fn from(page: &'a Page<E>) -> Self {
        Self {
            results: page.results().iter().map(T::from).collect(),
            page: page.page(),
            limit: page.limit(),
            total_pages: page.total_pages(),
            total_results: page.total_results(),
        }
    }
}
