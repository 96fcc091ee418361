use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use crate::domain::auth::models::role::Permission;
use crate::domain::auth::models::user::{UserId, UserIdError};
use crate::domain::auth::ports::AuthService;
use crate::domain::device::models::device::{DeviceId, DeviceIdError};
use crate::domain::device::ports::DeviceService;
use crate::domain::transaction::models::transaction::{
    CreateDeviceTransactionRequest, DueDateInvalidError, parse_due_date,
};
use crate::domain::transaction::ports::BookingService;
use crate::inbound::http::AppState;
use crate::inbound::http::auth::authorize;
use crate::inbound::http::responses::{ApiError, ApiSuccess, DeviceTransactionResponseData};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeviceTransactionHttpRequestBody {
    device_id: String,
    user_id: Option<String>,
    due_date: String,
}

#[derive(Debug, Clone, Error)]
enum ParseCreateDeviceTransactionHttpRequestError {
    #[error(transparent)]
    DeviceId(#[from] DeviceIdError),
    #[error(transparent)]
    UserId(#[from] UserIdError),
    #[error(transparent)]
    DueDate(#[from] DueDateInvalidError),
}

impl From<ParseCreateDeviceTransactionHttpRequestError> for ApiError {
    fn from(e: ParseCreateDeviceTransactionHttpRequestError) -> Self {
        Self::BadRequest(e.to_string())
    }
}

impl CreateDeviceTransactionHttpRequestBody {
    /// A booking without `userId` is made for the caller.
    fn try_into_domain(
        self,
        caller: &UserId,
    ) -> Result<CreateDeviceTransactionRequest, ParseCreateDeviceTransactionHttpRequestError> {
        let device_id = DeviceId::new(&self.device_id)?;
        let user_id = match self.user_id.as_deref() {
            Some(raw) => UserId::new(raw)?,
            None => *caller,
        };
        let due_date = parse_due_date(&self.due_date)?;

        Ok(CreateDeviceTransactionRequest::new(
            device_id, user_id, due_date,
        ))
    }
}

pub async fn create_device_transaction<DS: DeviceService, BS: BookingService, AS: AuthService>(
    headers: HeaderMap,
    State(state): State<AppState<DS, BS, AS>>,
    body: Result<Json<CreateDeviceTransactionHttpRequestBody>, JsonRejection>,
) -> Result<ApiSuccess<DeviceTransactionResponseData>, ApiError> {
    let caller = authorize(
        state.auth_service.as_ref(),
        &headers,
        &[Permission::ManageDeviceTransactions],
    )
    .await?;

    let Json(body) = body?;
    let domain_req = body.try_into_domain(caller.id())?;

    state
        .booking_service
        .create_device_transaction(&domain_req)
        .await
        .map_err(ApiError::from)
        .map(|ref transaction| ApiSuccess::new(StatusCode::CREATED, transaction.into()))
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::domain::auth::models::token::TokenType;
    use crate::domain::device::ports::DeviceRepository;
    use crate::inbound::http::handlers::test_support::TestApp;

    fn body(
        device_id: &DeviceId,
        user_id: Option<&UserId>,
    ) -> CreateDeviceTransactionHttpRequestBody {
        CreateDeviceTransactionHttpRequestBody {
            device_id: device_id.to_string(),
            user_id: user_id.map(|id| id.to_string()),
            due_date: (Utc::now() + Duration::days(3)).to_rfc3339(),
        }
    }

    #[tokio::test]
    async fn test_create_device_transaction_books_device() {
        let app = TestApp::new().await;
        let device = app.seed_device("SN1").await;

        let result = create_device_transaction(
            app.user_headers(),
            State(app.state.clone()),
            Ok(Json(body(device.id(), Some(app.user.id())))),
        )
        .await
        .unwrap();

        assert_eq!(result.status(), StatusCode::CREATED);
        let data = result.data();
        assert_eq!(data.status, "BOOKING_HOLD");
        assert_eq!(data.device_id, device.id().to_string());
        assert_eq!(data.submitted_on, None);

        let stored = app.sqlite.get_device_by_id(device.id()).await.unwrap();
        assert_eq!(stored.status().as_str(), "BOOKING_PENDING");
    }

    #[tokio::test]
    async fn test_create_device_transaction_defaults_to_caller() {
        let app = TestApp::new().await;
        let device = app.seed_device("SN1").await;

        let result = create_device_transaction(
            app.user_headers(),
            State(app.state.clone()),
            Ok(Json(body(device.id(), None))),
        )
        .await
        .unwrap();

        assert_eq!(result.data().user_id, app.user.id().to_string());
    }

    #[tokio::test]
    async fn test_create_device_transaction_second_booking_rejected() {
        let app = TestApp::new().await;
        let device = app.seed_device("SN1").await;
        create_device_transaction(
            app.user_headers(),
            State(app.state.clone()),
            Ok(Json(body(device.id(), Some(app.user.id())))),
        )
        .await
        .unwrap();

        let result = create_device_transaction(
            app.admin_headers(),
            State(app.state.clone()),
            Ok(Json(body(device.id(), Some(app.admin.id())))),
        )
        .await;

        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_create_device_transaction_unknown_device() {
        let app = TestApp::new().await;

        let result = create_device_transaction(
            app.user_headers(),
            State(app.state.clone()),
            Ok(Json(body(&DeviceId::generate(), None))),
        )
        .await;

        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_create_device_transaction_past_due_date() {
        let app = TestApp::new().await;
        let device = app.seed_device("SN1").await;

        let past = CreateDeviceTransactionHttpRequestBody {
            due_date: "2000-01-01".to_string(),
            ..body(device.id(), None)
        };
        let result =
            create_device_transaction(app.user_headers(), State(app.state.clone()), Ok(Json(past)))
                .await;

        assert_eq!(
            result,
            Err(ApiError::BadRequest(
                "due date must be in the future".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn test_create_device_transaction_malformed_due_date() {
        let app = TestApp::new().await;
        let device = app.seed_device("SN1").await;

        let malformed = CreateDeviceTransactionHttpRequestBody {
            due_date: "next tuesday".to_string(),
            ..body(device.id(), None)
        };
        let result = create_device_transaction(
            app.user_headers(),
            State(app.state.clone()),
            Ok(Json(malformed)),
        )
        .await;

        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_create_device_transaction_rejects_refresh_token() {
        let app = TestApp::new().await;
        let device = app.seed_device("SN1").await;

        let result = create_device_transaction(
            app.headers_for(&app.user, TokenType::Refresh),
            State(app.state.clone()),
            Ok(Json(body(device.id(), None))),
        )
        .await;

        assert_eq!(
            result,
            Err(ApiError::Unauthorized("Invalid token type".to_string()))
        );
    }
}
