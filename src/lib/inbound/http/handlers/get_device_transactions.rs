use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use crate::domain::auth::models::role::Permission;
use crate::domain::auth::models::user::{UserId, UserIdError};
use crate::domain::auth::ports::AuthService;
use crate::domain::device::models::device::{DeviceId, DeviceIdError};
use crate::domain::device::ports::DeviceService;
use crate::domain::pagination::{PageRequest, SortByInvalidError};
use crate::domain::transaction::models::transaction::{
    TransactionFilter, TransactionSortField, TransactionStatus, TransactionStatusInvalidError,
};
use crate::domain::transaction::ports::BookingService;
use crate::inbound::http::AppState;
use crate::inbound::http::auth::authorize;
use crate::inbound::http::responses::{
    ApiError, ApiSuccess, DeviceTransactionResponseData, PageResponseData,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetDeviceTransactionsHttpQuery {
    device_id: Option<String>,
    user_id: Option<String>,
    /// Comma separated set of statuses.
    status: Option<String>,
    sort_by: Option<String>,
    limit: Option<i64>,
    page: Option<i64>,
}

#[derive(Debug, Clone, Error)]
enum ParseGetDeviceTransactionsHttpQueryError {
    #[error(transparent)]
    DeviceId(#[from] DeviceIdError),
    #[error(transparent)]
    UserId(#[from] UserIdError),
    #[error(transparent)]
    Status(#[from] TransactionStatusInvalidError),
    #[error(transparent)]
    SortBy(#[from] SortByInvalidError),
}

impl From<ParseGetDeviceTransactionsHttpQueryError> for ApiError {
    fn from(e: ParseGetDeviceTransactionsHttpQueryError) -> Self {
        Self::BadRequest(e.to_string())
    }
}

impl GetDeviceTransactionsHttpQuery {
    fn try_into_domain(
        self,
    ) -> Result<
        (TransactionFilter, PageRequest<TransactionSortField>),
        ParseGetDeviceTransactionsHttpQueryError,
    > {
        let device_id = self.device_id.as_deref().map(DeviceId::new).transpose()?;
        let user_id = self.user_id.as_deref().map(UserId::new).transpose()?;
        let statuses = self
            .status
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse::<TransactionStatus>)
            .collect::<Result<Vec<_>, _>>()?;

        let filter = TransactionFilter::new(device_id, user_id, statuses);
        let page = PageRequest::new(self.sort_by.as_deref(), self.limit, self.page)?;

        Ok((filter, page))
    }
}

pub async fn get_device_transactions<DS: DeviceService, BS: BookingService, AS: AuthService>(
    headers: HeaderMap,
    State(state): State<AppState<DS, BS, AS>>,
    query: Result<Query<GetDeviceTransactionsHttpQuery>, QueryRejection>,
) -> Result<ApiSuccess<PageResponseData<DeviceTransactionResponseData>>, ApiError> {
    authorize(
        state.auth_service.as_ref(),
        &headers,
        &[Permission::ManageDeviceTransactions],
    )
    .await?;

    let Query(query) = query?;
    let (filter, page) = query.try_into_domain()?;

    state
        .booking_service
        .get_device_transactions(&filter, &page)
        .await
        .map_err(ApiError::from)
        .map(|ref transactions| ApiSuccess::new(StatusCode::OK, transactions.into()))
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::domain::transaction::models::transaction::{
        CreateDeviceTransactionRequest, UpdateDeviceTransactionRequest,
    };
    use crate::inbound::http::handlers::test_support::TestApp;

    #[tokio::test]
    async fn test_get_device_transactions_filters() {
        let app = TestApp::new().await;
        let first = app.seed_device("SN1").await;
        let second = app.seed_device("SN2").await;
        let due = Utc::now() + Duration::days(2);

        let booking = app
            .state
            .booking_service
            .create_device_transaction(&CreateDeviceTransactionRequest::new(
                *first.id(),
                *app.user.id(),
                due,
            ))
            .await
            .unwrap();
        app.state
            .booking_service
            .update_device_transaction_by_id(
                booking.id(),
                &UpdateDeviceTransactionRequest::Status(TransactionStatus::Open),
            )
            .await
            .unwrap();
        app.state
            .booking_service
            .create_device_transaction(&CreateDeviceTransactionRequest::new(
                *second.id(),
                *app.admin.id(),
                due,
            ))
            .await
            .unwrap();

        let query = GetDeviceTransactionsHttpQuery {
            status: Some("OPEN, BOOKING_HOLD".to_string()),
            ..Default::default()
        };
        let result = get_device_transactions(
            app.user_headers(),
            State(app.state.clone()),
            Ok(Query(query)),
        )
        .await
        .unwrap();
        assert_eq!(result.data().total_results, 2);

        let query = GetDeviceTransactionsHttpQuery {
            user_id: Some(app.user.id().to_string()),
            ..Default::default()
        };
        let result = get_device_transactions(
            app.user_headers(),
            State(app.state.clone()),
            Ok(Query(query)),
        )
        .await
        .unwrap();
        let data = result.data();
        assert_eq!(data.total_results, 1);
        assert_eq!(data.results[0].id, booking.id().to_string());
        assert_eq!(data.results[0].status, "OPEN");
    }

    #[tokio::test]
    async fn test_get_device_transactions_rejects_unknown_status() {
        let app = TestApp::new().await;

        let query = GetDeviceTransactionsHttpQuery {
            status: Some("OPEN,LOST".to_string()),
            ..Default::default()
        };
        let result = get_device_transactions(
            app.user_headers(),
            State(app.state.clone()),
            Ok(Query(query)),
        )
        .await;

        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_get_device_transactions_rejects_malformed_device_id() {
        let app = TestApp::new().await;

        let query = GetDeviceTransactionsHttpQuery {
            device_id: Some("42".to_string()),
            ..Default::default()
        };
        let result = get_device_transactions(
            app.user_headers(),
            State(app.state.clone()),
            Ok(Query(query)),
        )
        .await;

        assert_eq!(
            result,
            Err(ApiError::BadRequest("42 is not a valid device id".to_string()))
        );
    }
}
