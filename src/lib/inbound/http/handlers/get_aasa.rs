use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::domain::auth::ports::AuthService;
use crate::domain::device::ports::DeviceService;
use crate::domain::transaction::ports::BookingService;
use crate::inbound::http::AppState;
use crate::inbound::http::responses::ApiError;

/// Serves the Apple App Site Association file. Open to anyone, as Apple fetches it without
/// credentials.
pub async fn get_aasa<DS: DeviceService, BS: BookingService, AS: AuthService>(
    State(state): State<AppState<DS, BS, AS>>,
) -> Result<Response, ApiError> {
    match tokio::fs::read(state.aasa_path.as_ref()).await {
        Ok(contents) => Ok((
            StatusCode::OK,
            [(CONTENT_TYPE, HeaderValue::from_static("application/json"))],
            contents,
        )
            .into_response()),
        Err(e) => {
            tracing::debug!("failed to read {}: {}", state.aasa_path.display(), e);
            Err(ApiError::NotFound("Not found".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use super::*;
    use crate::inbound::http::handlers::test_support::TestApp;

    #[tokio::test]
    async fn test_get_aasa_missing_file() {
        let app = TestApp::new().await;

        let result = get_aasa(State(app.state.clone())).await;

        assert_eq!(
            result.err(),
            Some(ApiError::NotFound("Not found".to_string()))
        );
    }

    #[tokio::test]
    async fn test_get_aasa_serves_json() {
        let app = TestApp::new().await;
        let path = std::env::temp_dir().join(format!("aasa-{}", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, br#"{"applinks":{"apps":[]}}"#)
            .await
            .unwrap();

        let mut state = app.state.clone();
        state.aasa_path = Arc::new(PathBuf::from(&path));
        let response = get_aasa(State(state)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );

        tokio::fs::remove_file(&path).await.unwrap();
    }
}
