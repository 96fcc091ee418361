pub mod create_device;
pub mod create_device_transaction;
pub mod delete_device;
pub mod delete_device_transaction;
pub mod get_aasa;
pub mod get_device;
pub mod get_device_transaction;
pub mod get_device_transactions;
pub mod get_devices;
pub mod patch_device;
pub mod patch_device_transaction;

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;
    use std::sync::Arc;

    use axum::http::header::AUTHORIZATION;
    use axum::http::{HeaderMap, HeaderValue};

    use crate::domain::auth::models::role::Role;
    use crate::domain::auth::models::token::TokenType;
    use crate::domain::auth::models::user::{User, UserId};
    use crate::domain::auth::service::Service as AuthService;
    use crate::domain::device::models::device::{
        Category, CreateDeviceRequest, Device, DeviceDetails, DeviceUuid, Manufacturer, ModelName,
        SerialNumber, Variant,
    };
    use crate::domain::device::ports::DeviceRepository;
    use crate::domain::device::service::Service as DeviceService;
    use crate::domain::transaction::service::Service as BookingService;
    use crate::inbound::http::AppState;
    use crate::outbound::jwt::JwtTokens;
    use crate::outbound::sqlite::Sqlite;

    pub(crate) type TestState = AppState<
        DeviceService<Sqlite>,
        BookingService<Sqlite, Sqlite>,
        AuthService<JwtTokens, Sqlite>,
    >;

    /// Application state over an in-memory database with one admin and one regular user.
    pub(crate) struct TestApp {
        pub(crate) state: TestState,
        pub(crate) sqlite: Sqlite,
        pub(crate) tokens: JwtTokens,
        pub(crate) admin: User,
        pub(crate) user: User,
    }

    impl TestApp {
        pub(crate) async fn new() -> Self {
            let sqlite = Sqlite::in_memory().await.unwrap();
            let tokens = JwtTokens::new("handler-test-secret");

            let admin = User::new(
                UserId::generate(),
                "Admin".to_string(),
                "admin@example.com".to_string(),
                Role::Admin,
            );
            let user = User::new(
                UserId::generate(),
                "User".to_string(),
                "user@example.com".to_string(),
                Role::User,
            );
            sqlite.insert_user(&admin).await.unwrap();
            sqlite.insert_user(&user).await.unwrap();

            let state = AppState {
                device_service: Arc::new(DeviceService::new(sqlite.clone())),
                booking_service: Arc::new(BookingService::new(sqlite.clone(), sqlite.clone())),
                auth_service: Arc::new(AuthService::new(tokens.clone(), sqlite.clone())),
                aasa_path: Arc::new(PathBuf::from("does/not/exist")),
            };

            Self {
                state,
                sqlite,
                tokens,
                admin,
                user,
            }
        }

        pub(crate) fn headers_for(&self, user: &User, token_type: TokenType) -> HeaderMap {
            let token = self
                .tokens
                .issue(user.id(), token_type, chrono::Duration::minutes(30))
                .unwrap();
            let mut headers = HeaderMap::new();
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
            );
            headers
        }

        pub(crate) fn admin_headers(&self) -> HeaderMap {
            self.headers_for(&self.admin, TokenType::Access)
        }

        pub(crate) fn user_headers(&self) -> HeaderMap {
            self.headers_for(&self.user, TokenType::Access)
        }

        pub(crate) async fn seed_device(&self, serial: &str) -> Device {
            let details = DeviceDetails::new(
                ModelName::new("iPhone 15").unwrap(),
                SerialNumber::new(serial).unwrap(),
                DeviceUuid::new(&format!("uuid{}", serial)).unwrap(),
                Variant::new("Pro").unwrap(),
                Category::new("Phone").unwrap(),
                Manufacturer::new("Apple").unwrap(),
                None,
            );
            self.sqlite
                .create_device(&CreateDeviceRequest::new(details))
                .await
                .unwrap()
        }
    }
}
