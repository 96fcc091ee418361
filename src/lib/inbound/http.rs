use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use axum::routing::get;
use tokio::net;

use crate::domain::auth::ports::AuthService;
use crate::domain::device::ports::DeviceService;
use crate::domain::transaction::ports::BookingService;
use crate::inbound::http::handlers::{
    create_device::create_device, create_device_transaction::create_device_transaction,
    delete_device::delete_device, delete_device_transaction::delete_device_transaction,
    get_aasa::get_aasa, get_device::get_device, get_device_transaction::get_device_transaction,
    get_device_transactions::get_device_transactions, get_devices::get_devices,
    patch_device::patch_device, patch_device_transaction::patch_device_transaction,
};

mod auth;
mod handlers;
mod responses;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpServerConfig<'a> {
    pub port: &'a str,
    pub aasa_path: &'a Path,
}

#[derive(Debug, Clone)]
struct AppState<DS: DeviceService, BS: BookingService, AS: AuthService> {
    device_service: Arc<DS>,
    booking_service: Arc<BS>,
    auth_service: Arc<AS>,
    aasa_path: Arc<PathBuf>,
}

pub struct HttpServer {
    router: axum::Router,
    listener: net::TcpListener,
}

impl HttpServer {
    pub async fn new(
        device_service: impl DeviceService,
        booking_service: impl BookingService,
        auth_service: impl AuthService,
        config: HttpServerConfig<'_>,
    ) -> anyhow::Result<Self> {
        let trace_layer = tower_http::trace::TraceLayer::new_for_http().make_span_with(
            |request: &axum::extract::Request<_>| {
                let uri = request.uri().to_string();
                tracing::info_span!("http_request", method = ?request.method(), uri)
            },
        );

        let state = AppState {
            device_service: Arc::new(device_service),
            booking_service: Arc::new(booking_service),
            auth_service: Arc::new(auth_service),
            aasa_path: Arc::new(config.aasa_path.to_path_buf()),
        };

        let router = axum::Router::new()
            .nest("/v1", api_routes())
            .route("/apple-app-site-association", get(get_aasa))
            .route("/.well-known/apple-app-site-association", get(get_aasa))
            .layer(trace_layer)
            .with_state(state);

        let listener = net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
            .await
            .with_context(|| format!("failed to listen on {}", config.port))?;

        Ok(Self { router, listener })
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let addr = self
            .listener
            .local_addr()
            .context("failed to read listener address")?;
        tracing::info!("listening on {}", addr);

        axum::serve(self.listener, self.router)
            .await
            .context("received error from running server")?;

        Ok(())
    }
}

fn api_routes<DS: DeviceService, BS: BookingService, AS: AuthService>()
-> Router<AppState<DS, BS, AS>> {
    Router::new()
        .route("/devices", get(get_devices).post(create_device))
        .route(
            "/devices/{id}",
            get(get_device).patch(patch_device).delete(delete_device),
        )
        .route(
            "/deviceTransactions",
            get(get_device_transactions).post(create_device_transaction),
        )
        .route(
            "/deviceTransactions/{id}",
            get(get_device_transaction)
                .patch(patch_device_transaction)
                .delete(delete_device_transaction),
        )
}
