use device_inventory::config::Config;
use device_inventory::domain::auth::service::Service as AuthService;
use device_inventory::domain::device::service::Service as DeviceService;
use device_inventory::domain::transaction::service::Service as BookingService;
use device_inventory::inbound::http::{HttpServer, HttpServerConfig};
use device_inventory::outbound::jwt::JwtTokens;
use device_inventory::outbound::sqlite::Sqlite;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let sqlite = Sqlite::new(&config.database_url).await?;
    let tokens = JwtTokens::new(&config.jwt_secret);

    let device_service = DeviceService::new(sqlite.clone());
    let booking_service = BookingService::new(sqlite.clone(), sqlite.clone());
    let auth_service = AuthService::new(tokens, sqlite);

    let server_config = HttpServerConfig {
        port: &config.server_port,
        aasa_path: &config.aasa_path,
    };

    let http_server =
        HttpServer::new(device_service, booking_service, auth_service, server_config).await?;

    http_server.run().await
}
