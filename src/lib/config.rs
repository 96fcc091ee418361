use anyhow::Context;
use dotenv::dotenv;
use std::env;
use std::path::PathBuf;

const DEFAULT_AASA_PATH: &str = "AASA/apple-app-site-association";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub server_port: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub aasa_path: PathBuf,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Config> {
        // A missing .env file is fine when the environment is set up directly.
        dotenv().ok();

        let server_port = load_env("SERVER_PORT")?;
        let database_url = load_env("DATABASE_URL")?;
        let jwt_secret = load_env("JWT_SECRET")?;
        let aasa_path = env::var("AASA_PATH")
            .unwrap_or_else(|_| DEFAULT_AASA_PATH.to_string())
            .into();

        Ok(Config {
            server_port,
            database_url,
            jwt_secret,
            aasa_path,
        })
    }
}

fn load_env(key: &str) -> anyhow::Result<String> {
    env::var(key).with_context(|| format!("failed to load environment variable {}", key))
}
