use std::env;

use anyhow::{Context, Result};

const DEFAULT_PORT: u16 = 5000;

/// Credentials for the admin account created at startup, if it does not exist yet
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub db_url: String,
    pub jwt_secret: String,
    pub port: u16,
    pub admin_seed: Option<AdminSeed>,
}

impl Config {
    /// Reads the configuration from the environment, loading `.env` first when present
    pub fn init() -> Result<Config> {
        dotenv::dotenv().ok();

        let db_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        let port = match env::var("PORT") {
            Ok(port) => port
                .parse()
                .with_context(|| format!("PORT must be a valid port number, got {port:?}"))?,
            Err(_) => DEFAULT_PORT,
        };

        let admin_seed = match (env::var("ADMIN_EMAIL"), env::var("ADMIN_PASSWORD")) {
            (Ok(email), Ok(password)) => Some(AdminSeed {
                name: env::var("ADMIN_NAME").unwrap_or_else(|_| "Admin".to_string()),
                email,
                password,
            }),
            _ => None,
        };

        Ok(Config {
            db_url,
            jwt_secret,
            port,
            admin_seed,
        })
    }
}
