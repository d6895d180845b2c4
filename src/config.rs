use std::{env, path::PathBuf};

use anyhow::{Context, Result};

/// Runtime configuration, read once from the environment at boot.
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub token_secret: String,
    pub port: u16,
    pub cors_origin: String,
    pub upload_dir: PathBuf,
    pub serve_frontend: bool,
    pub default_admin: Option<DefaultAdmin>,
    pub mail: Option<MailSettings>,
}

/// Bootstrap credentials for the seed admin account.
#[derive(Clone, Debug)]
pub struct DefaultAdmin {
    pub email: String,
    pub password: String,
}

/// SMTP relay settings for the outbound notifier.
#[derive(Clone, Debug)]
pub struct MailSettings {
    pub host: String,
    pub username: String,
    pub password: String,
    pub notify_address: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL env var is missing")?;
        let token_secret = env::var("TOKEN_SECRET").context("TOKEN_SECRET env var is missing")?;

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("PORT is not a valid port number: {raw}"))?,
            Err(_) => 5000,
        };

        let cors_origin =
            env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:5173".to_string());

        let upload_dir = PathBuf::from(env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".into()));

        let serve_frontend = env::var("APP_ENV")
            .map(|mode| mode == "production")
            .unwrap_or(false);

        let default_admin = match (
            env::var("DEFAULT_ADMIN_EMAIL"),
            env::var("DEFAULT_ADMIN_PASSWORD"),
        ) {
            (Ok(email), Ok(password)) => Some(DefaultAdmin { email, password }),
            _ => None,
        };

        let mail = match (env::var("SMTP_USERNAME"), env::var("SMTP_PASSWORD")) {
            (Ok(username), Ok(password)) => {
                let host = env::var("SMTP_HOST").unwrap_or_else(|_| "smtp.gmail.com".to_string());
                let notify_address = env::var("NOTIFY_EMAIL").unwrap_or_else(|_| username.clone());
                Some(MailSettings {
                    host,
                    username,
                    password,
                    notify_address,
                })
            }
            _ => None,
        };

        Ok(Self {
            database_url,
            token_secret,
            port,
            cors_origin,
            upload_dir,
            serve_frontend,
            default_admin,
            mail,
        })
    }
}
