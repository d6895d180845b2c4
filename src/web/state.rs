use std::{path::Path, sync::Arc};

use anyhow::{Context, Result, anyhow};
use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{config::Config, mail::Notifier, web::auth};

#[derive(Clone)]
pub struct AppState {
    pool: PgPool,
    config: Arc<Config>,
    notifier: Option<Notifier>,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("failed to connect to Postgres")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run database migrations")?;

        let notifier = match &config.mail {
            Some(settings) => Notifier::from_settings(settings),
            None => {
                warn!("SMTP credentials are not set, notification emails disabled");
                None
            }
        };

        Ok(Self {
            pool,
            config: Arc::new(config),
            notifier,
        })
    }

    /// Idempotent bootstrap of the seed admin account. Skipped with a warning
    /// when the environment does not provide credentials.
    pub async fn ensure_default_admin(&self) -> Result<()> {
        let Some(credentials) = &self.config.default_admin else {
            warn!("default admin credentials are not set, skipping bootstrap");
            return Ok(());
        };

        let existing: Option<Uuid> = sqlx::query_scalar("SELECT id FROM admins WHERE email = $1")
            .bind(&credentials.email)
            .fetch_optional(&self.pool)
            .await
            .context("failed to check for existing default admin")?;

        if existing.is_some() {
            info!("default admin already exists");
            return Ok(());
        }

        let password_hash = auth::hash_password(&credentials.password)
            .map_err(|err| anyhow!("failed to hash default admin password: {err}"))?;

        sqlx::query("INSERT INTO admins (id, name, email, password_hash) VALUES ($1, $2, $3, $4)")
            .bind(Uuid::new_v4())
            .bind("Super Admin")
            .bind(&credentials.email)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .context("failed to insert default admin")?;

        info!(email = %credentials.email, "default admin account created");
        Ok(())
    }

    pub fn pool_ref(&self) -> &PgPool {
        &self.pool
    }

    pub fn token_secret(&self) -> &str {
        &self.config.token_secret
    }

    pub fn upload_dir(&self) -> &Path {
        &self.config.upload_dir
    }

    pub fn cors_origin(&self) -> &str {
        &self.config.cors_origin
    }

    /// Production mode serves the built frontend and marks cookies Secure.
    pub fn is_production(&self) -> bool {
        self.config.serve_frontend
    }

    pub fn notifier(&self) -> Option<&Notifier> {
        self.notifier.as_ref()
    }
}
