use chrono::{DateTime, Duration, Utc};
use dotenvy::dotenv;
use material_orders::{
    config::{self, catalog::seed_catalog, database},
    core::{activity, credentials, session},
    errors::Result,
};
use sea_orm::DatabaseConnection;
use std::env;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

struct Maintenance {
    idle_timeout: Duration,
    retention_days: i64,
    last_trim: Option<DateTime<Utc>>,
}

impl Maintenance {
    async fn run_once(&mut self, db: &DatabaseConnection, now: DateTime<Utc>) -> Result<()> {
        session::purge_expired_sessions(db, now, self.idle_timeout).await?;
        let trim_due = self
            .last_trim
            .is_none_or(|last| now - last >= Duration::days(1));
        if trim_due {
            activity::trim_activity(db, self.retention_days, now).await?;
            self.last_trim = Some(now);
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Load store settings and the seed catalog
    let app_config = config::load_app_configuration()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;

    // 4. Connect and create tables
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Provision the admin credential on first run
    let initial_password = env::var("ADMIN_INITIAL_PASSWORD").ok();
    credentials::provision_admin_password(&db, initial_password.as_deref(), Utc::now())
        .await
        .inspect_err(|e| error!("Failed to provision admin password: {}", e))?;

    // 6. Seed missing catalog rows
    seed_catalog(&db, &app_config.materials, Utc::now())
        .await
        .inspect_err(|e| error!("Failed to seed catalog: {}", e))?;

    // 7. Maintenance loop until Ctrl-C
    let settings = &app_config.settings;
    let mut maintenance = Maintenance {
        idle_timeout: settings.session.idle_timeout(),
        retention_days: settings.activity.retention_days,
        last_trim: None,
    };
    let mut interval =
        tokio::time::interval(std::time::Duration::from_secs(settings.session.tick_seconds.max(1)));
    info!(
        "Maintenance running every {}s; press Ctrl-C to stop",
        settings.session.tick_seconds
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(e) = maintenance.run_once(&db, Utc::now()).await {
                    error!("Maintenance tick failed: {}", e);
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal?;
                info!("Shutting down");
                break;
            }
        }
    }

    db.close().await?;
    Ok(())
}
