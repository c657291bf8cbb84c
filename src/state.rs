use std::sync::Arc;

use crate::auth::repo::{PgUserStore, UserStore};
use crate::config::AppConfig;
use crate::db;
use crate::mail::{LogMailer, Mailer, SmtpMailer};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);

        let pool = db::connect(&config).await?;
        db::run_migrations(&pool).await;
        let users = Arc::new(PgUserStore::new(pool)) as Arc<dyn UserStore>;

        let mailer = match &config.mail.smtp {
            Some(smtp) => {
                tracing::info!(host = %smtp.host, port = smtp.port, "using SMTP mailer");
                Arc::new(SmtpMailer::new(smtp, &config.mail.from)?) as Arc<dyn Mailer>
            }
            None => {
                tracing::warn!("SMTP_HOST not set; verification mail will only be logged");
                Arc::new(LogMailer) as Arc<dyn Mailer>
            }
        };

        Ok(Self::from_parts(config, users, mailer))
    }

    pub fn from_parts(config: Arc<AppConfig>, users: Arc<dyn UserStore>, mailer: Arc<dyn Mailer>) -> Self {
        Self { config, users, mailer }
    }
}
