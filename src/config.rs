use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub smtp_host: String,
    /// SMTP login; without credentials mail is only logged.
    pub credentials: Option<(String, String)>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub session: SessionConfig,
    pub mail: MailConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = match std::env::var("DATABASE_URL") {
            Ok(url) => url,
            Err(_) => database_url_from_parts()?,
        };
        let max_connections = std::env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);
        let session = SessionConfig {
            secret: std::env::var("SESSION_SECRET")?,
            issuer: std::env::var("SESSION_ISSUER").unwrap_or_else(|_| "roster".into()),
            audience: std::env::var("SESSION_AUDIENCE").unwrap_or_else(|_| "roster-web".into()),
            ttl_minutes: std::env::var("SESSION_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24),
        };
        let credentials = match (std::env::var("EMAIL_USER"), std::env::var("EMAIL_PASS")) {
            (Ok(user), Ok(pass)) if !user.is_empty() => Some((user, pass)),
            _ => None,
        };
        let mail = MailConfig {
            smtp_host: std::env::var("SMTP_HOST").unwrap_or_else(|_| "smtp.gmail.com".into()),
            credentials,
        };
        Ok(Self {
            database_url,
            max_connections,
            session,
            mail,
        })
    }
}

fn database_url_from_parts() -> anyhow::Result<String> {
    let host = std::env::var("DB_HOST")?;
    let user = std::env::var("DB_USER")?;
    let password = std::env::var("DB_PASSWORD").unwrap_or_default();
    let name = std::env::var("DB_NAME")?;
    let port = std::env::var("DB_PORT").unwrap_or_else(|_| "5432".into());
    Ok(format!("postgres://{user}:{password}@{host}:{port}/{name}"))
}
