use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::MailConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WelcomeEmail {
    pub to: String,
    pub username: String,
}

impl WelcomeEmail {
    pub const SUBJECT: &'static str = "Welcome!";

    pub fn body(&self) -> String {
        format!("Hi {},\n\nThank you for signing up!", self.username)
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_welcome(&self, mail: &WelcomeEmail) -> anyhow::Result<()>;
}

/// Delivers over SMTP with implicit TLS (port 465).
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(host: &str, user: &str, password: &str) -> anyhow::Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .with_context(|| format!("smtp relay {host}"))?
            .credentials(Credentials::new(user.to_string(), password.to_string()))
            .build();
        let from = user.parse::<Mailbox>().context("sender address")?;
        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_welcome(&self, mail: &WelcomeEmail) -> anyhow::Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(mail.to.parse::<Mailbox>().context("recipient address")?)
            .subject(WelcomeEmail::SUBJECT)
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body())
            .context("build message")?;
        self.transport.send(message).await.context("smtp send")?;
        Ok(())
    }
}

/// Used when no SMTP credentials are configured.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_welcome(&self, mail: &WelcomeEmail) -> anyhow::Result<()> {
        info!(to = %mail.to, "mail transport not configured; skipping welcome email");
        Ok(())
    }
}

/// Unusable SMTP settings degrade to `LogMailer`; signup must keep working.
pub fn mailer_from_config(cfg: &MailConfig) -> Arc<dyn Mailer> {
    let Some((user, password)) = &cfg.credentials else {
        return Arc::new(LogMailer);
    };
    match SmtpMailer::new(&cfg.smtp_host, user, password) {
        Ok(mailer) => Arc::new(mailer),
        Err(e) => {
            warn!(error = %format!("{e:#}"), host = %cfg.smtp_host, "smtp mailer disabled");
            Arc::new(LogMailer)
        }
    }
}

/// Hands emails to a background worker so the request path never waits on SMTP.
#[derive(Clone)]
pub struct MailQueue {
    tx: mpsc::UnboundedSender<WelcomeEmail>,
}

impl MailQueue {
    /// Spawns the delivery worker; must be called inside a Tokio runtime.
    pub fn start(mailer: Arc<dyn Mailer>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<WelcomeEmail>();
        tokio::spawn(async move {
            while let Some(mail) = rx.recv().await {
                match mailer.send_welcome(&mail).await {
                    Ok(()) => info!(to = %mail.to, "welcome email sent"),
                    Err(e) => warn!(error = %e, to = %mail.to, "welcome email failed"),
                }
            }
        });
        Self { tx }
    }

    /// Never fails the caller; a dead worker is only logged.
    pub fn enqueue(&self, mail: WelcomeEmail) {
        if let Err(e) = self.tx.send(mail) {
            warn!(to = %e.0.to, "mail worker stopped; dropping welcome email");
        }
    }
}
