// src/contact.rs
//! Contact form: validates the visitor's message and hands delivery to an
//! EmailJS-compatible transactional mail endpoint.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use lettre::message::Mailbox;
use lettre::Address;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::feeds::config::ContactConfig;
use crate::feeds::transport::Transport;

const MAX_MESSAGE_CHARS: usize = 5_000;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl ContactMessage {
    /// Trimmed copy with a parsed sender; fails on empty fields or a bad address.
    pub fn validate(&self) -> Result<(Mailbox, String)> {
        let name = self.name.trim();
        let message = self.message.trim();
        if name.is_empty() {
            bail!("name is required");
        }
        if message.is_empty() {
            bail!("message is required");
        }
        if message.chars().count() > MAX_MESSAGE_CHARS {
            bail!("message is longer than {MAX_MESSAGE_CHARS} characters");
        }
        let address: Address = self
            .email
            .trim()
            .parse()
            .map_err(|e| anyhow!("invalid email address: {e}"))?;
        Ok((Mailbox::new(Some(name.to_string()), address), message.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    Idle,
    Sending,
    Success,
    Error,
}

pub struct ContactMailer {
    cfg: ContactConfig,
    transport: Arc<dyn Transport>,
    status: Arc<Mutex<ContactStatus>>,
    reset_after: Duration,
}

impl ContactMailer {
    pub fn new(cfg: ContactConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            cfg,
            transport,
            status: Arc::new(Mutex::new(ContactStatus::Idle)),
            reset_after: Duration::from_secs(3),
        }
    }

    /// How long Success/Error stays visible before falling back to Idle.
    pub fn with_reset_after(mut self, d: Duration) -> Self {
        self.reset_after = d;
        self
    }

    pub fn is_configured(&self) -> bool {
        !self.cfg.service_id.is_empty()
            && !self.cfg.template_id.is_empty()
            && !self.cfg.public_key.is_empty()
    }

    pub fn status(&self) -> ContactStatus {
        *self.status.lock().expect("contact status poisoned")
    }

    fn set_status(&self, s: ContactStatus) {
        *self.status.lock().expect("contact status poisoned") = s;
    }

    /// Deliver one message. Status goes Sending -> Success/Error and drops back
    /// to Idle after `reset_after`.
    pub async fn send(&self, msg: &ContactMessage) -> Result<()> {
        let (from, message) = msg.validate()?;
        if !self.is_configured() {
            bail!("contact mail is not configured");
        }

        self.set_status(ContactStatus::Sending);
        let body = json!({
            "service_id": self.cfg.service_id,
            "template_id": self.cfg.template_id,
            "user_id": self.cfg.public_key,
            "template_params": {
                "from_name": from.name.clone().unwrap_or_default(),
                "from_email": from.email.to_string(),
                "message": message,
                "to_name": self.cfg.to_name,
            }
        });

        let res = self
            .transport
            .post_json(&self.cfg.endpoint, &body)
            .await
            .context("contact mail delivery");

        let outcome = if res.is_ok() {
            tracing::info!(target: "contact", "contact message delivered");
            ContactStatus::Success
        } else {
            tracing::warn!(target: "contact", error = ?res.as_ref().err(), "contact message failed");
            ContactStatus::Error
        };
        self.set_status(outcome);
        self.schedule_reset(outcome);
        res
    }

    fn schedule_reset(&self, from: ContactStatus) {
        let status = Arc::clone(&self.status);
        let delay = self.reset_after;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut s = status.lock().expect("contact status poisoned");
            // A newer submission owns the status now.
            if *s == from {
                *s = ContactStatus::Idle;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeds::transport::{FixtureTransport, RecordedRequest};

    const ENDPOINT: &str = "http://mail/send";

    fn cfg() -> ContactConfig {
        ContactConfig {
            endpoint: ENDPOINT.into(),
            service_id: "svc".into(),
            template_id: "tpl".into(),
            public_key: "pk".into(),
            to_name: "Owner".into(),
        }
    }

    fn msg(email: &str) -> ContactMessage {
        ContactMessage {
            name: " Ada ".into(),
            email: email.into(),
            message: "Hello there".into(),
        }
    }

    #[test]
    fn rejects_bad_address_and_empty_fields() {
        assert!(msg("not-an-email").validate().is_err());
        let mut m = msg("ada@example.com");
        m.message = "   ".into();
        assert!(m.validate().is_err());
        assert!(msg("ada@example.com").validate().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn posts_template_fields_and_resets_status() {
        let t = Arc::new(FixtureTransport::new().with_status(ENDPOINT, 200));
        let mailer = ContactMailer::new(cfg(), t.clone());

        mailer.send(&msg("ada@example.com")).await.unwrap();
        assert_eq!(mailer.status(), ContactStatus::Success);

        let RecordedRequest::Post { body, .. } = &t.requests()[0] else {
            panic!("expected POST");
        };
        assert_eq!(body["service_id"], "svc");
        assert_eq!(body["user_id"], "pk");
        assert_eq!(body["template_params"]["from_name"], "Ada");
        assert_eq!(body["template_params"]["from_email"], "ada@example.com");
        assert_eq!(body["template_params"]["to_name"], "Owner");

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(mailer.status(), ContactStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn provider_failure_sets_error() {
        let t = Arc::new(FixtureTransport::new().with_status(ENDPOINT, 400));
        let mailer = ContactMailer::new(cfg(), t);
        assert!(mailer.send(&msg("ada@example.com")).await.is_err());
        assert_eq!(mailer.status(), ContactStatus::Error);
    }

    #[tokio::test]
    async fn unconfigured_mailer_refuses() {
        let t = Arc::new(FixtureTransport::new());
        let mailer = ContactMailer::new(ContactConfig::default(), t.clone());
        assert!(mailer.send(&msg("ada@example.com")).await.is_err());
        assert!(t.requests().is_empty());
        assert_eq!(mailer.status(), ContactStatus::Idle);
    }
}
