//! Weekly check-in reminder emails for clients.

use std::sync::Arc;

use async_trait::async_trait;
use derive_more::Display;
use futures::future;
use itertools::Itertools as _;
use tracing::{info, warn};

use crate::{
    config::Recipient,
    mail::{Address, Mailer, Message},
};

const SUBJECT: &str = "Haftalık check-in zamanı";

#[async_trait]
pub trait ReminderSender: Send + Sync {
    async fn send_weekly_checkin_reminder_emails(&self) -> Result<(), Error>;
}

#[derive(Debug, Display)]
pub enum Error {
    /// Addresses the reminder could not be delivered to.
    #[display("reminder not delivered to {}", _0.iter().join(", "))]
    Undelivered(Vec<String>),
}

impl std::error::Error for Error {}

pub struct WeeklyCheckinReminder {
    mailer: Arc<dyn Mailer>,
    recipients: Vec<Recipient>,
    checkin_url: String,
}

impl WeeklyCheckinReminder {
    pub fn new(
        mailer: Arc<dyn Mailer>,
        recipients: Vec<Recipient>,
        public_url: &str,
    ) -> Self {
        Self {
            mailer,
            recipients,
            checkin_url: format!(
                "{}/weekly-checkin",
                public_url.trim_end_matches('/'),
            ),
        }
    }

    fn message(&self, recipient: &Recipient) -> Message {
        Message {
            to: Address {
                email: recipient.email.clone(),
                name: recipient.name.clone(),
            },
            subject: SUBJECT.to_owned(),
            html_body: format!(
                "<p>Merhaba {name},</p>\
                 <p>Bu haftanın check-in formunu doldurmayı unutma: \
                 <a href=\"{url}\">{url}</a></p>",
                name = escape_html(&recipient.name),
                url = escape_html(&self.checkin_url),
            ),
        }
    }
}

/// Escapes text for use in HTML element content and quoted attributes.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[async_trait]
impl ReminderSender for WeeklyCheckinReminder {
    async fn send_weekly_checkin_reminder_emails(&self) -> Result<(), Error> {
        if self.recipients.is_empty() {
            info!("no reminder recipients configured");
            return Ok(());
        }

        let messages =
            self.recipients.iter().map(|r| self.message(r)).collect_vec();
        let results =
            future::join_all(messages.iter().map(|m| self.mailer.send(m)))
                .await;

        let undelivered = messages
            .iter()
            .zip(results)
            .filter_map(|(message, result)| {
                let e = result.err()?;
                warn!(
                    to = %message.to.email,
                    error = %e,
                    "reminder not delivered",
                );
                Some(message.to.email.clone())
            })
            .collect_vec();

        info!(
            sent = messages.len() - undelivered.len(),
            failed = undelivered.len(),
            "weekly check-in reminders processed",
        );
        if undelivered.is_empty() {
            Ok(())
        } else {
            Err(Error::Undelivered(undelivered))
        }
    }
}
