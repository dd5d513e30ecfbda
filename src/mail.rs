//! Outgoing mail through a transactional-mail HTTP API.

use async_trait::async_trait;
use derive_more::{Display, From};
use reqwest::StatusCode;
use serde::Serialize;
use tracing::debug;

use crate::config;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Message {
    pub to: Address,
    pub subject: String,
    pub html_body: String,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Address {
    pub email: String,
    pub name: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &Message) -> Result<(), Error>;
}

#[derive(Debug, Display, From)]
pub enum Error {
    #[from]
    #[display("mail transport failed: {_0}")]
    Transport(reqwest::Error),
    #[display("mail API rejected the message with status {_0}")]
    Rejected(StatusCode),
}

impl std::error::Error for Error {}

pub struct HttpMailer {
    client: reqwest::Client,
    endpoint: String,
    api_token: String,
    from: String,
}

impl HttpMailer {
    pub fn new(config: &config::Mail) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_token: config.api_token.clone(),
            from: config.from.clone(),
        })
    }
}

#[derive(Serialize)]
struct Request<'a> {
    from: Sender<'a>,
    to: [Recipient<'a>; 1],
    subject: &'a str,
    htmlbody: &'a str,
}

#[derive(Serialize)]
struct Sender<'a> {
    address: &'a str,
}

#[derive(Serialize)]
struct Recipient<'a> {
    email_address: RecipientAddress<'a>,
}

#[derive(Serialize)]
struct RecipientAddress<'a> {
    address: &'a str,
    name: &'a str,
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: &Message) -> Result<(), Error> {
        let request = Request {
            from: Sender {
                address: &self.from,
            },
            to: [Recipient {
                email_address: RecipientAddress {
                    address: &message.to.email,
                    name: &message.to.name,
                },
            }],
            subject: &message.subject,
            htmlbody: &message.html_body,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::AUTHORIZATION, &self.api_token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Rejected(status));
        }
        debug!(to = %message.to.email, "mail accepted");
        Ok(())
    }
}
