use std::{net, time};

use serde::Deserialize;

#[derive(Deserialize)]
pub struct Config {
    /// Public origin of the site, used for links in outgoing mail.
    pub public_url: String,
    pub http: Http,
    pub jwt: Jwt,
    pub mail: Mail,
    #[serde(default)]
    pub reminder: Reminder,
}

#[derive(Deserialize)]
pub struct Http {
    pub server: Server,
    pub cors: Cors,
}

#[derive(Deserialize)]
pub struct Server {
    pub addr: net::SocketAddr,
}

#[derive(Deserialize)]
pub struct Cors {
    pub allowed_origins: Vec<String>,
}

#[derive(Deserialize)]
pub struct Jwt {
    pub secret: String,
    /// Lifetime of the session tokens issued with this secret.
    #[serde(with = "humantime_serde")]
    pub expiration_time: time::Duration,
}

#[derive(Deserialize)]
pub struct Mail {
    pub endpoint: String,
    pub api_token: String,
    pub from: String,
    #[serde(with = "humantime_serde", default = "Mail::default_timeout")]
    pub timeout: time::Duration,
}

impl Mail {
    fn default_timeout() -> time::Duration {
        time::Duration::from_secs(30)
    }
}

#[derive(Default, Deserialize)]
pub struct Reminder {
    #[serde(default)]
    pub recipients: Vec<Recipient>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct Recipient {
    pub email: String,
    pub name: String,
}
