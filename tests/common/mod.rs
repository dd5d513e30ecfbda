#![allow(dead_code)]

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use axum::Router;
use constcat::concat;
use fitcoach::{
    api,
    auth::Keys,
    reminder::{self, ReminderSender},
    scheduler::{Job, JobRegistry, MailScheduler, Schedule},
    server::{self, AppState, SharedAppState},
};
use reqwest::StatusCode;
use tokio::{net, task};

const API: &str = "/api";
const SESSION: &str = concat!(API, "/session");
const SCHEDULER_STATUS: &str = concat!(API, "/admin/scheduler");

/// Registry that keeps scheduled jobs instead of running them.
#[derive(Default)]
pub struct Recorder(Mutex<Vec<(Schedule, Arc<dyn Job>)>>);

impl Recorder {
    pub fn schedules(&self) -> Vec<Schedule> {
        self.0.lock().unwrap().iter().map(|(s, _)| s.clone()).collect()
    }

    pub fn jobs(&self) -> Vec<Arc<dyn Job>> {
        self.0.lock().unwrap().iter().map(|(_, j)| j.clone()).collect()
    }
}

impl JobRegistry for Recorder {
    fn schedule(&self, schedule: Schedule, job: Arc<dyn Job>) {
        self.0.lock().unwrap().push((schedule, job));
    }
}

/// Reminder routine that fails when told to.
#[derive(Default)]
pub struct Outbox {
    pub fail: bool,
}

#[async_trait]
impl ReminderSender for Outbox {
    async fn send_weekly_checkin_reminder_emails(
        &self,
    ) -> Result<(), reminder::Error> {
        if self.fail {
            Err(reminder::Error::Undelivered(vec!["ceren@example.com".into()]))
        } else {
            Ok(())
        }
    }
}

pub struct Server {
    pub base_url: String,
    pub keys: Keys,
    pub scheduler: Arc<MailScheduler>,
    pub registry: Arc<Recorder>,
}

pub async fn spawn() -> Server {
    spawn_with(Router::new(), Outbox::default()).await
}

pub async fn spawn_with(
    extra: Router<SharedAppState>,
    outbox: Outbox,
) -> Server {
    let keys = Keys::new(b"test-secret", Duration::from_secs(3600));
    let registry = Arc::new(Recorder::default());
    let scheduler =
        Arc::new(MailScheduler::new(registry.clone(), Arc::new(outbox)));
    let state = Arc::new(AppState {
        keys: keys.clone(),
        scheduler: scheduler.clone(),
    });
    let cors = server::cors(&fitcoach::config::Cors {
        allowed_origins: vec!["http://localhost:3000".into()],
    })
    .expect("invalid origin");
    let app = server::app(server::routes().merge(extra), state, cors);

    let listener = net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind");
    let addr = listener.local_addr().expect("no local address");
    task::spawn(async move {
        axum::serve(listener, app).await.expect("server failed");
    });

    Server {
        base_url: format!("http://{addr}"),
        keys,
        scheduler,
        registry,
    }
}

pub fn alice() -> api::SessionUser {
    api::SessionUser {
        id: api::user::Id::from(1),
        email: "alice@example.com".into(),
        name: "Alice".into(),
        role: api::Role::Admin,
        image: None,
    }
}

pub fn bora() -> api::SessionUser {
    api::SessionUser {
        id: api::user::Id::from(2),
        email: "bora@example.com".into(),
        name: "Bora".into(),
        role: api::Role::Trainer,
        image: Some("https://cdn.example/bora.png".into()),
    }
}

pub fn ceren() -> api::SessionUser {
    api::SessionUser {
        id: api::user::Id::from(3),
        email: "ceren@example.com".into(),
        name: "Ceren".into(),
        role: api::Role::Client,
        image: None,
    }
}

pub struct Client {
    inner: reqwest::Client,
    base_url: String,
    keys: Keys,
    pub auth_token: Option<String>,
}

impl Client {
    pub fn new(server: &Server) -> Self {
        Self {
            inner: reqwest::Client::new(),
            base_url: server.base_url.clone(),
            keys: server.keys.clone(),
            auth_token: None,
        }
    }

    pub fn auth(mut self, user: &api::SessionUser) -> Self {
        self.auth_token =
            Some(self.keys.issue(user).expect("failed to sign a token"));
        self
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let mut req = self.inner.get(format!("{}{path}", self.base_url));
        if let Some(token) = &self.auth_token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }
        req
    }

    pub async fn session(&self) -> Result<api::Session, StatusCode> {
        Ok(self
            .get(SESSION)
            .send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))?
            .json::<api::Session>()
            .await
            .expect("failed to get a response"))
    }

    pub async fn scheduler_status(
        &self,
    ) -> Result<api::scheduler::Status, StatusCode> {
        Ok(self
            .get(SCHEDULER_STATUS)
            .send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))?
            .json::<api::scheduler::Status>()
            .await
            .expect("failed to get a response"))
    }

    pub async fn page(&self, path: &str) -> (StatusCode, String) {
        let res = self
            .get(path)
            .send()
            .await
            .expect("failed to send a request");
        let status = res.status();
        (status, res.text().await.expect("failed to get a response"))
    }
}
