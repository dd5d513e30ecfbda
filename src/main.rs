use std::{env, error::Error, future, sync::Arc};

use tokio::{fs, net, signal, sync::watch};
use tracing::{info, warn};
use tracing_subscriber::{
    layer::SubscriberExt as _, util::SubscriberInitExt as _, EnvFilter,
};

use fitcoach::{
    auth::Keys,
    mail::HttpMailer,
    reminder::WeeklyCheckinReminder,
    scheduler::{self, MailScheduler, Registration, TokioRegistry},
    server::{self, AppState},
    Config,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fitcoach=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path =
        env::var("FITCOACH_CONFIG").unwrap_or_else(|_| "config.toml".into());
    let config = fs::read_to_string(&config_path).await?;
    let config = toml::from_str::<Config>(&config)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mailer = HttpMailer::new(&config.mail)?;
    let reminder = WeeklyCheckinReminder::new(
        Arc::new(mailer),
        config.reminder.recipients,
        &config.public_url,
    );
    let mail_scheduler = Arc::new(MailScheduler::new(
        Arc::new(TokioRegistry::new(shutdown_rx)),
        Arc::new(reminder),
    ));
    match mail_scheduler.ensure(&scheduler::Settings::from_env())? {
        Registration::Registered => info!("weekly check-in scheduler started"),
        Registration::Disabled => {
            warn!("weekly check-in scheduler not started")
        }
        Registration::AlreadyInitialized => {}
    }

    let cors = server::cors(&config.http.cors)?;
    let state = Arc::new(AppState {
        keys: Keys::from_config(&config.jwt),
        scheduler: mail_scheduler,
    });
    let app = server::app(server::routes(), state, cors);

    let listener = net::TcpListener::bind(config.http.server.addr).await?;
    info!(addr = %config.http.server.addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = signal::ctrl_c().await {
                warn!("failed to listen for shutdown signal: {e}");
                future::pending::<()>().await;
            }
        })
        .await?;

    info!("shutting down");
    let _ = shutdown_tx.send(true);

    Ok(())
}
