use std::sync::Arc;

use anyhow::Result;
use mountainwatch_core::{ConditionSource, MessageTransport, Settings, TicketTransport};
use mountainwatch_fetch::{OutdoorClient, Pacer};
use mountainwatch_notify::{JiraClient, SmtpMailer};
use mountainwatch_service::{
    DispatchResult, DispatchSettings, NotificationDispatcher, ReconciliationEngine, Watcher,
};
use mountainwatch_storage::Storage;

use super::banner;

/// Builds every handle once; nothing is created if the settings are invalid.
fn build_watcher(settings: &Settings) -> Result<Watcher> {
    let storage = Arc::new(Storage::new(&settings.store.db_path)?);
    let source: Arc<dyn ConditionSource> =
        Arc::new(OutdoorClient::new(&settings.source, Pacer::new(settings.pacing))?);
    let messenger: Arc<dyn MessageTransport> = Arc::new(SmtpMailer::new(&settings.mail)?);
    let tickets = match &settings.jira {
        Some(jira) => Some(Arc::new(JiraClient::new(jira)?) as Arc<dyn TicketTransport>),
        None => None,
    };

    let engine = ReconciliationEngine::new(Arc::clone(&storage), source);
    let dispatcher = NotificationDispatcher::new(
        storage,
        messenger,
        tickets,
        DispatchSettings::from_settings(settings),
    );
    Ok(Watcher::new(engine, dispatcher, settings.action)?)
}

pub(crate) async fn run_watch() -> Result<()> {
    let settings = Settings::from_env()?;
    tracing::debug!(?settings, "Settings loaded");
    let watcher = build_watcher(&settings)?;

    println!("{}", banner("START"));
    let report = watcher.run().await;
    println!("{report}");
    println!("{}", banner("END"));
    Ok(())
}

pub(crate) async fn run_process(id: &str) -> Result<()> {
    let settings = Settings::from_env()?;
    let watcher = build_watcher(&settings)?;

    match watcher.process(id).await? {
        DispatchResult::Dispatched(delivery) => {
            println!(
                "Condition {id}: message sent: {}, ticket: {:?}, fallback sent: {}",
                delivery.message_sent, delivery.ticket, delivery.fallback_sent
            );
        },
        skipped => println!("Condition {id}: {skipped:?}"),
    }
    Ok(())
}
