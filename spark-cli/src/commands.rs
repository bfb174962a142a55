use anyhow::{Context, Result};
use futures::{future::join_all, stream::select_all, StreamExt};
use spark_avatar::{AvatarClient, HttpAvatarTransport};
use spark_mercury::{MercuryClient, MercuryEvent, OFFLINE};
use tracing::{info, warn};

use crate::config::Settings;

/// Looks up every user concurrently so the lookups share one batch.
pub async fn avatar(settings: &Settings, user_ids: &[String], size: Option<u32>) -> Result<()> {
    let transport =
        HttpAvatarTransport::new(&settings.service.avatar_url, settings.access_token()?);
    let client = AvatarClient::new(transport, settings.avatar.clone());

    let results = join_all(
        user_ids
            .iter()
            .map(|user_id| client.retrieve_avatar_url(user_id, size)),
    )
    .await;

    let mut failures = 0;
    for (user_id, result) in user_ids.iter().zip(results) {
        match result {
            Ok(url) => println!("{}: {}", user_id, url),
            Err(e) => {
                failures += 1;
                println!("{}: error: {}", user_id, e);
            }
        }
    }

    anyhow::ensure!(
        failures == 0,
        "{} of {} avatar lookups failed",
        failures,
        user_ids.len()
    );
    Ok(())
}

pub async fn listen(settings: &Settings, events: &[String]) -> Result<()> {
    let client = MercuryClient::new(settings.mercury_config(), settings.access_token()?);
    let mut events = select_all(events.iter().map(|name| client.subscribe(name.as_str())));
    let mut offline = client.subscribe(OFFLINE);

    client
        .connect()
        .await
        .context("Failed to connect to Mercury")?;
    info!("Listening for events, press Ctrl-C to stop");

    loop {
        tokio::select! {
            Some(event) = events.next() => println!("{}", describe_event(&event)),
            _ = offline.recv() => {
                warn!("Mercury went offline");
                break;
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    client.disconnect().await;
    Ok(())
}

pub fn describe_event(event: &MercuryEvent) -> String {
    match event.activity() {
        Ok(Some(activity)) => {
            let actor = activity
                .actor
                .as_ref()
                .and_then(|actor| actor.display_name.as_deref().or(actor.id.as_deref()))
                .unwrap_or("unknown");
            let object = activity
                .object
                .as_ref()
                .and_then(|object| object.display_name.as_deref())
                .unwrap_or("");
            format!("{} {} {}: {}", event.name, actor, activity.verb, object)
        }
        _ => format!("{} {}", event.name, event.data),
    }
}
