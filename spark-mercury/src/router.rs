use std::{
    collections::HashMap,
    pin::Pin,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    task::{Context, Poll},
};

use futures::Stream;
use tokio::sync::mpsc;

use crate::MercuryEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscribers = Vec<(SubscriptionId, mpsc::UnboundedSender<MercuryEvent>)>;

#[derive(Default)]
struct RouterState {
    next_id: u64,
    by_name: HashMap<String, Subscribers>,
}

/// Registry of subscriptions, keyed by event name.
#[derive(Clone, Default)]
pub struct EventRouter {
    state: Arc<Mutex<RouterState>>,
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RouterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe(&self, name: impl Into<String>) -> Subscription {
        let name = name.into();
        let (sender, receiver) = mpsc::unbounded_channel();

        let mut state = self.lock();
        let id = SubscriptionId(state.next_id);
        state.next_id += 1;
        state
            .by_name
            .entry(name.clone())
            .or_default()
            .push((id, sender));

        Subscription {
            id,
            name,
            receiver,
            router: Arc::downgrade(&self.state),
        }
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        remove_subscriber(&mut self.lock(), id);
    }

    /// Delivers `event` to every subscriber of `event.name` and returns how
    /// many received it.
    pub fn dispatch(&self, event: &MercuryEvent) -> usize {
        let mut state = self.lock();
        let Some(subscribers) = state.by_name.get_mut(&event.name) else {
            return 0;
        };

        subscribers.retain(|(_, sender)| sender.send(event.clone()).is_ok());
        let delivered = subscribers.len();
        if subscribers.is_empty() {
            state.by_name.remove(&event.name);
        }

        delivered
    }

    pub fn subscriber_count(&self, name: &str) -> usize {
        self.lock().by_name.get(name).map_or(0, Vec::len)
    }
}

fn remove_subscriber(state: &mut RouterState, id: SubscriptionId) {
    state.by_name.retain(|_, subscribers| {
        subscribers.retain(|(subscriber, _)| *subscriber != id);
        !subscribers.is_empty()
    });
}

/// Receiving end of a subscription. Dropping it unsubscribes.
pub struct Subscription {
    id: SubscriptionId,
    name: String,
    receiver: mpsc::UnboundedReceiver<MercuryEvent>,
    router: Weak<Mutex<RouterState>>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Waits for the next event. Returns `None` once the client is gone.
    pub async fn recv(&mut self) -> Option<MercuryEvent> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Option<MercuryEvent> {
        self.receiver.try_recv().ok()
    }

    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(state) = self.router.upgrade() {
            let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
            remove_subscriber(&mut state, self.id);
        }
    }
}

impl Stream for Subscription {
    type Item = MercuryEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().receiver.poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ONLINE, OFFLINE};

    #[test]
    fn dispatch_reaches_only_matching_subscribers() {
        let router = EventRouter::new();
        let mut online = router.subscribe(ONLINE);
        let mut offline = router.subscribe(OFFLINE);

        let delivered = router.dispatch(&MercuryEvent::lifecycle(ONLINE));

        assert_eq!(delivered, 1);
        assert_eq!(online.try_recv().unwrap().name, ONLINE);
        assert!(offline.try_recv().is_none());
    }

    #[test]
    fn unsubscribed_channels_receive_nothing() {
        let router = EventRouter::new();
        let first = router.subscribe(ONLINE);
        let mut second = router.subscribe(ONLINE);
        assert_eq!(router.subscriber_count(ONLINE), 2);

        first.unsubscribe();

        assert_eq!(router.subscriber_count(ONLINE), 1);
        assert_eq!(router.dispatch(&MercuryEvent::lifecycle(ONLINE)), 1);
        assert!(second.try_recv().is_some());
    }

    #[test]
    fn unsubscribe_by_id() {
        let router = EventRouter::new();
        let subscription = router.subscribe(ONLINE);

        router.unsubscribe(subscription.id());

        assert_eq!(router.subscriber_count(ONLINE), 0);
        assert_eq!(router.dispatch(&MercuryEvent::lifecycle(ONLINE)), 0);
    }

    #[tokio::test]
    async fn subscription_ends_when_router_is_dropped() {
        let router = EventRouter::new();
        let mut subscription = router.subscribe(ONLINE);

        drop(router);

        assert!(subscription.recv().await.is_none());
    }
}
