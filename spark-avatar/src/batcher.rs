use std::{collections::HashSet, sync::Arc, time::Duration};

use tokio::{
    sync::{mpsc, oneshot},
    time::{sleep_until, Instant},
};
use tracing::{debug, error, warn};

use crate::{
    lookup_items, resolve_nearest, transport::AvatarTransport, AvatarConfig, AvatarError,
    AvatarLookupItem, AvatarLookupResponse, AvatarRecord,
};

pub(crate) type Reply = oneshot::Sender<Result<AvatarRecord, AvatarError>>;
pub(crate) type QueueTx = mpsc::UnboundedSender<PendingRequest>;
type QueueRx = mpsc::UnboundedReceiver<PendingRequest>;

#[derive(Debug)]
pub(crate) struct PendingRequest {
    pub user_id: String,
    pub size: u32,
    pub reply: Reply,
}

/// Requests that will share one outbound lookup.
#[derive(Debug, Default)]
struct BatchWindow {
    requests: Vec<PendingRequest>,
    distinct: HashSet<(String, u32)>,
}

impl BatchWindow {
    fn open(first: PendingRequest) -> Self {
        let mut window = Self::default();
        window.push(first);
        window
    }

    fn push(&mut self, request: PendingRequest) {
        self.distinct.insert((request.user_id.clone(), request.size));
        self.requests.push(request);
    }

    fn distinct_len(&self) -> usize {
        self.distinct.len()
    }

    fn lookup_items(&self) -> Vec<AvatarLookupItem> {
        lookup_items(
            self.requests
                .iter()
                .map(|request| (request.user_id.as_str(), request.size)),
        )
    }
}

/// Owns the queue of one [`crate::AvatarClient`] and turns it into bulk lookups.
pub(crate) struct Batcher<T> {
    transport: Arc<T>,
    wait: Duration,
    max_wait: Duration,
    max_calls: usize,
}

impl<T: AvatarTransport> Batcher<T> {
    /// Starts the batcher task and returns the sending side of its queue.
    ///
    /// The task ends once every sender is dropped and the last window has
    /// been flushed.
    pub fn spawn(transport: Arc<T>, config: &AvatarConfig) -> QueueTx {
        let (tx, rx) = mpsc::unbounded_channel();
        let batcher = Self {
            transport,
            wait: config.wait(),
            max_wait: config.max_wait(),
            max_calls: config.max_calls(),
        };
        tokio::spawn(batcher.run(rx));
        tx
    }

    async fn run(self, mut queue: QueueRx) {
        while let Some(first) = queue.recv().await {
            let mut window = BatchWindow::open(first);
            let queue_closed = self.fill(&mut window, &mut queue).await;

            self.flush(window).await;

            if queue_closed {
                break;
            }
        }

        debug!("Avatar batcher stopped");
    }

    /// Collects requests until the window closes. Returns `true` when the
    /// queue was closed while filling.
    async fn fill(&self, window: &mut BatchWindow, queue: &mut QueueRx) -> bool {
        let ceiling = Instant::now() + self.max_wait;

        while window.distinct_len() < self.max_calls {
            let deadline = (Instant::now() + self.wait).min(ceiling);

            tokio::select! {
                biased;
                _ = sleep_until(deadline) => return false,
                next = queue.recv() => match next {
                    Some(request) => window.push(request),
                    None => return true,
                },
            }
        }

        false
    }

    async fn flush(&self, window: BatchWindow) {
        let items = window.lookup_items();
        debug!(
            users = items.len(),
            requests = window.requests.len(),
            "Sending avatar batch"
        );

        match self.transport.lookup(&items).await {
            Ok(response) => {
                for request in window.requests {
                    let result = resolve(&response, &request.user_id, request.size);
                    if result.is_err() {
                        warn!(
                            user_id = %request.user_id,
                            size = request.size,
                            "Avatar missing from batch response"
                        );
                    }
                    let _ = request.reply.send(result);
                }
            }
            Err(err) => {
                error!(
                    error = %err,
                    requests = window.requests.len(),
                    "Avatar batch failed"
                );
                for request in window.requests {
                    let _ = request.reply.send(Err(err.clone()));
                }
            }
        }
    }
}

fn resolve(
    response: &AvatarLookupResponse,
    user_id: &str,
    size: u32,
) -> Result<AvatarRecord, AvatarError> {
    response
        .sizes_for(user_id)
        .and_then(|sizes| resolve_nearest(sizes, size))
        .cloned()
        .ok_or_else(|| AvatarError::NotFound(user_id.to_string()))
}
