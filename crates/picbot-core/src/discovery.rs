use std::{collections::HashSet, sync::Arc, time::Duration};

use tokio::{sync::mpsc, time::sleep};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{
    catalog::ThreadCatalog,
    domain::ImageMessage,
    filter::SharedFilter,
    ledger::ImageLedger,
    ports::BoardPort,
};

/// Producer half of the pipeline.
///
/// Polls the board index on a fixed interval, keeps the served set and the
/// image ledger (owned here, no shared state), and emits newly discovered
/// links onto the bounded channel. A full channel blocks the enqueue pass,
/// which is the sole backpressure onto discovery.
pub struct DiscoveryLoop {
    board: Arc<dyn BoardPort>,
    filter: SharedFilter,
    catalog: ThreadCatalog,
    ledger: ImageLedger,
    tx: mpsc::Sender<ImageMessage>,
    poll_interval: Duration,
}

impl DiscoveryLoop {
    pub fn new(
        board: Arc<dyn BoardPort>,
        filter: SharedFilter,
        tx: mpsc::Sender<ImageMessage>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            board,
            filter,
            catalog: ThreadCatalog::new(),
            ledger: ImageLedger::new(),
            tx,
            poll_interval,
        }
    }

    /// Runs cycles until cancelled. The interval sleep follows every cycle,
    /// including ones skipped on an index fetch failure; cycles never
    /// overlap.
    pub async fn run(mut self, cancel: CancellationToken) {
        loop {
            self.run_cycle().await;
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sleep(self.poll_interval) => {}
            }
        }
    }

    /// One discovery cycle: index fetch, filter + per-thread detail fetches,
    /// eviction, then enqueue of every not-yet-sent link.
    pub async fn run_cycle(&mut self) {
        let index = match self.board.fetch_index().await {
            Ok(index) => index,
            Err(e) => {
                error!("index fetch failed, skipping cycle: {e}");
                return;
            }
        };

        let filter = self.filter.current().await;
        let mut current = HashSet::new();
        for thread in index {
            if !filter.any_matches(&thread.subject) {
                continue;
            }

            if self.catalog.mark_served(thread.id.clone()) {
                info!(thread = %thread.id, "thread added to served set");
            }
            current.insert(thread.id.clone());

            // A failed detail fetch skips this thread only.
            match self.board.fetch_thread_images(&thread.id).await {
                Ok(links) => {
                    for link in links {
                        self.ledger.record_discovered(link, thread.id.clone());
                    }
                }
                Err(e) => warn!(thread = %thread.id, "thread fetch failed, skipping: {e}"),
            }
        }

        let evicted = self.catalog.evict_missing(&current);
        if !evicted.is_empty() {
            for id in &evicted {
                info!(thread = %id, "thread left the served set");
            }
            // Any eviction resets the whole ledger, so images from
            // still-served threads become eligible for delivery again on
            // re-discovery.
            self.ledger.clear();
        }

        for (link, thread) in self.ledger.unsent() {
            // Recorded as sent before the push so a push blocked on
            // backpressure can never be recorded twice.
            self.ledger.mark_sent(link.clone(), thread.clone());
            if self.tx.send(ImageMessage { link, thread }).await.is_err() {
                // Dispatch is gone; nothing left to feed.
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::ThreadId,
        filter::SubjectFilter,
        testutil::ScriptedBoard,
    };

    fn dump_filter() -> SharedFilter {
        SharedFilter::new(SubjectFilter::compile(&[".*dump.*".to_string()]).unwrap())
    }

    fn pipeline(
        board: Arc<ScriptedBoard>,
    ) -> (DiscoveryLoop, mpsc::Receiver<ImageMessage>) {
        let (tx, rx) = mpsc::channel(16);
        let discovery = DiscoveryLoop::new(board, dump_filter(), tx, Duration::from_secs(60));
        (discovery, rx)
    }

    fn drain(rx: &mut mpsc::Receiver<ImageMessage>) -> Vec<ImageMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    #[tokio::test]
    async fn identical_cycles_enqueue_each_link_once() {
        let board = Arc::new(ScriptedBoard::default());
        board.set_index(&[("100", "Meme dump"), ("101", "Unrelated")]);
        board.set_images("100", &["https://board/b/src/1.jpg"]);

        let (mut discovery, mut rx) = pipeline(board);
        discovery.run_cycle().await;

        assert!(discovery.catalog.is_served(&ThreadId("100".to_string())));
        assert!(!discovery.catalog.is_served(&ThreadId("101".to_string())));
        assert_eq!(discovery.catalog.len(), 1);

        let msgs = drain(&mut rx);
        assert_eq!(
            msgs,
            vec![ImageMessage {
                link: "https://board/b/src/1.jpg".to_string(),
                thread: ThreadId("100".to_string()),
            }]
        );

        // Running discovery again over unchanged data enqueues nothing.
        discovery.run_cycle().await;
        discovery.run_cycle().await;
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn eviction_clears_whole_ledger_and_reenables_enqueue() {
        let board = Arc::new(ScriptedBoard::default());
        board.set_index(&[("100", "dump A"), ("200", "dump B")]);
        board.set_images("100", &["https://board/b/src/a.jpg"]);
        board.set_images("200", &["https://board/b/src/b.jpg"]);

        let (mut discovery, mut rx) = pipeline(board.clone());
        discovery.run_cycle().await;
        assert_eq!(drain(&mut rx).len(), 2);

        // Thread 200 drops out of the index. The eviction pass clears the
        // whole ledger, including this cycle's fresh discoveries, so the
        // cycle enqueues nothing.
        board.set_index(&[("100", "dump A")]);
        discovery.run_cycle().await;
        assert!(!discovery.catalog.is_served(&ThreadId("200".to_string())));
        assert_eq!(discovery.catalog.len(), 1);
        assert!(drain(&mut rx).is_empty());

        // On the next cycle thread 100's already-seen image is re-enqueued.
        discovery.run_cycle().await;
        let msgs = drain(&mut rx);
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].link, "https://board/b/src/a.jpg");
    }

    #[tokio::test]
    async fn served_set_empties_when_all_threads_disappear() {
        let board = Arc::new(ScriptedBoard::default());
        board.set_index(&[("100", "Meme dump")]);
        board.set_images("100", &["https://board/b/src/1.jpg"]);

        let (mut discovery, mut rx) = pipeline(board.clone());
        discovery.run_cycle().await;
        drain(&mut rx);

        board.set_index(&[]);
        discovery.run_cycle().await;
        assert!(discovery.catalog.is_empty());

        // A new thread reusing an already-seen link is eligible again.
        board.set_index(&[("102", "another dump")]);
        board.set_images("102", &["https://board/b/src/1.jpg"]);
        discovery.run_cycle().await;
        let msgs = drain(&mut rx);
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].thread, ThreadId("102".to_string()));
    }

    #[tokio::test]
    async fn index_fetch_failure_skips_cycle_without_state_change() {
        let board = Arc::new(ScriptedBoard::default());
        board.set_index(&[("100", "Meme dump")]);
        board.set_images("100", &["https://board/b/src/1.jpg"]);

        let (mut discovery, mut rx) = pipeline(board.clone());
        discovery.run_cycle().await;
        drain(&mut rx);

        *board.fail_index.lock().unwrap() = true;
        discovery.run_cycle().await;
        // No eviction happened: the thread is still served, nothing new.
        assert!(discovery.catalog.is_served(&ThreadId("100".to_string())));
        assert!(drain(&mut rx).is_empty());

        *board.fail_index.lock().unwrap() = false;
        discovery.run_cycle().await;
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn thread_fetch_failure_skips_only_that_thread() {
        let board = Arc::new(ScriptedBoard::default());
        board.set_index(&[("100", "dump A"), ("200", "dump B")]);
        board.set_images("100", &["https://board/b/src/a.jpg"]);
        board.set_images("200", &["https://board/b/src/b.jpg"]);
        board
            .fail_threads
            .lock()
            .unwrap()
            .insert(ThreadId("200".to_string()));

        let (mut discovery, mut rx) = pipeline(board.clone());
        discovery.run_cycle().await;

        // The failing thread is still marked served; only its images are
        // missing this cycle.
        assert_eq!(discovery.catalog.len(), 2);
        let msgs = drain(&mut rx);
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].link, "https://board/b/src/a.jpg");

        board.fail_threads.lock().unwrap().clear();
        discovery.run_cycle().await;
        let msgs = drain(&mut rx);
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].link, "https://board/b/src/b.jpg");
    }
}
