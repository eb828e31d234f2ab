//! The polling loop: fetch a batch, process it in order, sleep when idle.

use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::events::{Event, Fetcher, Processor};

pub const DEFAULT_IDLE_SLEEP: Duration = Duration::from_secs(1);

/// Outcome of a single fetch-and-process cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    /// Nothing new; the caller should idle.
    Idle,
    /// The fetch itself failed; nothing was processed.
    FetchFailed,
    Processed(BatchReport),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub handled: usize,
    pub failed: usize,
}

pub struct Consumer<F, P> {
    fetcher: F,
    processor: P,
    batch_size: usize,
    idle_sleep: Duration,
}

impl<F: Fetcher, P: Processor> Consumer<F, P> {
    pub fn new(fetcher: F, processor: P, batch_size: usize) -> Self {
        Self {
            fetcher,
            processor,
            batch_size,
            idle_sleep: DEFAULT_IDLE_SLEEP,
        }
    }

    pub fn with_idle_sleep(mut self, idle_sleep: Duration) -> Self {
        self.idle_sleep = idle_sleep;
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Run until `cancel` fires. Cancellation is observed between cycles and
    /// during the idle sleep only; an in-flight fetch or event is finished first.
    pub async fn run(&mut self, cancel: CancellationToken) {
        while !cancel.is_cancelled() {
            match self.tick().await {
                Tick::Idle => {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = sleep(self.idle_sleep) => {}
                    }
                }
                // Retried right away.
                Tick::FetchFailed => {}
                Tick::Processed(report) if report.failed > 0 => {
                    warn!(
                        handled = report.handled,
                        failed = report.failed,
                        "batch finished with failures"
                    );
                }
                Tick::Processed(_) => {}
            }
        }
        info!("consumer stopped");
    }

    pub async fn tick(&mut self) -> Tick {
        let events = match self.fetcher.fetch(self.batch_size).await {
            Ok(events) => events,
            Err(e) => {
                error!(error = %e, "consumer: fetch failed");
                return Tick::FetchFailed;
            }
        };

        if events.is_empty() {
            return Tick::Idle;
        }

        Tick::Processed(self.handle_events(events).await)
    }

    async fn handle_events(&self, events: Vec<Event>) -> BatchReport {
        let mut report = BatchReport::default();
        for event in events {
            info!(text = %event.text, "got new event");

            match self.processor.process(event).await {
                Ok(()) => report.handled += 1,
                Err(e) => {
                    error!(error = %e, "can't handle event");
                    report.failed += 1;
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use crate::domain::{ChatId, UpdateId};
    use crate::messaging::types::Update;
    use crate::testing::FakeTelegram;
    use crate::translator::UpdateTranslator;
    use crate::{Error, Result};

    /// Records every event text; fails on texts starting with "fail".
    #[derive(Clone, Default)]
    struct RecordingProcessor {
        seen: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Processor for RecordingProcessor {
        async fn process(&self, event: Event) -> Result<()> {
            self.seen.lock().unwrap().push(event.text.clone());
            if event.text.starts_with("fail") {
                return Err(Error::storage("boom"));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn failing_event_does_not_stop_the_batch() {
        let tg = Arc::new(FakeTelegram::default());
        tg.push_batch(vec![
            Update::message(1, 9, "Alice", "first"),
            Update::message(2, 9, "Alice", "fail second"),
            Update::message(3, 9, "Alice", "third"),
        ]);
        let processor = RecordingProcessor::default();
        let mut consumer = Consumer::new(UpdateTranslator::new(tg.clone()), processor.clone(), 100);

        let tick = consumer.tick().await;

        assert_eq!(
            tick,
            Tick::Processed(BatchReport {
                handled: 2,
                failed: 1
            })
        );
        assert_eq!(
            *processor.seen.lock().unwrap(),
            vec!["first", "fail second", "third"]
        );
        assert_eq!(consumer.fetcher().offset(), UpdateId(4));

        // Nothing is redelivered.
        assert_eq!(consumer.tick().await, Tick::Idle);
        assert_eq!(tg.requested_offsets(), vec![UpdateId(0), UpdateId(4)]);
    }

    #[tokio::test]
    async fn fetch_error_is_reported_and_recovered() {
        let tg = Arc::new(FakeTelegram::default());
        tg.push_batch(vec![Update::message(1, 9, "Alice", "x")]);
        tg.fail_next_fetch();
        let mut consumer = Consumer::new(
            UpdateTranslator::new(tg.clone()),
            RecordingProcessor::default(),
            100,
        );

        assert_eq!(consumer.tick().await, Tick::FetchFailed);
        assert_eq!(
            consumer.tick().await,
            Tick::Processed(BatchReport {
                handled: 1,
                failed: 0
            })
        );
    }

    #[tokio::test]
    async fn batches_are_bounded_by_batch_size() {
        let tg = Arc::new(FakeTelegram::default());
        tg.push_batch((1..=5).map(|id| Update::message(id, 9, "Alice", "x")).collect());
        let mut consumer = Consumer::new(
            UpdateTranslator::new(tg.clone()),
            RecordingProcessor::default(),
            2,
        );

        let mut sizes = Vec::new();
        while let Tick::Processed(r) = consumer.tick().await {
            sizes.push(r.handled);
        }
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[tokio::test]
    async fn run_processes_end_to_end_and_stops_on_cancel() {
        use crate::messages::Reply;
        use crate::processor::CommandProcessor;
        use crate::storage::{memory::MemoryStorage, Page, Storage};

        let tg = Arc::new(FakeTelegram::default());
        let storage = Arc::new(MemoryStorage::new());
        tg.push_batch(vec![
            Update::message(1, 9, "Alice", "https://example.com/a"),
            Update::empty(2),
            Update::message(3, 9, "Alice", "/rnd"),
        ]);

        let mut consumer = Consumer::new(
            UpdateTranslator::new(tg.clone()),
            CommandProcessor::new(tg.clone(), storage.clone()),
            100,
        )
        .with_idle_sleep(Duration::from_millis(5));

        let cancel = CancellationToken::new();
        let stopper = cancel.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(50)).await;
            stopper.cancel();
        });
        consumer.run(cancel).await;

        assert_eq!(
            tg.sent(),
            vec![
                (ChatId(9), Reply::Saved.text().to_string()),
                (ChatId(9), "https://example.com/a".to_string()),
            ]
        );
        assert!(!storage
            .is_exists(&Page::new("https://example.com/a", "Alice"))
            .await
            .unwrap());
        assert_eq!(consumer.fetcher().offset(), UpdateId(4));
    }
}
