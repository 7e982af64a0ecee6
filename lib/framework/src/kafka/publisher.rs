use std::future::Future;
use std::time::Instant;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use tracing::Span;
use tracing::error;
use tracing::info;
use tracing::info_span;
use tracing::trace;

use super::producer::KafkaProducer;
use super::producer::PublisherConfig;
use crate::exception::CoreRsResult;

/// The underlying connection a [`Publisher`] submits messages through.
pub trait MessageSender: Send + Sync {
    /// Resolves once the broker acknowledged the message, or failed to.
    fn send(&self, topic: &str, key: &str, payload: &str) -> impl Future<Output = CoreRsResult<()>> + Send;

    fn close(self)
    where
        Self: Sized;
}

struct Connection<S> {
    sender: S,
    stopwatch: Instant,
}

/// Publishes string messages through one exclusively owned connection.
///
/// Publishes are serialized, only one message is in flight at a time. The
/// cancellation signal is checked when connecting and before each publish,
/// a publish that already passed the check runs to completion.
pub struct Publisher<S = KafkaProducer> {
    signal: CancellationToken,
    client_id: String,
    connection: Mutex<Option<Connection<S>>>,
    span: Span,
}

impl Publisher<KafkaProducer> {
    pub fn new(signal: CancellationToken, bootstrap_servers: &str, client_id: &str) -> CoreRsResult<Self> {
        Self::with_config(signal, &PublisherConfig::new(bootstrap_servers, client_id))
    }

    pub fn with_config(signal: CancellationToken, config: &PublisherConfig) -> CoreRsResult<Self> {
        let client_id = client_id(&config.client_id, &host_name()?);
        Self::open(signal, client_id, |client_id| KafkaProducer::new(config, client_id))
    }
}

impl<S> Publisher<S>
where
    S: MessageSender,
{
    /// `connect` is not called if `signal` is already cancelled, the publisher
    /// then ignores every message.
    pub fn open<F>(signal: CancellationToken, client_id: String, connect: F) -> CoreRsResult<Self>
    where
        F: FnOnce(&str) -> CoreRsResult<S>,
    {
        let span = info_span!("publisher", client_id);
        let connection = {
            let _entered = span.enter();
            if signal.is_cancelled() {
                info!("cancellation requested, skipped producer initialization");
                None
            } else {
                let sender = connect(&client_id)?;
                Some(Connection {
                    sender,
                    stopwatch: Instant::now(),
                })
            }
        };

        Ok(Self {
            signal,
            client_id,
            connection: Mutex::new(connection),
            span,
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub async fn is_connected(&self) -> bool {
        self.connection.lock().await.is_some()
    }

    pub async fn publish(&self, message: &str, topic: &str) -> CoreRsResult<()> {
        async {
            let mut guard = self.connection.lock().await;

            if self.signal.is_cancelled() {
                info!(topic, "cancellation requested, ignored message");
                return Ok(());
            }
            let Some(connection) = guard.as_mut() else {
                info!(topic, "producer not initialized, ignored message");
                return Ok(());
            };

            connection.stopwatch = Instant::now();
            let result = connection.sender.send(topic, "", message).await;
            let elapsed = connection.stopwatch.elapsed();
            match result {
                Ok(()) => {
                    trace!(message, topic, elapsed_ms = elapsed.as_millis(), "published message");
                    Ok(())
                }
                Err(e) => {
                    error!(message, topic, elapsed_ms = elapsed.as_millis(), "failed to publish message");
                    Err(e)
                }
            }
        }
        .instrument(self.span.clone())
        .await
    }

    /// Flushes and releases the connection, must be called before process exit.
    pub fn close(self) {
        let _entered = self.span.enter();
        if let Some(connection) = self.connection.into_inner() {
            connection.sender.close();
            info!("producer closed");
        } else {
            info!("producer was not initialized, nothing to close");
        }
    }
}

pub fn client_id(base: &str, host: &str) -> String {
    format!("{base}.{host}")
}

fn host_name() -> CoreRsResult<String> {
    let host = hostname::get().map_err(|err| exception!(message = "failed to get host name", source = err))?;
    Ok(host.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicBool;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use tokio_util::sync::CancellationToken;

    use super::MessageSender;
    use super::Publisher;
    use crate::exception::CoreRsResult;

    #[derive(Default)]
    struct Record {
        sends: Mutex<Vec<(String, String, String)>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        closed: AtomicBool,
    }

    impl Record {
        fn sends(&self) -> Vec<(String, String, String)> {
            self.sends.lock().unwrap().clone()
        }
    }

    struct FakeSender {
        record: Arc<Record>,
        delay: Duration,
        fail_on: Option<&'static str>,
    }

    impl FakeSender {
        fn new(record: &Arc<Record>) -> Self {
            Self {
                record: Arc::clone(record),
                delay: Duration::ZERO,
                fail_on: None,
            }
        }
    }

    impl MessageSender for FakeSender {
        async fn send(&self, topic: &str, key: &str, payload: &str) -> CoreRsResult<()> {
            let in_flight = self.record.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.record.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);
            self.record
                .sends
                .lock()
                .unwrap()
                .push((topic.to_owned(), key.to_owned(), payload.to_owned()));
            tokio::time::sleep(self.delay).await;
            self.record.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.fail_on == Some(payload) {
                return Err(exception!(message = format!("delivery failed, payload={payload}")));
            }
            Ok(())
        }

        fn close(self) {
            self.record.closed.store(true, Ordering::SeqCst);
        }
    }

    fn open(signal: CancellationToken, sender: FakeSender) -> Publisher<FakeSender> {
        Publisher::open(signal, "test.host".to_owned(), |_| Ok(sender)).unwrap()
    }

    #[test]
    fn client_id() {
        assert_eq!(super::client_id("publisher", "host1"), "publisher.host1");
        assert_eq!(
            super::client_id("publisher", "host1"),
            super::client_id("publisher", "host1")
        );
    }

    #[tokio::test]
    async fn publish() {
        let record = Arc::new(Record::default());
        let publisher = open(CancellationToken::new(), FakeSender::new(&record));

        publisher.publish("Say Hello 1", "T").await.unwrap();

        assert_eq!(
            record.sends(),
            vec![("T".to_owned(), String::new(), "Say Hello 1".to_owned())]
        );
    }

    #[tokio::test]
    async fn cancelled_before_open() {
        let signal = CancellationToken::new();
        signal.cancel();
        let connected = AtomicBool::new(false);

        let publisher: Publisher<FakeSender> = Publisher::open(signal, "test.host".to_owned(), |_| {
            connected.store(true, Ordering::SeqCst);
            Ok(FakeSender::new(&Arc::new(Record::default())))
        })
        .unwrap();

        assert!(!connected.load(Ordering::SeqCst));
        assert!(!publisher.is_connected().await);
        publisher.publish("x", "T").await.unwrap();
        publisher.close();
    }

    #[tokio::test]
    async fn cancelled_after_open() {
        let record = Arc::new(Record::default());
        let signal = CancellationToken::new();
        let publisher = open(signal.clone(), FakeSender::new(&record));

        publisher.publish("first", "T").await.unwrap();
        signal.cancel();
        publisher.publish("second", "T").await.unwrap();

        assert_eq!(record.sends().len(), 1);
    }

    #[tokio::test]
    async fn cancel_does_not_interrupt_in_flight_publish() {
        let record = Arc::new(Record::default());
        let signal = CancellationToken::new();
        let mut sender = FakeSender::new(&record);
        sender.delay = Duration::from_millis(50);
        let publisher = Arc::new(open(signal.clone(), sender));

        let handle = tokio::spawn({
            let publisher = Arc::clone(&publisher);
            async move { publisher.publish("in flight", "T").await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        signal.cancel();

        handle.await.unwrap().unwrap();
        assert_eq!(record.sends().len(), 1);
        assert_eq!(record.in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_publishes_are_serialized() {
        let record = Arc::new(Record::default());
        let mut sender = FakeSender::new(&record);
        sender.delay = Duration::from_millis(5);
        let publisher = Arc::new(open(CancellationToken::new(), sender));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let publisher = Arc::clone(&publisher);
                tokio::spawn(async move { publisher.publish(&format!("message {i}"), "T").await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(record.sends().len(), 8);
        assert_eq!(record.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn publish_failure_propagates() {
        let record = Arc::new(Record::default());
        let mut sender = FakeSender::new(&record);
        sender.fail_on = Some("bad");
        let publisher = open(CancellationToken::new(), sender);

        let exception = publisher.publish("bad", "T").await.unwrap_err();
        assert_eq!(exception.message, "delivery failed, payload=bad");

        publisher.publish("good", "T").await.unwrap();
        assert_eq!(record.sends().len(), 2);
    }

    #[tokio::test]
    async fn close() {
        let record = Arc::new(Record::default());
        let publisher = open(CancellationToken::new(), FakeSender::new(&record));
        assert!(publisher.is_connected().await);
        assert_eq!(publisher.client_id(), "test.host");

        publisher.close();
        assert!(record.closed.load(Ordering::SeqCst));
    }
}
