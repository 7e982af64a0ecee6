use std::time::Duration;

use rdkafka::ClientConfig;
use rdkafka::config::RDKafkaLogLevel;
use rdkafka::producer::FutureProducer;
use rdkafka::producer::FutureRecord;
use rdkafka::producer::Producer as _;
use rdkafka::util::Timeout;
use rdkafka::util::get_rdkafka_version;
use tracing::debug;
use tracing::error;
use tracing::info;

use super::context::PublisherContext;
use super::publisher::MessageSender;
use crate::exception::CoreRsResult;
use crate::exception::error_code::INVALID_CONFIG;
use crate::exception::error_code::KAFKA_PUBLISH_FAILED;

const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

pub struct PublisherConfig {
    pub bootstrap_servers: String,
    pub client_id: String,
    pub socket_blocking_max: Duration,
    pub queue_buffering_max: Duration,
}

impl PublisherConfig {
    pub fn new(bootstrap_servers: &str, client_id: &str) -> Self {
        Self {
            bootstrap_servers: bootstrap_servers.to_owned(),
            client_id: client_id.to_owned(),
            socket_blocking_max: Duration::from_millis(5),
            queue_buffering_max: Duration::from_millis(10),
        }
    }

    fn validate(&self) -> CoreRsResult<()> {
        if self.bootstrap_servers.trim().is_empty() {
            return Err(exception!(code = INVALID_CONFIG, message = "bootstrap servers must not be empty"));
        }
        if self.socket_blocking_max > self.queue_buffering_max {
            return Err(exception!(
                code = INVALID_CONFIG,
                message = format!(
                    "socket blocking max must not exceed queue buffering max, socket_blocking_max={:?}, queue_buffering_max={:?}",
                    self.socket_blocking_max, self.queue_buffering_max
                )
            ));
        }
        Ok(())
    }

    fn client_config(&self, client_id: &str) -> ClientConfig {
        let mut config = ClientConfig::new();
        config
            .set("bootstrap.servers", &self.bootstrap_servers)
            .set("client.id", client_id)
            .set("debug", "protocol")
            .set("socket.blocking.max.ms", self.socket_blocking_max.as_millis().to_string())
            .set("queue.buffering.max.ms", self.queue_buffering_max.as_millis().to_string())
            .set("acks", "-1") // ack only after the message is replicated to all in-sync replicas
            .set_log_level(RDKafkaLogLevel::Debug);
        config
    }
}

pub struct KafkaProducer {
    producer: FutureProducer<PublisherContext>,
}

impl KafkaProducer {
    pub fn new(config: &PublisherConfig, client_id: &str) -> CoreRsResult<Self> {
        config.validate()?;
        let producer: FutureProducer<PublisherContext> = config
            .client_config(client_id)
            .create_with_context(PublisherContext::new(client_id))?;

        let (_, version) = get_rdkafka_version();
        info!(
            client_id,
            bootstrap_servers = config.bootstrap_servers,
            librdkafka = version,
            "producer initialized"
        );
        Ok(Self { producer })
    }
}

impl MessageSender for KafkaProducer {
    async fn send(&self, topic: &str, key: &str, payload: &str) -> CoreRsResult<()> {
        let record = FutureRecord::<str, str>::to(topic).key(key).payload(payload);
        debug!(topic, key, payload, "send");
        if let Err((err, _)) = self.producer.send(record, Timeout::Never).await {
            return Err(exception!(
                code = KAFKA_PUBLISH_FAILED,
                message = format!("failed to publish message, topic={topic}"),
                source = err
            ));
        }
        Ok(())
    }

    fn close(self) {
        if let Err(e) = self.producer.flush(Timeout::After(CLOSE_TIMEOUT)) {
            error!(error = ?e, "failed to flush producer");
        }
    }
}
