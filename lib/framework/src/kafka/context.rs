use std::fmt::Display;
use std::fmt::Formatter;

use rdkafka::ClientContext;
use rdkafka::config::RDKafkaLogLevel;
use rdkafka::error::KafkaError;
use rdkafka::error::RDKafkaErrorCode;
use tracing::debug;
use tracing::error;

/// Observers registered on the producer connection.
///
/// librdkafka invokes both callbacks from its own threads, so they only log.
pub struct PublisherContext {
    client_id: String,
}

impl PublisherContext {
    pub fn new(client_id: &str) -> Self {
        Self {
            client_id: client_id.to_owned(),
        }
    }
}

impl ClientContext for PublisherContext {
    fn log(&self, level: RDKafkaLogLevel, fac: &str, log_message: &str) {
        debug!(
            client_id = self.client_id,
            facility = fac,
            level = ?level,
            "rdkafka: {log_message}"
        );
    }

    fn error(&self, error: KafkaError, reason: &str) {
        let code = error.rdkafka_error_code();
        let origin = ErrorOrigin::of(code);
        error!(
            client_id = self.client_id,
            code = ?code,
            broker_error = origin == ErrorOrigin::Broker,
            local_error = origin == ErrorOrigin::Local,
            reason,
            "producer error occurred, error={error}"
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorOrigin {
    Broker,
    Local,
    Unknown,
}

impl ErrorOrigin {
    // librdkafka reports client side errors with negative codes, broker errors with positive ones
    pub fn of(code: Option<RDKafkaErrorCode>) -> Self {
        match code.map(|code| code as i32) {
            Some(value) if value < 0 => ErrorOrigin::Local,
            Some(value) if value > 0 => ErrorOrigin::Broker,
            _ => ErrorOrigin::Unknown,
        }
    }
}

impl Display for ErrorOrigin {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorOrigin::Broker => write!(f, "broker"),
            ErrorOrigin::Local => write!(f, "local"),
            ErrorOrigin::Unknown => write!(f, "unknown"),
        }
    }
}
