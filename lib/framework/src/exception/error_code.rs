pub const INVALID_CONFIG: &str = "INVALID_CONFIG";
pub const KAFKA_PUBLISH_FAILED: &str = "KAFKA_PUBLISH_FAILED";
