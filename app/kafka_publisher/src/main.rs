use framework::asset::asset_path;
use framework::exception::CoreRsResult;
use framework::json;
use framework::kafka::publisher::MessageSender;
use framework::kafka::publisher::Publisher;
use framework::log;
use framework::shutdown::Shutdown;
use serde::Deserialize;
use tracing::info;

const MESSAGE_COUNT: usize = 10;

#[derive(Debug, Deserialize, Clone)]
struct AppConfig {
    kafka_uri: String,
    client_id: String,
    topic: String,
    #[serde(default = "default_log_level")]
    log_level: String,
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[tokio::main]
async fn main() -> CoreRsResult<()> {
    let config: AppConfig = json::load_file(&asset_path("assets/conf.json")?)?;
    log::init(log::level(&config.log_level)?);

    let shutdown = Shutdown::new();
    let signal = shutdown.subscribe();
    shutdown.listen();

    let publisher = Publisher::new(signal, &config.kafka_uri, &config.client_id)?;
    info!(client_id = publisher.client_id(), topic = config.topic, "start publishing");

    publish_messages(&publisher, &config.topic).await?;

    publisher.close();
    Ok(())
}

// stops at the first failed message, the rest are never submitted
async fn publish_messages<S>(publisher: &Publisher<S>, topic: &str) -> CoreRsResult<()>
where
    S: MessageSender,
{
    for i in 1..=MESSAGE_COUNT {
        publisher.publish(&format!("Say Hello {i}"), topic).await?;
    }
    Ok(())
}
