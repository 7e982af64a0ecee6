use std::str::FromStr;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::exception::CoreRsResult;
use crate::exception::error_code::INVALID_CONFIG;

pub fn init(level: LevelFilter) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(false) // generally cloud log console doesn't support color
                .with_line_number(true)
                .with_thread_ids(true)
                .with_filter(level),
        )
        .init();
}

pub fn level(value: &str) -> CoreRsResult<LevelFilter> {
    LevelFilter::from_str(value).map_err(|err| {
        exception!(
            code = INVALID_CONFIG,
            message = format!("invalid log level, level={value}"),
            source = err
        )
    })
}
