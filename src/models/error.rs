use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("unable to connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: tokio_tungstenite::tungstenite::Error,
    },
    #[error("invalid value {value:?} for {key}")]
    Config { key: &'static str, value: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum SensorError {
    #[error("no position within {0} ms")]
    Timeout(u64),
    #[error("malformed position {line:?}: {source}")]
    Malformed {
        line: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
