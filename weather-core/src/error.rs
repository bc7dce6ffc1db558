/// Failure of a single forecast fetch.
///
/// The HTTP status is not part of this taxonomy: a non-success status whose
/// body still decodes is a successful fetch.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("forecast request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to decode forecast response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("failed to connect to MQTT broker: {0}")]
    Connect(String),

    #[error("failed to subscribe to topic: {0}")]
    Subscribe(String),

    #[error("failed to publish to topic: {0}")]
    Publish(String),
}
