use bytes::Bytes;

use crate::LatestValueCache;

/// Returned by [`latest`] until the first message has been observed.
pub const NO_DATA_PLACEHOLDER: &str = r#"{"message":"No data received yet"}"#;

/// Current cached payload, or the placeholder when nothing has arrived yet.
pub fn latest(cache: &LatestValueCache) -> Bytes {
    cache
        .get()
        .unwrap_or_else(|| Bytes::from_static(NO_DATA_PLACEHOLDER.as_bytes()))
}
