use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::{ArcStr, channel::FetchOptions, net::TransportError};

/// Builds the URL of `endpoint` under `base`.
///
/// Absolute URLs are used verbatim. Otherwise `notifications`,
/// `/notifications` and `/api/notifications` all resolve to
/// `{base}/api/notifications`.
pub fn endpoint_url(base: &str, endpoint: &str) -> ArcStr {
    if endpoint.starts_with("http") {
        return ArcStr::from(endpoint);
    }
    let path = endpoint.trim_start_matches('/');
    let path = path.strip_prefix("api/").unwrap_or(path);
    ArcStr::from(format!("{}/api/{}", base.trim_end_matches('/'), path))
}

/// Headers sent with every backend request. Caller headers override the
/// defaults; the bearer token overrides everything.
pub fn request_headers(token: Option<&str>, options: &FetchOptions) -> BTreeMap<ArcStr, ArcStr> {
    let mut headers = BTreeMap::from([(
        ArcStr::from("Content-Type"),
        ArcStr::from("application/json"),
    )]);
    headers.extend(
        options
            .headers
            .iter()
            .map(|(key, value)| (key.clone(), value.clone())),
    );
    if let Some(token) = token.filter(|token| !token.is_empty()) {
        headers.insert(
            ArcStr::from("Authorization"),
            ArcStr::from(format!("Bearer {}", token)),
        );
    }
    headers
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
    Bare(Vec<Value>),
    Envelope {
        #[serde(default)]
        data: Option<Vec<Value>>,
    },
}

/// Unwraps the `{"data": [...]}` envelope of a successful response.
///
/// A missing or `null` `data` is an empty result; a bare array is accepted
/// as is.
pub fn decode_records(body: &str) -> Result<Vec<Value>, TransportError> {
    match serde_json::from_str::<Payload>(body) {
        Ok(Payload::Envelope { data }) => Ok(data.unwrap_or_default()),
        Ok(Payload::Bare(records)) => Ok(records),
        Err(e) => Err(TransportError::decode(format!(
            "Unexpected response body: {}",
            e
        ))),
    }
}
