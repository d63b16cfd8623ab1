//! Delta continuation token normalization.
//!
//! A persisted resumption token may be a full delta link URL, a bare
//! `?query` fragment, or just the token value. All three normalize to the
//! query parameters of the next pull request.

use tracing::warn;
use url::{form_urlencoded, Url};

use graphcal_domain::constants::{DELTA_TOKEN_PARAM, SKIP_TOKEN_PARAM};
use graphcal_domain::{GraphCalError, Result};

type QueryParam = (String, String);

/// Normalize a stored delta token into pull query parameters.
pub fn delta_query_params(token: &str) -> Result<Vec<QueryParam>> {
    if token.trim().is_empty() {
        return Err(GraphCalError::InvalidInput("empty delta token".into()));
    }

    if let Ok(url) = Url::parse(token) {
        return collect_query_pairs(url.query());
    }

    if let Some(idx) = token.find('?') {
        return collect_query_pairs(Some(&token[idx + 1..]));
    }

    // Treat as bare token value
    Ok(vec![(DELTA_TOKEN_PARAM.to_string(), token.to_string())])
}

fn collect_query_pairs(query: Option<&str>) -> Result<Vec<QueryParam>> {
    let Some(query) = query else {
        return Err(GraphCalError::InvalidInput(
            "delta token missing query parameters".into(),
        ));
    };

    let mut params = Vec::new();
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        let mapped_key = match key.as_ref() {
            DELTA_TOKEN_PARAM => Some(DELTA_TOKEN_PARAM),
            SKIP_TOKEN_PARAM => Some(SKIP_TOKEN_PARAM),
            "startDateTime" => Some("startDateTime"),
            "endDateTime" => Some("endDateTime"),
            "$top" => Some("$top"),
            "$select" => Some("$select"),
            other => {
                warn!(delta_param = other, "ignoring unsupported delta parameter");
                None
            }
        };

        if let Some(k) = mapped_key {
            params.push((k.to_string(), value.into_owned()));
        }
    }

    if params.is_empty() {
        return Err(GraphCalError::InvalidInput(
            "delta token contained no supported parameters".into(),
        ));
    }

    Ok(params)
}
