use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::Uri,
    middleware::Next,
    response::Response,
};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::{
    request::{RequestContext, REQUEST_CONTEXT},
    state::AppState,
};

pub const X_FORWARDED_PREFIX: &str = "x-forwarded-prefix";

/// Everything but the unreserved characters of RFC 3986 is encoded in a forwarded segment.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Works out the path base of the request and makes it available to the file layer for the
/// rest of the request.
///
/// A configured mount prefix is stripped from the request path, so `/app/index.html` with a
/// `path_base` of `/app` is looked up as `/index.html`.
pub async fn path_base(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let mut path_base = String::new();

    if state.config.trust_forwarded_prefix {
        if let Some(prefix) = req
            .headers()
            .get(X_FORWARDED_PREFIX)
            .and_then(|value| value.to_str().ok())
            .and_then(forwarded_prefix)
        {
            path_base.push_str(&prefix);
        }
    }

    let mut path = req.uri().path().to_string();

    if let Some(mount) = state.config.path_base.as_deref() {
        if let Some((matched, rest)) = strip_mount(&path, mount) {
            path_base.push_str(matched);
            let rest = rest.to_string();

            let path_and_query = match req.uri().query() {
                Some(query) => format!("{rest}?{query}"),
                None => rest.clone(),
            };
            if let Ok(uri) = path_and_query.parse::<Uri>() {
                *req.uri_mut() = uri;
            }

            path = rest;
        }
    }

    REQUEST_CONTEXT
        .scope(RequestContext::new(path_base, path), next.run(req))
        .await
}

/// Turns an `X-Forwarded-Prefix` value into a path base that is safe to put into rewritten
/// content. Each segment is decoded and encoded again, so quotes, angle brackets and whitespace
/// can never reach an attribute value. Values that are not absolute paths are ignored.
pub fn forwarded_prefix(value: &str) -> Option<String> {
    let value = value.trim().trim_end_matches('/');
    if !value.starts_with('/') {
        return None;
    }

    let encoded = value
        .split('/')
        .map(|segment| {
            let decoded = percent_decode_str(segment).decode_utf8_lossy();
            utf8_percent_encode(&decoded, SEGMENT).to_string()
        })
        .collect::<Vec<_>>()
        .join("/");

    Some(encoded)
}

/// Splits `path` into the segments matching `mount` (ASCII case-insensitive) and the
/// remaining path, which always starts with `/`.
pub fn strip_mount<'a>(path: &'a str, mount: &str) -> Option<(&'a str, &'a str)> {
    let mount = mount.trim_end_matches('/');
    if mount.is_empty() {
        return None;
    }
    let mount_len = if mount.starts_with('/') {
        mount.len()
    } else {
        mount.len() + 1
    };

    let matched = path.get(..mount_len)?;
    if !matched.trim_start_matches('/').eq_ignore_ascii_case(mount.trim_start_matches('/'))
        || !matched.starts_with('/')
    {
        return None;
    }

    match &path[mount_len..] {
        "" => Some((matched, "/")),
        rest if rest.starts_with('/') => Some((matched, rest)),
        _ => None,
    }
}
