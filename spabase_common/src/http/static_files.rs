use std::{path::Path, sync::Arc};

use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use hyper::{
    header::{
        CONTENT_LENGTH, CONTENT_TYPE, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED,
    },
    HeaderMap,
};
use percent_encoding::percent_decode_str;
use scorched::{logf, LogData, LogImportance};
use tower_http::services::ServeFile;

use crate::{
    error::Result,
    files::{FileBody, FileRecord, FileSource},
    request::{RequestContext, REQUEST_CONTEXT},
    spa_static_files::SpaFileSource,
    state::AppState,
};

const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Serves the built application, falling back to the default page for unknown paths.
///
/// Files served verbatim are streamed from disk with range support. Rewritten files are
/// answered from memory.
pub async fn static_file(State(state): State<Arc<AppState>>, request: Request) -> Result<Response> {
    let method = request.method().clone();
    if method != Method::GET && method != Method::HEAD {
        return Ok(StatusCode::METHOD_NOT_ALLOWED.into_response());
    }

    if state.files.file_source().is_none() {
        return Ok(StatusCode::NOT_FOUND.into_response());
    }

    let Some(path) = decode_path(request.uri().path()) else {
        return Ok(StatusCode::BAD_REQUEST.into_response());
    };

    let context = REQUEST_CONTEXT.try_with(RequestContext::clone).ok();
    let files = state.files.clone();
    let default_page = state.config.default_page.clone();

    // File reads and rewriting are blocking, and the task-local does not follow us onto the
    // blocking pool, so it is scoped again there.
    let lookup = tokio::task::spawn_blocking(move || {
        let Some(source) = files.file_source() else {
            return Ok(None);
        };
        let find = || find_file(source, &path, &default_page);
        match context {
            Some(context) => REQUEST_CONTEXT.sync_scope(context, find),
            None => find(),
        }
    })
    .await?;

    let found = match lookup {
        Ok(found) => found,
        Err(e) => {
            logf!(Error, "Error serving {}: {}", request.uri().path(), e);
            return Err(e);
        }
    };

    let Some(record) = found else {
        return Ok(StatusCode::NOT_FOUND.into_response());
    };

    if let FileBody::Disk { physical_path, .. } = record.body() {
        return disk_response(request, &record, physical_path).await;
    }

    let content = record.read_bytes()?;
    Ok(text_response(&method, request.headers(), &record, content))
}

/// Looks up `path`, or the default page when `path` is not a file.
fn find_file(source: &SpaFileSource, path: &str, default_page: &str) -> Result<Option<FileRecord>> {
    let record = source.lookup(path)?;
    if record.exists() && !record.is_directory() {
        return Ok(Some(record));
    }

    let record = source.lookup(default_page)?;
    if !record.exists() || record.is_directory() {
        return Ok(None);
    }

    Ok(Some(record))
}

/// Streams a file from disk. Ranges, `If-Modified-Since` and HEAD are handled by `ServeFile`.
async fn disk_response(
    request: Request,
    record: &FileRecord,
    physical_path: &Path,
) -> Result<Response> {
    let last_modified = record.last_modified().unwrap_or_else(Utc::now);
    let etag = entity_tag(record.length(), last_modified);

    if is_not_modified(request.headers(), &etag, last_modified) {
        return Ok(not_modified(&etag, last_modified));
    }

    let mut response = ServeFile::new(physical_path)
        .try_call(request)
        .await?
        .map(Body::new);

    if response.status().is_success() {
        let headers = response.headers_mut();
        headers.insert(ETAG, HeaderValue::from_str(&etag)?);
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static(content_type(record.name())),
        );
    }

    Ok(response)
}

fn text_response(
    method: &Method,
    headers: &HeaderMap,
    record: &FileRecord,
    content: Vec<u8>,
) -> Response {
    let last_modified = record.last_modified().unwrap_or_else(Utc::now);
    let etag = entity_tag(record.length(), last_modified);

    if is_not_modified(headers, &etag, last_modified) {
        return not_modified(&etag, last_modified);
    }

    let builder = validators(Response::builder(), &etag, last_modified)
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, content_type(record.name()))
        .header(CONTENT_LENGTH, content.len());

    if *method == Method::HEAD {
        return finish(builder, Body::empty());
    }

    finish(builder, Body::from(content))
}

fn not_modified(etag: &str, last_modified: DateTime<Utc>) -> Response {
    let builder = validators(Response::builder(), etag, last_modified);
    finish(builder.status(StatusCode::NOT_MODIFIED), Body::empty())
}

fn validators(
    builder: axum::http::response::Builder,
    etag: &str,
    last_modified: DateTime<Utc>,
) -> axum::http::response::Builder {
    builder.header(ETAG, etag).header(
        LAST_MODIFIED,
        last_modified.format(HTTP_DATE_FORMAT).to_string(),
    )
}

fn finish(builder: axum::http::response::Builder, body: Body) -> Response {
    match builder.body(body) {
        Ok(response) => response.into_response(),
        Err(e) => {
            logf!(Error, "Error building response: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error building response").into_response()
        }
    }
}

/// Percent-decodes the request path and strips its leading slashes.
fn decode_path(path: &str) -> Option<String> {
    let decoded = percent_decode_str(path).decode_utf8().ok()?;
    Some(decoded.trim_start_matches('/').to_string())
}

/// Changes whenever the length or modification time of the served content changes.
pub fn entity_tag(length: u64, last_modified: DateTime<Utc>) -> String {
    format!("\"{:x}\"", (last_modified.timestamp_millis() as u64) ^ length)
}

fn is_not_modified(headers: &HeaderMap, etag: &str, last_modified: DateTime<Utc>) -> bool {
    if let Some(if_none_match) = headers.get(IF_NONE_MATCH) {
        return if_none_match.to_str().is_ok_and(|value| {
            value
                .split(',')
                .map(str::trim)
                .any(|candidate| candidate == "*" || candidate == etag)
        });
    }

    headers
        .get(IF_MODIFIED_SINCE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| DateTime::parse_from_rfc2822(value).ok())
        .is_some_and(|since| last_modified.timestamp() <= since.timestamp())
}

pub fn content_type(name: &str) -> &'static str {
    let extension = Path::new(name)
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "json" | "map" => "application/json",
        "webmanifest" => "application/manifest+json",
        "txt" => "text/plain; charset=utf-8",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "wasm" => "application/wasm",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        _ => "application/octet-stream",
    }
}
