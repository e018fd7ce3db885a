// HTTP response utilities for JSON with optional Brotli encoding
use async_compression::tokio::bufread::BrotliEncoder;
use axum::{
    body::Body,
    http::{HeaderMap, HeaderValue, Response, StatusCode, header},
};
use serde::Serialize;
use tokio::io::AsyncReadExt;

/// Check if client accepts Brotli compression
pub fn accepts_brotli(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.split(',').any(|enc| enc.trim().split(';').next() == Some("br")))
        .unwrap_or(false)
}

async fn brotli(bytes: Vec<u8>) -> std::io::Result<Vec<u8>> {
    let cursor = std::io::Cursor::new(bytes);
    let mut encoder = BrotliEncoder::new(cursor);
    let mut compressed = Vec::new();
    encoder.read_to_end(&mut compressed).await?;
    Ok(compressed)
}

/// Serialize `data` as JSON, Brotli-compressed when `compress` is set
pub async fn json_response<T: Serialize>(status: StatusCode, data: &T, compress: bool) -> Response<Body> {
    let json = match serde_json::to_vec(data) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!("JSON serialization error: {}", e);
            return plain_status(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let (body, content_encoding) = if compress {
        let original = json.len();
        match brotli(json).await {
            Ok(compressed) => {
                tracing::debug!("Compressed {} → {} bytes", original, compressed.len());
                (compressed, Some("br"))
            }
            Err(e) => {
                tracing::error!("Brotli compression error: {}", e);
                return plain_status(StatusCode::INTERNAL_SERVER_ERROR);
            }
        }
    } else {
        (json, None)
    };

    let mut builder = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, HeaderValue::from(body.len()))
        .header(header::VARY, "accept-encoding");
    if let Some(encoding) = content_encoding {
        builder = builder.header(header::CONTENT_ENCODING, encoding);
    }

    builder.body(Body::from(body)).unwrap_or_else(|e| {
        tracing::error!("Response build error: {}", e);
        plain_status(StatusCode::INTERNAL_SERVER_ERROR)
    })
}

fn plain_status(status: StatusCode) -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response
}
