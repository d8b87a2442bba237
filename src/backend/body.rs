use futures::StreamExt;
use reqwest::StatusCode;

/// Cap on error bodies captured from collaborators (1 MB).
pub(crate) const MAX_ERROR_BODY_SIZE: usize = 1024 * 1024;

/// Result of reading a response body with size limit
pub(crate) enum ReadBodyResult {
    /// Successfully read the full body
    Ok(String),
    /// Body exceeded max size
    TooLarge,
    /// Error reading body
    Error(String),
}

/// Read a response body incrementally with a size limit.
///
/// Bodies with unknown content-length (chunked transfer encoding) are never
/// buffered past `max_size`.
pub(crate) async fn read_response_body_limited(
    response: reqwest::Response,
    max_size: usize,
) -> ReadBodyResult {
    let mut stream = response.bytes_stream();
    let mut buf: Vec<u8> = Vec::new();

    while let Some(chunk_result) = stream.next().await {
        match chunk_result {
            Ok(chunk) => {
                if buf.len() + chunk.len() > max_size {
                    return ReadBodyResult::TooLarge;
                }
                buf.extend_from_slice(&chunk);
            }
            Err(e) => {
                return ReadBodyResult::Error(e.to_string());
            }
        }
    }

    // Decode the entire buffer at once to avoid corrupting multibyte UTF-8
    // sequences that may be split across chunk boundaries.
    match String::from_utf8(buf) {
        Ok(body) => ReadBodyResult::Ok(body),
        Err(e) => ReadBodyResult::Error(format!("invalid UTF-8 in response body: {}", e)),
    }
}

/// The body of an error response, or a note explaining why it is missing.
pub(crate) async fn error_body(response: reqwest::Response) -> String {
    match read_response_body_limited(response, MAX_ERROR_BODY_SIZE).await {
        ReadBodyResult::Ok(body) => body,
        ReadBodyResult::TooLarge => format!("<error body exceeds {MAX_ERROR_BODY_SIZE} bytes>"),
        ReadBodyResult::Error(e) => format!("<failed to read error body: {e}>"),
    }
}

/// Health probe verdict: anything below 500 counts as reachable.
pub(crate) fn probe_status(status: StatusCode) -> String {
    if status.as_u16() < 500 {
        "ok".to_string()
    } else {
        format!("bad:{}", status.as_u16())
    }
}
