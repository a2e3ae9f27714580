//! # Request Parser
//!
//! Extracts query parameters, headers, cookies, and a typed body from a
//! [`Request`]. The only defensive rule baked into the contract:
//! `GET` and `HEAD` never have their body parsed, regardless of the
//! `Content-Type` header present on the wire.

use crate::error::HttpError;
use crate::request::Request;
use serde_json::{Map, Value};
use std::collections::HashMap;
use url::form_urlencoded;

/// Body size ceiling and any other parsing knobs.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    pub max_body_bytes: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Parse a raw query string into a JSON object, expanding `a[b]=c`-style
/// bracket-nested keys and collecting repeated flat keys into arrays.
pub fn parse_query(query_string: &str) -> Value {
    let mut root = Map::new();

    for (key, value) in form_urlencoded::parse(query_string.trim_start_matches('?').as_bytes()) {
        insert_nested(&mut root, &key, value.into_owned());
    }

    Value::Object(root)
}

fn insert_nested(root: &mut Map<String, Value>, key: &str, value: String) {
    if let Some(open) = key.find('[') {
        if let Some(close) = key[open..].find(']') {
            let head = &key[..open];
            let inner_key = &key[open + 1..open + close];
            let rest = &key[open + close + 1..];

            let entry = root
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(nested) = entry {
                if rest.is_empty() {
                    insert_nested(nested, inner_key, value);
                } else {
                    // a[b][c]=d — keep descending into nested objects.
                    insert_nested(nested, &format!("{inner_key}{rest}"), value);
                }
            }
            return;
        }
    }

    match root.get_mut(key) {
        Some(Value::Array(arr)) => arr.push(Value::String(value)),
        Some(existing) => {
            let prior = existing.clone();
            *existing = Value::Array(vec![prior, Value::String(value)]);
        }
        None => {
            root.insert(key.to_string(), Value::String(value));
        }
    }
}

/// Lower-case, last-value-wins header map from raw `(name, value)` pairs.
pub fn parse_headers<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> HashMap<String, String> {
    let mut headers = HashMap::new();
    for (name, value) in pairs {
        headers.insert(name.to_lowercase(), value.to_string());
    }
    headers
}

/// Parse the `Cookie` header into a map, skipping malformed pairs and
/// percent-decoding values.
pub fn parse_cookies(header: Option<&str>) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    let Some(header) = header else {
        return cookies;
    };

    for part in header.split(';') {
        let part = part.trim();
        let Some((name, value)) = part.split_once('=') else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        let decoded = form_urlencoded::parse(value.trim().as_bytes())
            .map(|(k, _)| k.into_owned())
            .next()
            .unwrap_or_else(|| value.trim().to_string());
        cookies.insert(name.to_string(), decoded);
    }

    cookies
}

/// Parse `req`'s body according to its `Content-Type`, honoring the
/// GET/HEAD defensive rule and the configured size ceiling.
pub fn parse_body(req: &Request, config: &ParserConfig) -> Result<Value, HttpError> {
    if req.forbids_body() {
        return Ok(Value::Null);
    }

    let Some(raw) = &req.raw_body else {
        return Ok(Value::Null);
    };

    if raw.len() > config.max_body_bytes {
        return Err(HttpError::body_parse(format!(
            "request body of {} bytes exceeds the {} byte limit",
            raw.len(),
            config.max_body_bytes
        )));
    }

    let content_type = req.content_type().unwrap_or("").split(';').next().unwrap_or("").trim();

    match content_type {
        "application/json" => serde_json::from_slice(raw)
            .map_err(|e| HttpError::body_parse(format!("invalid JSON body: {e}"))),
        "application/x-www-form-urlencoded" => {
            let mut map = Map::new();
            for (k, v) in form_urlencoded::parse(raw) {
                map.insert(k.into_owned(), Value::String(v.into_owned()));
            }
            Ok(Value::Object(map))
        }
        "text/plain" => Ok(Value::String(
            String::from_utf8(raw.clone()).map_err(|e| HttpError::body_parse(e.to_string()))?,
        )),
        "" | "application/octet-stream" => Ok(Value::String(hex_lossy(raw))),
        ct if ct.starts_with("multipart/form-data") => parse_multipart(req.content_type().unwrap_or(""), raw),
        _ => String::from_utf8(raw.clone())
            .map(Value::String)
            .or_else(|_| Ok(Value::String(hex_lossy(raw)))),
    }
}

/// Split a `multipart/form-data` body on its boundary, producing
/// `{fields: map, files: map<name, {filename, content-type, size, bytes}>}`.
fn parse_multipart(content_type: &str, raw: &[u8]) -> Result<Value, HttpError> {
    let boundary = content_type
        .split(';')
        .find_map(|part| part.trim().strip_prefix("boundary="))
        .ok_or_else(|| HttpError::body_parse("multipart body missing a boundary"))?
        .trim_matches('"');
    let delimiter = format!("--{boundary}");

    let mut fields = Map::new();
    let mut files = Map::new();

    for part in raw.split_str(delimiter.as_bytes()) {
        let part = trim_crlf(part);
        if part.is_empty() || part == b"--" {
            continue;
        }
        let Some(header_end) = find_subslice(part, b"\r\n\r\n") else {
            continue;
        };
        let headers = String::from_utf8_lossy(&part[..header_end]);
        let body = trim_crlf(&part[header_end + 4..]);

        let Some(disposition) = headers.lines().find(|l| l.to_lowercase().starts_with("content-disposition")) else {
            continue;
        };
        let Some(name) = header_param(disposition, "name") else {
            continue;
        };

        if let Some(filename) = header_param(disposition, "filename") {
            let part_content_type = headers
                .lines()
                .find(|l| l.to_lowercase().starts_with("content-type"))
                .and_then(|l| l.split_once(':'))
                .map(|(_, v)| v.trim().to_string())
                .unwrap_or_else(|| "application/octet-stream".to_string());
            files.insert(
                name,
                serde_json::json!({
                    "filename": filename,
                    "contentType": part_content_type,
                    "size": body.len(),
                    "bytes": hex_lossy(body),
                }),
            );
        } else {
            fields.insert(name, Value::String(String::from_utf8_lossy(body).into_owned()));
        }
    }

    Ok(serde_json::json!({"fields": Value::Object(fields), "files": Value::Object(files)}))
}

fn header_param(header: &str, key: &str) -> Option<String> {
    header.split(';').find_map(|part| {
        let part = part.trim();
        part.strip_prefix(&format!("{key}="))
            .map(|v| v.trim_matches('"').to_string())
    })
}

fn trim_crlf(bytes: &[u8]) -> &[u8] {
    let mut bytes = bytes;
    while bytes.first() == Some(&b'\r') || bytes.first() == Some(&b'\n') {
        bytes = &bytes[1..];
    }
    while bytes.last() == Some(&b'\r') || bytes.last() == Some(&b'\n') {
        bytes = &bytes[..bytes.len() - 1];
    }
    bytes
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Minimal byte-slice splitter, since the standard library has no
/// `slice::split` on an arbitrary multi-byte delimiter.
trait SplitStr {
    fn split_str<'a>(&'a self, delim: &'a [u8]) -> Vec<&'a [u8]>;
}

impl SplitStr for [u8] {
    fn split_str<'a>(&'a self, delim: &'a [u8]) -> Vec<&'a [u8]> {
        let mut parts = Vec::new();
        let mut rest = self;
        while let Some(pos) = find_subslice(rest, delim) {
            parts.push(&rest[..pos]);
            rest = &rest[pos + delim.len()..];
        }
        parts.push(rest);
        parts
    }
}

fn hex_lossy(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}
