//! Buffered HTTP message views.
//!
//! The analyzer never touches live streams. Both sides of an exchange are
//! captured as [`Request`] and [`Response`] values whose bodies are plain
//! [`Bytes`]: read once at the boundary, replayable forever after, safe to
//! hand to the validator and the original caller alike.
//!
//! Values convert from `http::Request<Bytes>` / `http::Response<Bytes>`,
//! so callers build them with the standard `http` builders.

use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode, Uri};

/// A buffered outgoing request.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
}

impl From<http::Request<Bytes>> for Request {
    fn from(req: http::Request<Bytes>) -> Self {
        let (parts, body) = req.into_parts();
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
        }
    }
}

impl Request {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// The request path, without the query string.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// All decoded values for a query parameter, in order of appearance.
    /// An absent key yields an empty sequence.
    pub fn query_values(&self, name: &str) -> Vec<String> {
        let Some(query) = self.uri.query() else {
            return Vec::new();
        };

        url::form_urlencoded::parse(query.as_bytes())
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
            .collect()
    }

    /// A header value by case-insensitive name. Absent headers read as the
    /// empty string, which is what gets checked against `required`.
    pub fn header(&self, name: &str) -> &str {
        self.headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("")
    }

    /// A non-file form field by name, from an urlencoded or multipart body.
    pub fn form_field(&self, name: &str) -> Option<String> {
        let content_type = self.header(http::header::CONTENT_TYPE.as_str());

        if content_type.starts_with("application/x-www-form-urlencoded") {
            return url::form_urlencoded::parse(&self.body)
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.into_owned());
        }

        self.form_parts()
            .into_iter()
            .find(|part| part.name == name && !part.is_file())
            .and_then(|part| String::from_utf8(part.data.to_vec()).ok())
    }

    /// A file part by field name, from a multipart body.
    pub fn form_file(&self, name: &str) -> Option<FormPart> {
        self.form_parts()
            .into_iter()
            .find(|part| part.name == name && part.is_file())
    }

    fn form_parts(&self) -> Vec<FormPart> {
        let content_type = self.header(http::header::CONTENT_TYPE.as_str());
        if !content_type.starts_with("multipart/form-data") {
            return Vec::new();
        }
        match boundary(content_type) {
            Some(boundary) => parse_multipart(&self.body, boundary),
            None => Vec::new(),
        }
    }
}

/// A buffered incoming response.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl From<http::Response<Bytes>> for Response {
    fn from(res: http::Response<Bytes>) -> Self {
        let (parts, body) = res.into_parts();
        Self {
            status: parts.status,
            headers: parts.headers,
            body,
        }
    }
}

impl Response {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

/// One decoded part of a `multipart/form-data` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPart {
    pub name: String,
    pub filename: Option<String>,
    pub data: Bytes,
}

impl FormPart {
    /// File parts carry a filename in their disposition; plain fields
    /// don't.
    pub fn is_file(&self) -> bool {
        self.filename.is_some()
    }
}

/// Extract the boundary token from a multipart content type.
fn boundary(content_type: &str) -> Option<&str> {
    content_type
        .split(';')
        .map(str::trim)
        .find_map(|param| param.strip_prefix("boundary="))
        .map(|token| token.trim_matches('"'))
}

/// Minimal scan of a buffered multipart body.
///
/// Splits on the boundary delimiter, reads each part's
/// `Content-Disposition` for the field name and optional filename, and
/// keeps the payload as bytes. Malformed parts are skipped rather than
/// failing the whole body.
fn parse_multipart(body: &Bytes, boundary: &str) -> Vec<FormPart> {
    let delimiter = format!("--{}", boundary);
    let mut parts = Vec::new();

    for section in split_on(body, delimiter.as_bytes()).into_iter().skip(1) {
        // The terminal delimiter is "--boundary--".
        if section.starts_with(b"--") {
            break;
        }

        let section = section.strip_prefix(b"\r\n" as &[u8]).unwrap_or(section);
        let Some(split) = find(section, b"\r\n\r\n") else {
            continue;
        };
        let (header_block, payload) = (&section[..split], &section[split + 4..]);
        let payload = payload.strip_suffix(b"\r\n" as &[u8]).unwrap_or(payload);

        let Some(disposition) = std::str::from_utf8(header_block).ok().and_then(|headers| {
            headers
                .split("\r\n")
                .find(|line| line.to_ascii_lowercase().starts_with("content-disposition:"))
        }) else {
            continue;
        };

        let Some(name) = disposition_param(disposition, "name") else {
            continue;
        };

        parts.push(FormPart {
            name: name.to_string(),
            filename: disposition_param(disposition, "filename").map(String::from),
            data: Bytes::copy_from_slice(payload),
        });
    }

    parts
}

fn disposition_param<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    line.split(';')
        .map(str::trim)
        .find_map(|param| {
            let value = param.strip_prefix(key)?.strip_prefix('=')?;
            Some(value.trim_matches('"'))
        })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn split_on<'a>(data: &'a [u8], delimiter: &[u8]) -> Vec<&'a [u8]> {
    let mut sections = Vec::new();
    let mut rest = data;
    while let Some(at) = find(rest, delimiter) {
        sections.push(&rest[..at]);
        rest = &rest[at + delimiter.len()..];
    }
    sections.push(rest);
    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(req: http::Request<Bytes>) -> Request {
        Request::from(req)
    }

    #[test]
    fn query_values_in_order() {
        let req = request(
            http::Request::builder()
                .uri("/pet/findByStatus?status=available&status=pending&limit=10")
                .body(Bytes::new())
                .unwrap(),
        );

        assert_eq!(req.query_values("status"), ["available", "pending"]);
        assert_eq!(req.query_values("limit"), ["10"]);
        assert!(req.query_values("missing").is_empty());
    }

    #[test]
    fn query_values_are_percent_decoded() {
        let req = request(
            http::Request::builder()
                .uri("/search?q=a%20b%26c")
                .body(Bytes::new())
                .unwrap(),
        );

        assert_eq!(req.query_values("q"), ["a b&c"]);
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let req = request(
            http::Request::builder()
                .uri("/pet/42")
                .header("userID", "some-id")
                .body(Bytes::new())
                .unwrap(),
        );

        assert_eq!(req.header("userid"), "some-id");
        assert_eq!(req.header("USERID"), "some-id");
        assert_eq!(req.header("absent"), "");
    }

    #[test]
    fn urlencoded_form_field() {
        let req = request(
            http::Request::builder()
                .uri("/pet/42")
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Bytes::from_static(b"name=doggie&status=sold"))
                .unwrap(),
        );

        assert_eq!(req.form_field("status").as_deref(), Some("sold"));
        assert_eq!(req.form_field("missing"), None);
    }

    fn multipart_body() -> (String, Bytes) {
        let boundary = "X-BOUNDARY";
        let body = format!(
            "--{b}\r\n\
             Content-Disposition: form-data; name=\"additionalMetadata\"\r\n\
             \r\n\
             foobar\r\n\
             --{b}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"pet.png\"\r\n\
             Content-Type: application/octet-stream\r\n\
             \r\n\
             some-data\r\n\
             --{b}--\r\n",
            b = boundary
        );
        (
            format!("multipart/form-data; boundary={}", boundary),
            Bytes::from(body),
        )
    }

    #[test]
    fn multipart_field_and_file() {
        let (content_type, body) = multipart_body();
        let req = request(
            http::Request::builder()
                .uri("/pet/32/uploadImage")
                .header("content-type", content_type)
                .body(body)
                .unwrap(),
        );

        assert_eq!(
            req.form_field("additionalMetadata").as_deref(),
            Some("foobar")
        );

        let file = req.form_file("file").unwrap();
        assert_eq!(file.filename.as_deref(), Some("pet.png"));
        assert_eq!(&file.data[..], b"some-data");

        // A field is not a file and vice versa.
        assert!(req.form_file("additionalMetadata").is_none());
        assert_eq!(req.form_field("file"), None);
    }

    #[test]
    fn multipart_missing_part() {
        let (content_type, body) = multipart_body();
        let req = request(
            http::Request::builder()
                .uri("/pet/32/uploadImage")
                .header("content-type", content_type)
                .body(body)
                .unwrap(),
        );

        assert!(req.form_file("portrait").is_none());
    }

    #[test]
    fn non_multipart_body_has_no_parts() {
        let req = request(
            http::Request::builder()
                .uri("/pet")
                .header("content-type", "application/json")
                .body(Bytes::from_static(b"{}"))
                .unwrap(),
        );

        assert!(req.form_file("file").is_none());
        assert!(req.form_field("file").is_none());
    }

    #[test]
    fn response_keeps_buffered_body() {
        let res = Response::from(
            http::Response::builder()
                .status(StatusCode::CREATED)
                .body(Bytes::from_static(b"{\"id\":1}"))
                .unwrap(),
        );

        assert_eq!(res.status(), StatusCode::CREATED);
        assert_eq!(&res.body()[..], b"{\"id\":1}");
        // Reading twice sees the same bytes; nothing is consumed.
        assert_eq!(res.body(), res.body());
    }
}
