//! Request normalization.
//!
//! Builds the single query object a handler receives, by layering request
//! inputs lowest to highest precedence: cookie header mapping, URL query
//! parameters, body fields, uploaded file fields.

use hyper::body::Bytes;
use hyper::header::CONTENT_TYPE;
use hyper::HeaderMap;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

use crate::cookies::parse_cookie_header;

/// A single value in the normalized query object
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    /// Plain text field (query string, urlencoded body, multipart text part)
    Text(String),
    /// Structured field from a JSON body
    Json(Value),
    /// Cookie sub-mapping (the literal `cookie` key)
    Map(HashMap<String, String>),
    /// Uploaded file field
    File(UploadedFile),
}

impl QueryValue {
    /// Text content of this value, if it is textual
    pub fn as_str(&self) -> Option<&str> {
        match self {
            QueryValue::Text(s) => Some(s),
            QueryValue::Json(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Cookie sub-mapping, if this value is one
    pub fn as_map(&self) -> Option<&HashMap<String, String>> {
        match self {
            QueryValue::Map(m) => Some(m),
            _ => None,
        }
    }
}

/// An uploaded file carried in a multipart body
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// The normalized query object handed to handlers
pub type QueryMap = HashMap<String, QueryValue>;

/// Build one query object from the request pieces.
///
/// The `cookie` key always holds the cookie mapping; a query parameter
/// literally named `cookie` is parsed from its raw string form and replaces
/// the header-derived mapping.
pub async fn normalize_request(
    query_string: Option<&str>,
    headers: &HeaderMap,
    body: Bytes,
    cookies: HashMap<String, String>,
) -> QueryMap {
    let mut query = QueryMap::new();
    query.insert("cookie".to_string(), QueryValue::Map(cookies));

    // URL query parameters
    if let Some(qs) = query_string {
        for (key, value) in url::form_urlencoded::parse(qs.as_bytes()) {
            if key == "cookie" {
                query.insert(
                    key.into_owned(),
                    QueryValue::Map(parse_cookie_header(&value)),
                );
            } else {
                query.insert(key.into_owned(), QueryValue::Text(value.into_owned()));
            }
        }
    }

    // Body fields
    if !body.is_empty() {
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if content_type.starts_with("application/json") {
            merge_json_body(&mut query, &body);
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            merge_urlencoded_body(&mut query, &body);
        } else if content_type.starts_with("multipart/form-data") {
            merge_multipart_body(&mut query, content_type, body).await;
        }
    }

    query
}

fn merge_json_body(query: &mut QueryMap, body: &Bytes) {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(fields)) => {
            for (key, value) in fields {
                match value {
                    Value::String(s) => {
                        query.insert(key, QueryValue::Text(s));
                    }
                    other => {
                        query.insert(key, QueryValue::Json(other));
                    }
                }
            }
        }
        Ok(_) => debug!("Ignoring non-object JSON body"),
        Err(e) => debug!("Ignoring malformed JSON body: {}", e),
    }
}

fn merge_urlencoded_body(query: &mut QueryMap, body: &Bytes) {
    for (key, value) in url::form_urlencoded::parse(body) {
        query.insert(key.into_owned(), QueryValue::Text(value.into_owned()));
    }
}

async fn merge_multipart_body(query: &mut QueryMap, content_type: &str, body: Bytes) {
    let boundary = match multer::parse_boundary(content_type) {
        Ok(boundary) => boundary,
        Err(e) => {
            debug!("Ignoring multipart body without boundary: {}", e);
            return;
        }
    };

    let stream = tokio_stream::once(Ok::<Bytes, std::convert::Infallible>(body));
    let mut multipart = multer::Multipart::new(stream, boundary);

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                debug!("Ignoring malformed multipart body: {}", e);
                break;
            }
        };

        let name = match field.name() {
            Some(name) => name.to_string(),
            None => continue,
        };
        let filename = field.file_name().map(|s| s.to_string());
        let content_type = field.content_type().map(|m| m.to_string());

        let data = match field.bytes().await {
            Ok(data) => data,
            Err(e) => {
                debug!("Ignoring unreadable multipart field '{}': {}", name, e);
                continue;
            }
        };

        if filename.is_some() {
            query.insert(
                name,
                QueryValue::File(UploadedFile {
                    filename,
                    content_type,
                    data,
                }),
            );
        } else {
            query.insert(
                name,
                QueryValue::Text(String::from_utf8_lossy(&data).into_owned()),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cookies_fixture() -> HashMap<String, String> {
        let mut cookies = HashMap::new();
        cookies.insert("MUSIC_U".to_string(), "token123".to_string());
        cookies
    }

    #[tokio::test]
    async fn test_cookie_mapping_under_cookie_key() {
        let query =
            normalize_request(None, &HeaderMap::new(), Bytes::new(), cookies_fixture()).await;

        let map = query.get("cookie").and_then(|v| v.as_map()).unwrap();
        assert_eq!(map.get("MUSIC_U"), Some(&"token123".to_string()));
    }

    #[tokio::test]
    async fn test_query_string_fields() {
        let query = normalize_request(
            Some("id=42&name=%E6%B5%8B%E8%AF%95"),
            &HeaderMap::new(),
            Bytes::new(),
            HashMap::new(),
        )
        .await;

        assert_eq!(query.get("id").unwrap().as_str(), Some("42"));
        assert_eq!(query.get("name").unwrap().as_str(), Some("测试"));
    }

    #[tokio::test]
    async fn test_string_cookie_param_replaces_header_mapping() {
        let query = normalize_request(
            Some("cookie=a%3D1%3B%20b%3D2"),
            &HeaderMap::new(),
            Bytes::new(),
            cookies_fixture(),
        )
        .await;

        let map = query.get("cookie").and_then(|v| v.as_map()).unwrap();
        assert_eq!(map.get("a"), Some(&"1".to_string()));
        assert_eq!(map.get("b"), Some(&"2".to_string()));
        assert!(!map.contains_key("MUSIC_U"));
    }

    #[tokio::test]
    async fn test_json_body_overrides_query_string() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, "application/json".parse().unwrap());
        let body = Bytes::from(r#"{"id": "99", "limit": 30}"#);

        let query = normalize_request(Some("id=42"), &headers, body, HashMap::new()).await;

        assert_eq!(query.get("id").unwrap().as_str(), Some("99"));
        assert_eq!(
            query.get("limit"),
            Some(&QueryValue::Json(Value::from(30)))
        );
    }

    #[tokio::test]
    async fn test_urlencoded_body_fields() {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            "application/x-www-form-urlencoded".parse().unwrap(),
        );
        let body = Bytes::from("keywords=hello+world&offset=0");

        let query = normalize_request(None, &headers, body, HashMap::new()).await;

        assert_eq!(query.get("keywords").unwrap().as_str(), Some("hello world"));
        assert_eq!(query.get("offset").unwrap().as_str(), Some("0"));
    }

    #[tokio::test]
    async fn test_malformed_json_body_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, "application/json".parse().unwrap());
        let body = Bytes::from("{not json");

        let query = normalize_request(Some("id=42"), &headers, body, HashMap::new()).await;

        assert_eq!(query.get("id").unwrap().as_str(), Some("42"));
        assert_eq!(query.len(), 2); // id + cookie
    }

    #[tokio::test]
    async fn test_multipart_file_field() {
        let boundary = "X-TUNEGATE-BOUNDARY";
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary)
                .parse()
                .unwrap(),
        );

        let body = format!(
            "--{b}\r\n\
             Content-Disposition: form-data; name=\"songFile\"; filename=\"a.mp3\"\r\n\
             Content-Type: audio/mpeg\r\n\r\n\
             MP3DATA\r\n\
             --{b}\r\n\
             Content-Disposition: form-data; name=\"title\"\r\n\r\n\
             my song\r\n\
             --{b}--\r\n",
            b = boundary
        );

        let query =
            normalize_request(None, &headers, Bytes::from(body), HashMap::new()).await;

        match query.get("songFile") {
            Some(QueryValue::File(file)) => {
                assert_eq!(file.filename.as_deref(), Some("a.mp3"));
                assert_eq!(file.content_type.as_deref(), Some("audio/mpeg"));
                assert_eq!(&file.data[..], b"MP3DATA");
            }
            other => panic!("expected file field, got {:?}", other),
        }
        assert_eq!(query.get("title").unwrap().as_str(), Some("my song"));
    }

    #[tokio::test]
    async fn test_file_field_overrides_body_field() {
        let boundary = "X-TUNEGATE-BOUNDARY";
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary)
                .parse()
                .unwrap(),
        );

        let body = format!(
            "--{b}\r\n\
             Content-Disposition: form-data; name=\"id\"; filename=\"id.bin\"\r\n\r\n\
             BYTES\r\n\
             --{b}--\r\n",
            b = boundary
        );

        let query = normalize_request(Some("id=42"), &headers, Bytes::from(body), HashMap::new())
            .await;

        assert!(matches!(query.get("id"), Some(QueryValue::File(_))));
    }
}
