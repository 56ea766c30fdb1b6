use serde::{Deserialize, Serialize};
use url::Url;

pub const OFFLINE_BODY: &str = "Offline - Content not available";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub method: String,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl FetchRequest {
    pub fn get(url: Url) -> Self {
        Self {
            method: "GET".to_string(),
            url,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }
}

/// How a response reached the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    /// Same origin, no redirect.
    Basic,
    /// Cross origin.
    Cors,
    /// Body and status hidden from the worker.
    Opaque,
    /// Final url differs from the requested one.
    Redirected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub kind: ResponseKind,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Only direct successful answers are stored at runtime.
    pub fn is_cacheable(&self) -> bool {
        self.status == 200 && self.kind == ResponseKind::Basic
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn offline_placeholder() -> Self {
        Self {
            status: 200,
            kind: ResponseKind::Basic,
            headers: vec![(
                "Content-Type".to_string(),
                "text/plain;charset=UTF-8".to_string(),
            )],
            body: OFFLINE_BODY.as_bytes().to_vec(),
        }
    }
}

/// Identity of a cache entry: method plus url without fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    pub method: String,
    pub url: String,
}

impl From<&FetchRequest> for RequestKey {
    fn from(request: &FetchRequest) -> Self {
        let mut url = request.url.clone();
        url.set_fragment(None);
        Self {
            method: request.method.to_ascii_uppercase(),
            url: url.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_ignores_fragment_and_method_case() {
        let mut request = FetchRequest::get(Url::parse("http://deck/index.html#songs").unwrap());
        request.method = "get".to_string();

        let key = RequestKey::from(&request);
        assert_eq!(key.method, "GET");
        assert_eq!(key.url, "http://deck/index.html");
    }

    #[test]
    fn only_direct_200_is_cacheable() {
        let mut response = FetchResponse {
            status: 200,
            kind: ResponseKind::Basic,
            headers: vec![],
            body: vec![],
        };
        assert!(response.is_cacheable());

        response.kind = ResponseKind::Opaque;
        assert!(!response.is_cacheable());

        response.kind = ResponseKind::Redirected;
        assert!(!response.is_cacheable());

        response.kind = ResponseKind::Basic;
        response.status = 204;
        assert!(response.is_ok());
        assert!(!response.is_cacheable());
    }
}
