//! Incoming HTTP request type.

use std::collections::HashMap;

use bytes::Bytes;
use http::{HeaderMap, Method, Uri};

/// Path variables matched by the hosting router.
///
/// The router inserts this into the request extensions before handing the
/// request over; [`Request::new`] picks it up from there.
#[derive(Clone, Debug, Default)]
pub struct PathParams(HashMap<String, String>);

impl PathParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    fn values(&self, name: &str) -> Option<&[String]> {
        self.0.get(name).map(std::slice::from_ref)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PathParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// An incoming HTTP request with its body already buffered.
///
/// Read-only: extractors borrow from it and never change it.
#[derive(Debug)]
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    params: PathParams,
    query: HashMap<String, Vec<String>>,
    cookies: HashMap<String, Vec<String>>,
}

impl Request {
    pub fn new(req: http::Request<Bytes>) -> Self {
        let (parts, body) = req.into_parts();
        Self::from_parts(parts, body)
    }

    pub fn from_parts(mut parts: http::request::Parts, body: Bytes) -> Self {
        let params = parts.extensions.remove::<PathParams>().unwrap_or_default();
        let query = parse_query(parts.uri.query());
        let cookies = parse_cookies(&parts.headers);
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            params,
            query,
            cookies,
        }
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn uri(&self) -> &Uri { &self.uri }
    pub fn path(&self) -> &str { self.uri.path() }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &Bytes { &self.body }

    /// Returns a named path variable.
    ///
    /// For a route `/users/{id}`, `req.path_variable("id")` on `/users/42` returns `Some("42")`.
    pub fn path_variable(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    pub(crate) fn path_values(&self, name: &str) -> Option<&[String]> {
        self.params.values(name)
    }

    /// Every value of a query parameter, in the order they appear.
    ///
    /// `None` when the parameter is absent altogether; `?v=` yields `Some([""])`.
    pub fn query_parameters(&self, name: &str) -> Option<&[String]> {
        self.query.get(name).map(Vec::as_slice)
    }

    /// Every value of a header, in order. Lookup is case-insensitive.
    ///
    /// Values that are not visible ASCII are skipped.
    pub fn header_values(&self, name: &str) -> Vec<String> {
        self.headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_owned)
            .collect()
    }

    /// Every value of a cookie across all `Cookie` headers.
    pub fn cookie_values(&self, name: &str) -> Option<&[String]> {
        self.cookies.get(name).map(Vec::as_slice)
    }
}

fn parse_query(query: Option<&str>) -> HashMap<String, Vec<String>> {
    let mut out: HashMap<String, Vec<String>> = HashMap::new();
    if let Some(query) = query {
        for (k, v) in url::form_urlencoded::parse(query.as_bytes()) {
            out.entry(k.into_owned()).or_default().push(v.into_owned());
        }
    }
    out
}

fn parse_cookies(headers: &HeaderMap) -> HashMap<String, Vec<String>> {
    let mut out: HashMap<String, Vec<String>> = HashMap::new();
    let pairs = headers
        .get_all(http::header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'));
    for pair in pairs {
        let mut parts = pair.trim().splitn(2, '=');
        let name = match parts.next() {
            Some(name) if !name.trim().is_empty() => name.trim(),
            _ => continue,
        };
        let value = parts.next().unwrap_or("").trim();
        out.entry(name.to_owned()).or_default().push(value.to_owned());
    }
    out
}
