//! Request and resource views
//!
//! The host owns the real request; this module only needs a handful of
//! read-only facts about it.

use std::sync::Arc;

use crate::config::ConfigScope;

/// Per-request facts consumed by the resolvers
pub trait RequestContext {
    /// Authenticated user, if any
    fn user(&self) -> Option<&str>;

    /// Request URI, used in diagnostics and by `%{REQUEST_URI}`
    fn uri(&self) -> &str;

    /// Effective configuration for the request's location
    fn scope(&self) -> &ConfigScope;

    /// Value of a template variable such as `REMOTE_USER`
    ///
    /// `None` means the request cannot supply it.
    fn variable(&self, name: &str) -> Option<String> {
        match name {
            "REMOTE_USER" => self.user().map(str::to_owned),
            "REQUEST_URI" => Some(self.uri().to_owned()),
            _ => None,
        }
    }
}

/// A DAV resource as seen by the live property hooks
pub trait Resource {
    /// Request the resource is being served for
    ///
    /// Providers that cannot reach a request must decline.
    fn request(&self) -> Option<&dyn RequestContext>;
}

/// Owned request facts, for hosts that do not keep their own request type
/// around and for the command line tool
#[derive(Debug, Clone)]
pub struct Request {
    uri: String,
    method: String,
    user: Option<String>,
    server_name: Option<String>,
    host: Option<String>,
    scheme: String,
    document_root: Option<String>,
    scope: Arc<ConfigScope>,
}

impl Request {
    /// Create a GET request for `uri` served under `scope`
    pub fn new(uri: impl Into<String>, scope: Arc<ConfigScope>) -> Self {
        Self {
            uri: uri.into(),
            method: "GET".to_string(),
            user: None,
            server_name: None,
            host: None,
            scheme: "http".to_string(),
            document_root: None,
            scope,
        }
    }

    /// Set the authenticated user
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Set the request method
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Set the virtual host name
    pub fn with_server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = Some(name.into());
        self
    }

    /// Set the `Host` header
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the scheme
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    /// Set the document root
    pub fn with_document_root(mut self, root: impl Into<String>) -> Self {
        self.document_root = Some(root.into());
        self
    }
}

impl RequestContext for Request {
    fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    fn uri(&self) -> &str {
        &self.uri
    }

    fn scope(&self) -> &ConfigScope {
        &self.scope
    }

    fn variable(&self, name: &str) -> Option<String> {
        match name {
            "REMOTE_USER" => self.user.clone(),
            "REQUEST_URI" => Some(self.uri.clone()),
            "REQUEST_METHOD" => Some(self.method.clone()),
            "REQUEST_SCHEME" => Some(self.scheme.clone()),
            "SERVER_NAME" => self.server_name.clone(),
            "HTTP_HOST" => self.host.clone(),
            "DOCUMENT_ROOT" => self.document_root.clone(),
            _ => None,
        }
    }
}

impl Resource for Request {
    fn request(&self) -> Option<&dyn RequestContext> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_variables() {
        let request = Request::new("/dav/file.txt", Arc::new(ConfigScope::default()))
            .with_user("alice")
            .with_server_name("dav.example.com")
            .with_method("PROPFIND");

        assert_eq!(request.variable("REMOTE_USER").as_deref(), Some("alice"));
        assert_eq!(request.variable("REQUEST_URI").as_deref(), Some("/dav/file.txt"));
        assert_eq!(request.variable("REQUEST_METHOD").as_deref(), Some("PROPFIND"));
        assert_eq!(request.variable("SERVER_NAME").as_deref(), Some("dav.example.com"));
        assert_eq!(request.variable("HTTP_HOST"), None);
        assert_eq!(request.variable("NOT_A_VARIABLE"), None);
    }

    #[test]
    fn test_anonymous_request() {
        let request = Request::new("/", Arc::new(ConfigScope::default()));
        assert_eq!(request.user(), None);
        assert_eq!(request.variable("REMOTE_USER"), None);
        assert!(request.request().is_some());
    }
}
