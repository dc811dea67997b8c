//! Shared helpers for the dav-access integration tests

use dav_access_core::{DavAccessProvider, HostRegistry, Request, ScopeTree};

/// Server configuration used by most tests
pub const SERVER_CONFIG: &str = r#"
[server]
DavAccessPrincipalUrl = "/dav/principals/%{escape:%{REMOTE_USER}}"

[[location]]
path = "/dav"
DavAccess = "on"
DavAccessPriviledge = "all"

[[location]]
path = "/dav/principals"
DavAccessPrincipal = "on"

[[location]]
path = "/dav/shared"
directives = [
    "DavAccessPrincipalUrl /dav/principals",
    "DavAccessPrincipalUrlMode prefix",
]

[[location]]
path = "/dav/readonly"
DavAccess = "off"
"#;

/// Setup logging for tests
pub fn setup_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}

/// A host with the provider registered
pub fn host() -> HostRegistry {
    let mut host = HostRegistry::new();
    DavAccessProvider::register(&mut host);
    host
}

pub fn tree() -> ScopeTree {
    ScopeTree::from_toml(SERVER_CONFIG).expect("test configuration must load")
}

/// Request for `uri` under the scope the tree assigns to it
pub fn request(tree: &ScopeTree, uri: &str, user: Option<&str>) -> Request {
    let request = Request::new(uri, tree.scope_for(uri));
    match user {
        Some(user) => request.with_user(user),
        None => request,
    }
}
