//! OPTIONS capability tokens

use crate::config::ConfigScope;

/// Compliance class token added to the `DAV` header
pub const ACCESS_CONTROL: &str = "access-control";

/// Methods RFC3744 adds; not advertised until ACL and REPORT are handled.
pub const RESERVED_METHODS: [&str; 2] = ["ACL", "REPORT"];

/// Tokens for the `DAV` response header
pub fn options_header(scope: &ConfigScope, tokens: &mut Vec<String>) {
    if scope.dav_access_enabled() {
        tokens.push(ACCESS_CONTROL.to_string());
    }
}

/// Tokens for the `Allow` response header
///
/// Deliberately empty; see [`RESERVED_METHODS`].
pub fn options_methods(_scope: &ConfigScope, _tokens: &mut Vec<String>) {}
