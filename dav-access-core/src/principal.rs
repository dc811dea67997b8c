//! Principal URL derivation
//!
//! Turns the authenticated user of a request into the URL of their principal
//! resource, using the `DavAccessPrincipalUrl` template of the request's
//! scope. Two ways of reading the template are supported, selected with
//! `DavAccessPrincipalUrlMode`:
//!
//! - `template`: the evaluated template is the whole URL, so it must
//!   reference the user itself, e.g. `/dav/principals/%{escape:%{REMOTE_USER}}`.
//! - `prefix`: the evaluated template is a collection URL and the user name is
//!   appended as one escaped path segment, e.g. `/dav/principals`.

use std::fmt;
use std::str::FromStr;

use tracing::warn;

use crate::escape::escape_path_segment;
use crate::request::RequestContext;

/// How a principal URL template is turned into a URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrincipalUrlMode {
    /// The template yields the complete URL
    #[default]
    Template,
    /// The template yields a prefix; the escaped user name is appended
    Prefix,
}

impl FromStr for PrincipalUrlMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("template") {
            Ok(PrincipalUrlMode::Template)
        } else if s.eq_ignore_ascii_case("prefix") {
            Ok(PrincipalUrlMode::Prefix)
        } else {
            Err(format!("unknown principal URL mode '{}'", s))
        }
    }
}

impl fmt::Display for PrincipalUrlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrincipalUrlMode::Template => f.write_str("template"),
            PrincipalUrlMode::Prefix => f.write_str("prefix"),
        }
    }
}

/// Principal URL of the request's user
///
/// `None` for anonymous requests, when no template is configured, or when
/// the template fails to evaluate (logged as a warning). Callers treat all
/// three as "unauthenticated".
pub fn resolve_principal_url(request: &dyn RequestContext) -> Option<String> {
    let user = request.user()?;
    let scope = request.scope();
    let template = scope.principal_url()?;

    let evaluated = match template.eval(request) {
        Ok(url) => url,
        Err(err) => {
            warn!(
                uri = request.uri(),
                "Failure while evaluating the principal URL expression for '{}', \
                 no principal URL returned: {}",
                request.uri(),
                err
            );
            return None;
        }
    };

    Some(match scope.principal_url_mode() {
        PrincipalUrlMode::Template => evaluated,
        PrincipalUrlMode::Prefix => append_segment(evaluated, user),
    })
}

/// Append `user` to `prefix` as a single escaped path segment
fn append_segment(mut prefix: String, user: &str) -> String {
    if !prefix.ends_with('/') {
        prefix.push('/');
    }
    prefix.push_str(&escape_path_segment(user));
    prefix
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigScope;
    use crate::request::Request;
    use std::sync::Arc;
    use tracing_test::traced_test;

    fn scope(lines: &[&str]) -> Arc<ConfigScope> {
        let mut scope = ConfigScope::new();
        for line in lines {
            scope.apply_line(line).unwrap();
        }
        Arc::new(scope)
    }

    #[test]
    fn test_template_mode() {
        let scope = scope(&["DavAccessPrincipalUrl /dav/principals/%{escape:%{REMOTE_USER}}"]);
        let request = Request::new("/dav/", scope).with_user("alice");
        assert_eq!(
            resolve_principal_url(&request).as_deref(),
            Some("/dav/principals/alice")
        );
    }

    #[test]
    fn test_prefix_mode() {
        let scope = scope(&[
            "DavAccessPrincipalUrl /dav/principals",
            "DavAccessPrincipalUrlMode prefix",
        ]);
        let request = Request::new("/dav/", scope.clone()).with_user("alice");
        assert_eq!(
            resolve_principal_url(&request).as_deref(),
            Some("/dav/principals/alice")
        );

        let request = Request::new("/dav/", scope).with_user("evil/../admin");
        let url = resolve_principal_url(&request).unwrap();
        assert_eq!(url, "/dav/principals/evil%2F..%2Fadmin");
        assert_eq!(url.matches('/').count(), 3);
    }

    #[test]
    fn test_prefix_mode_trailing_slash() {
        let scope = scope(&[
            "DavAccessPrincipalUrl /dav/principals/",
            "DavAccessPrincipalUrlMode prefix",
        ]);
        let request = Request::new("/dav/", scope).with_user("bob smith");
        assert_eq!(
            resolve_principal_url(&request).as_deref(),
            Some("/dav/principals/bob%20smith")
        );
    }

    #[test]
    fn test_anonymous_or_unconfigured() {
        let configured = scope(&["DavAccessPrincipalUrl /p/%{user}"]);
        assert_eq!(resolve_principal_url(&Request::new("/", configured)), None);

        let unconfigured = scope(&["DavAccess on"]);
        let request = Request::new("/", unconfigured).with_user("alice");
        assert_eq!(resolve_principal_url(&request), None);
    }

    #[test]
    fn test_user_is_read_per_request() {
        let scope = scope(&["DavAccessPrincipalUrl /p/%{user}"]);
        let alice = Request::new("/", scope.clone()).with_user("alice");
        let bob = Request::new("/", scope).with_user("bob");
        assert_eq!(resolve_principal_url(&alice).as_deref(), Some("/p/alice"));
        assert_eq!(resolve_principal_url(&bob).as_deref(), Some("/p/bob"));
    }

    #[traced_test]
    #[test]
    fn test_eval_failure_is_logged_and_absent() {
        let scope = scope(&["DavAccessPrincipalUrl https://%{SERVER_NAME}/p/%{user}"]);
        let request = Request::new("/dav/cal/", scope).with_user("alice");

        assert_eq!(resolve_principal_url(&request), None);
        assert!(logs_contain(
            "Failure while evaluating the principal URL expression for '/dav/cal/'"
        ));
        assert!(logs_contain("variable 'SERVER_NAME' is not available"));
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("prefix".parse::<PrincipalUrlMode>(), Ok(PrincipalUrlMode::Prefix));
        assert_eq!("TEMPLATE".parse::<PrincipalUrlMode>(), Ok(PrincipalUrlMode::Template));
        assert!("other".parse::<PrincipalUrlMode>().is_err());
        assert_eq!(PrincipalUrlMode::Prefix.to_string(), "prefix");
    }
}
