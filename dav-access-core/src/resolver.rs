//! Live property values
//!
//! Only three of the catalogued properties are computed: `principal-URL`,
//! `current-user-principal` and `current-user-privilege-set`. The rest are
//! advertised by the catalog but resolve to [`Outcome::NotApplicable`] until
//! ACL storage exists.

use crate::catalog::PropId;
use crate::config::PrivilegeGrant;
use crate::escape::escape_entity;
use crate::principal::resolve_principal_url;
use crate::request::{RequestContext, Resource};

/// Value of `current-user-principal` for anonymous requests
pub const UNAUTHENTICATED: &str = "<D:unauthenticated/>";

/// Value of `current-user-privilege-set` under `DavAccessPriviledge all`
pub const ALL_PRIVILEGES: &str = "<D:privilege><D:read/></D:privilege>\
<D:privilege><D:write/></D:privilege>\
<D:privilege><D:bind/></D:privilege>\
<D:privilege><D:unbind/></D:privilege>";

/// Result of resolving one property for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Inner XML of the property element
    Value(String),
    /// The property does not exist for this resource and request
    NotApplicable,
}

impl Outcome {
    pub fn value(&self) -> Option<&str> {
        match self {
            Outcome::Value(value) => Some(value),
            Outcome::NotApplicable => None,
        }
    }
}

/// Resolve a host-supplied property id against a resource
pub fn resolve(propid: i32, resource: &dyn Resource) -> Outcome {
    let Some(propid) = PropId::from_raw(propid) else {
        return Outcome::NotApplicable;
    };
    match resource.request() {
        Some(request) => resolve_for_request(propid, request),
        // Without a request nobody is authenticated
        None if propid == PropId::CurrentUserPrincipal => {
            Outcome::Value(UNAUTHENTICATED.to_string())
        }
        None => Outcome::NotApplicable,
    }
}

/// Resolve a property for a request
pub fn resolve_for_request(propid: PropId, request: &dyn RequestContext) -> Outcome {
    match propid {
        PropId::PrincipalUrl => match resolve_principal_url(request) {
            Some(url) => Outcome::Value(href(&url)),
            None => Outcome::NotApplicable,
        },
        PropId::CurrentUserPrincipal => match resolve_principal_url(request) {
            Some(url) => Outcome::Value(href(&url)),
            None => Outcome::Value(UNAUTHENTICATED.to_string()),
        },
        // All or nothing; there is no per-privilege computation.
        PropId::CurrentUserPrivilegeSet => match request.scope().privilege_grant() {
            Some(PrivilegeGrant::All) => Outcome::Value(ALL_PRIVILEGES.to_string()),
            None => Outcome::NotApplicable,
        },
        PropId::Acl
        | PropId::AclRestrictions
        | PropId::AlternateUriSet
        | PropId::Group
        | PropId::GroupMembership
        | PropId::GroupMemberSet
        | PropId::InheritedAclSet
        | PropId::Owner
        | PropId::PrincipalCollectionSet
        | PropId::SupportedPrivilegeSet => Outcome::NotApplicable,
    }
}

fn href(url: &str) -> String {
    format!("<D:href>{}</D:href>", escape_entity(url))
}

/// Whether a property can be written; none of ours can
pub fn is_writable(_propid: i32) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigScope;
    use crate::request::Request;
    use std::sync::Arc;

    struct Detached;

    impl Resource for Detached {
        fn request(&self) -> Option<&dyn RequestContext> {
            None
        }
    }

    fn request(lines: &[&str], user: Option<&str>) -> Request {
        let mut scope = ConfigScope::new();
        for line in lines {
            scope.apply_line(line).unwrap();
        }
        let request = Request::new("/dav/home/", Arc::new(scope));
        match user {
            Some(user) => request.with_user(user),
            None => request,
        }
    }

    const TEMPLATE: &str = "DavAccessPrincipalUrl /dav/principals/%{REMOTE_USER}";

    #[test]
    fn test_principal_url() {
        let authed = request(&[TEMPLATE], Some("alice"));
        assert_eq!(
            resolve(PropId::PrincipalUrl.raw(), &authed),
            Outcome::Value("<D:href>/dav/principals/alice</D:href>".into())
        );

        let anonymous = request(&[TEMPLATE], None);
        assert_eq!(
            resolve(PropId::PrincipalUrl.raw(), &anonymous),
            Outcome::NotApplicable
        );
    }

    #[test]
    fn test_current_user_principal_is_always_defined() {
        let anonymous = request(&[TEMPLATE], None);
        assert_eq!(
            resolve(PropId::CurrentUserPrincipal.raw(), &anonymous),
            Outcome::Value(UNAUTHENTICATED.into())
        );

        let unconfigured = request(&[], Some("alice"));
        assert_eq!(
            resolve(PropId::CurrentUserPrincipal.raw(), &unconfigured),
            Outcome::Value(UNAUTHENTICATED.into())
        );

        let authed = request(&[TEMPLATE], Some("a&b"));
        assert_eq!(
            resolve(PropId::CurrentUserPrincipal.raw(), &authed),
            Outcome::Value("<D:href>/dav/principals/a&amp;b</D:href>".into())
        );
    }

    #[test]
    fn test_privilege_set() {
        let granted = request(&["DavAccessPriviledge all"], None);
        let outcome = resolve(PropId::CurrentUserPrivilegeSet.raw(), &granted);
        assert_eq!(
            outcome.value(),
            Some(
                "<D:privilege><D:read/></D:privilege><D:privilege><D:write/></D:privilege>\
                 <D:privilege><D:bind/></D:privilege><D:privilege><D:unbind/></D:privilege>"
            )
        );
        // Same answer every time, whatever the resource
        let elsewhere = Request::new("/other/", Arc::new(granted.scope().clone()));
        assert_eq!(resolve(PropId::CurrentUserPrivilegeSet.raw(), &elsewhere), outcome);

        let ungranted = request(&["DavAccess on"], Some("alice"));
        assert_eq!(
            resolve(PropId::CurrentUserPrivilegeSet.raw(), &ungranted),
            Outcome::NotApplicable
        );
    }

    #[test]
    fn test_unimplemented_and_unknown_ids() {
        let everything = request(
            &[TEMPLATE, "DavAccessPriviledge all", "DavAccess on"],
            Some("alice"),
        );
        for propid in [
            PropId::Acl,
            PropId::AclRestrictions,
            PropId::AlternateUriSet,
            PropId::Group,
            PropId::GroupMembership,
            PropId::GroupMemberSet,
            PropId::InheritedAclSet,
            PropId::Owner,
            PropId::PrincipalCollectionSet,
            PropId::SupportedPrivilegeSet,
        ] {
            assert_eq!(resolve(propid.raw(), &everything), Outcome::NotApplicable);
        }
        for raw in [0, -1, 14, 9999] {
            assert_eq!(resolve(raw, &everything), Outcome::NotApplicable);
        }
    }

    #[test]
    fn test_detached_resource() {
        assert_eq!(
            resolve(PropId::CurrentUserPrincipal.raw(), &Detached),
            Outcome::Value(UNAUTHENTICATED.into())
        );
        assert_eq!(
            resolve(PropId::PrincipalUrl.raw(), &Detached),
            Outcome::NotApplicable
        );
        assert_eq!(
            resolve(PropId::CurrentUserPrivilegeSet.raw(), &Detached),
            Outcome::NotApplicable
        );
    }

    #[test]
    fn test_nothing_is_writable() {
        for propid in PropId::ALL {
            assert!(!is_writable(propid.raw()));
        }
        assert!(!is_writable(42));
    }
}
