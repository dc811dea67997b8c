//! `DAV:resourcetype` classification

use crate::request::Resource;
use crate::DAV_XML_NAMESPACE;

/// Resource type name declared for principal collections
pub const PRINCIPAL: &str = "principal";

/// Answer of a resource type provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceTypeDecision {
    /// Not our concern; let another provider decide
    Declined,
    /// The resource has this type
    Type {
        name: &'static str,
        namespace: &'static str,
    },
}

/// Classify `resource` as a principal when `DavAccessPrincipal` is on
pub fn get_resource_type(resource: &dyn Resource) -> ResourceTypeDecision {
    let Some(request) = resource.request() else {
        return ResourceTypeDecision::Declined;
    };

    if request.scope().principal_resource_type_enabled() {
        ResourceTypeDecision::Type {
            name: PRINCIPAL,
            namespace: DAV_XML_NAMESPACE,
        }
    } else {
        ResourceTypeDecision::Declined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigScope;
    use crate::request::{Request, RequestContext};
    use std::sync::Arc;

    struct Detached;

    impl Resource for Detached {
        fn request(&self) -> Option<&dyn RequestContext> {
            None
        }
    }

    #[test]
    fn test_principal_when_enabled() {
        let mut scope = ConfigScope::new();
        scope.apply_line("DavAccessPrincipal on").unwrap();
        let request = Request::new("/principals/alice", Arc::new(scope));

        assert_eq!(
            get_resource_type(&request),
            ResourceTypeDecision::Type {
                name: "principal",
                namespace: "DAV:"
            }
        );
    }

    #[test]
    fn test_declines_otherwise() {
        let mut scope = ConfigScope::new();
        scope.apply_line("DavAccess on").unwrap();
        let request = Request::new("/dav/", Arc::new(scope));
        assert_eq!(get_resource_type(&request), ResourceTypeDecision::Declined);

        let mut scope = ConfigScope::new();
        scope.apply_line("DavAccessPrincipal off").unwrap();
        let request = Request::new("/dav/", Arc::new(scope));
        assert_eq!(get_resource_type(&request), ResourceTypeDecision::Declined);

        assert_eq!(get_resource_type(&Detached), ResourceTypeDecision::Declined);
    }
}
