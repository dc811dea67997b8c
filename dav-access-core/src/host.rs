//! Host-facing hook tables
//!
//! A DAV server calls into live property providers through a small set of
//! callbacks. These traits are that callback table; [`HostRegistry`] is an
//! in-process host that keeps the registrations and dispatches to them the
//! way a server's PROPFIND and OPTIONS handlers would.

use std::any::Any;
use std::sync::Arc;

use tracing::debug;

use crate::catalog::{NamespaceTable, PropertyGroup};
use crate::error::Result;
use crate::insert::{InsertMode, Inserted};
use crate::request::{RequestContext, Resource};
use crate::resource_type::ResourceTypeDecision;

/// One element of a PROPPATCH request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchElement {
    pub namespace: String,
    pub name: String,
    /// Raw inner XML for `set`, `None` for `remove`
    pub value: Option<String>,
}

/// PROPPATCH operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOperation {
    Set,
    Remove,
}

/// Provider-private state carried between the PROPPATCH phases
pub type PatchContext = Box<dyn Any + Send>;

/// Provider-private undo information
pub type PatchRollback = Box<dyn Any + Send>;

/// Live property callbacks
pub trait LivePropHooks: Send + Sync {
    /// Render a property into `out`
    fn insert_prop(
        &self,
        resource: &dyn Resource,
        propid: i32,
        mode: InsertMode,
        namespaces: &NamespaceTable,
        out: &mut String,
    ) -> Inserted;

    /// Whether PROPPATCH may change the property
    fn is_writable(&self, resource: &dyn Resource, propid: i32) -> bool;

    /// Namespace URIs the provider emits
    fn namespace_uris(&self) -> &'static [&'static str];

    /// Check a PROPPATCH element before anything is applied
    fn patch_validate(
        &self,
        resource: &dyn Resource,
        elem: &PatchElement,
        operation: PatchOperation,
    ) -> Result<Option<PatchContext>>;

    /// Apply a validated PROPPATCH element
    fn patch_exec(
        &self,
        resource: &dyn Resource,
        elem: &PatchElement,
        operation: PatchOperation,
        context: Option<&PatchContext>,
    ) -> Result<Option<PatchRollback>>;

    /// Make an applied change permanent
    fn patch_commit(
        &self,
        resource: &dyn Resource,
        operation: PatchOperation,
        context: Option<PatchContext>,
        rollback: Option<PatchRollback>,
    );

    /// Undo an applied change
    fn patch_rollback(
        &self,
        resource: &dyn Resource,
        operation: PatchOperation,
        context: Option<PatchContext>,
        rollback: Option<PatchRollback>,
    ) -> Result<()>;
}

/// OPTIONS capability callbacks
pub trait OptionsProvider: Send + Sync {
    /// Add compliance tokens to the `DAV` header
    fn dav_header(&self, request: &dyn RequestContext, tokens: &mut Vec<String>) -> Result<()>;

    /// Add method names to the `Allow` header
    fn dav_method(&self, request: &dyn RequestContext, tokens: &mut Vec<String>) -> Result<()>;
}

/// `DAV:resourcetype` callback
pub trait ResourceTypeProvider: Send + Sync {
    fn get_resource_type(&self, resource: &dyn Resource) -> ResourceTypeDecision;
}

/// Routes a property name to the provider that owns it
pub trait FindLiveprop: Send + Sync {
    /// Property id and hooks for a qualified name, or `None` to decline
    fn find_liveprop(
        &self,
        resource: &dyn Resource,
        namespace_uri: &str,
        name: &str,
    ) -> Option<(i32, Arc<dyn LivePropHooks>)>;
}

/// What a provider can register with
pub trait Host {
    fn register_liveprop_group(&mut self, group: &'static PropertyGroup);

    fn register_options_provider(&mut self, name: &str, provider: Arc<dyn OptionsProvider>);

    fn register_resource_type_provider(
        &mut self,
        name: &str,
        provider: Arc<dyn ResourceTypeProvider>,
    );

    fn hook_find_liveprop(&mut self, hook: Arc<dyn FindLiveprop>);
}

/// In-process host
#[derive(Default)]
pub struct HostRegistry {
    namespaces: NamespaceTable,
    groups: Vec<&'static PropertyGroup>,
    options: Vec<(String, Arc<dyn OptionsProvider>)>,
    resource_types: Vec<(String, Arc<dyn ResourceTypeProvider>)>,
    find_hooks: Vec<Arc<dyn FindLiveprop>>,
}

impl HostRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Global namespace table built from the registered groups
    pub fn namespaces(&self) -> &NamespaceTable {
        &self.namespaces
    }

    /// Registered property groups
    pub fn groups(&self) -> &[&'static PropertyGroup] {
        &self.groups
    }

    /// Names of the registered OPTIONS providers
    pub fn options_provider_names(&self) -> Vec<&str> {
        self.options.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Names of the registered resource type providers
    pub fn resource_type_provider_names(&self) -> Vec<&str> {
        self.resource_types.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Number of find-liveprop hooks
    pub fn find_hook_count(&self) -> usize {
        self.find_hooks.len()
    }

    /// Ask each hook in turn who owns a property
    pub fn find_liveprop(
        &self,
        resource: &dyn Resource,
        namespace_uri: &str,
        name: &str,
    ) -> Option<(i32, Arc<dyn LivePropHooks>)> {
        self.find_hooks
            .iter()
            .find_map(|hook| hook.find_liveprop(resource, namespace_uri, name))
    }

    /// Insert a property by qualified name
    pub fn insert_prop(
        &self,
        resource: &dyn Resource,
        namespace_uri: &str,
        name: &str,
        mode: InsertMode,
        out: &mut String,
    ) -> Inserted {
        match self.find_liveprop(resource, namespace_uri, name) {
            Some((propid, hooks)) => {
                hooks.insert_prop(resource, propid, mode, &self.namespaces, out)
            }
            None => {
                debug!(namespace = namespace_uri, name, "no provider owns property");
                Inserted::NotDefined
            }
        }
    }

    /// Insert every property of every registered group (`allprop`/`propname`)
    ///
    /// Returns how many were inserted.
    pub fn insert_all(&self, resource: &dyn Resource, mode: InsertMode, out: &mut String) -> usize {
        let mut inserted = 0;
        for group in &self.groups {
            for spec in group.specs {
                let uri = group.namespace_uri(spec);
                if self.insert_prop(resource, uri, spec.name, mode, out) != Inserted::NotDefined {
                    inserted += 1;
                }
            }
        }
        inserted
    }

    /// Collect `DAV` header tokens from every OPTIONS provider
    pub fn dav_header(&self, request: &dyn RequestContext) -> Result<Vec<String>> {
        let mut tokens = Vec::new();
        for (_, provider) in &self.options {
            provider.dav_header(request, &mut tokens)?;
        }
        Ok(tokens)
    }

    /// Collect `Allow` method tokens from every OPTIONS provider
    pub fn dav_methods(&self, request: &dyn RequestContext) -> Result<Vec<String>> {
        let mut tokens = Vec::new();
        for (_, provider) in &self.options {
            provider.dav_method(request, &mut tokens)?;
        }
        Ok(tokens)
    }

    /// First resource type a provider claims
    pub fn resource_type(&self, resource: &dyn Resource) -> ResourceTypeDecision {
        self.resource_types
            .iter()
            .map(|(_, provider)| provider.get_resource_type(resource))
            .find(|decision| *decision != ResourceTypeDecision::Declined)
            .unwrap_or(ResourceTypeDecision::Declined)
    }
}

impl Host for HostRegistry {
    fn register_liveprop_group(&mut self, group: &'static PropertyGroup) {
        self.namespaces.register_group(group);
        self.groups.push(group);
    }

    fn register_options_provider(&mut self, name: &str, provider: Arc<dyn OptionsProvider>) {
        self.options.push((name.to_string(), provider));
    }

    fn register_resource_type_provider(
        &mut self,
        name: &str,
        provider: Arc<dyn ResourceTypeProvider>,
    ) {
        self.resource_types.push((name.to_string(), provider));
    }

    fn hook_find_liveprop(&mut self, hook: Arc<dyn FindLiveprop>) {
        self.find_hooks.push(hook);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ACCESS_LIVEPROP_GROUP;
    use crate::config::ConfigScope;
    use crate::provider::DavAccessProvider;
    use crate::request::Request;

    struct Collections;

    impl ResourceTypeProvider for Collections {
        fn get_resource_type(&self, _resource: &dyn Resource) -> ResourceTypeDecision {
            ResourceTypeDecision::Type {
                name: "collection",
                namespace: "DAV:",
            }
        }
    }

    fn request(lines: &[&str]) -> Request {
        let mut scope = ConfigScope::new();
        for line in lines {
            scope.apply_line(line).unwrap();
        }
        Request::new("/dav/", Arc::new(scope)).with_user("alice")
    }

    fn registry() -> HostRegistry {
        let mut host = HostRegistry::new();
        DavAccessProvider::register(&mut host);
        host
    }

    #[test]
    fn test_insert_by_name() {
        let host = registry();
        let request = request(&["DavAccessPriviledge all"]);
        let mut out = String::new();

        assert_eq!(
            host.insert_prop(&request, "DAV:", "current-user-privilege-set", InsertMode::Name, &mut out),
            Inserted::Name
        );
        assert_eq!(
            host.insert_prop(&request, "DAV:", "getetag", InsertMode::Value, &mut out),
            Inserted::NotDefined
        );
        assert_eq!(out, "<lp0:current-user-privilege-set/>\n");
    }

    #[test]
    fn test_insert_all_supported() {
        let host = registry();
        let request = request(&[]);
        let mut out = String::new();

        let count = host.insert_all(&request, InsertMode::Supported, &mut out);
        assert_eq!(count, ACCESS_LIVEPROP_GROUP.specs.len());
        assert_eq!(out.lines().count(), 13);
        assert!(out.contains("D:name=\"acl-restrictions\""));
    }

    #[test]
    fn test_insert_all_values_skips_not_applicable() {
        let host = registry();
        let request = request(&["DavAccessPriviledge all"]);
        let mut out = String::new();

        // current-user-principal and current-user-privilege-set
        assert_eq!(host.insert_all(&request, InsertMode::Value, &mut out), 2);
    }

    #[test]
    fn test_options_tokens() {
        let host = registry();
        assert_eq!(
            host.dav_header(&request(&["DavAccess on"])).unwrap(),
            vec!["access-control"]
        );
        assert!(host.dav_header(&request(&[])).unwrap().is_empty());
        assert!(host.dav_methods(&request(&["DavAccess on"])).unwrap().is_empty());
    }

    #[test]
    fn test_resource_type_first_claim_wins() {
        let mut host = registry();
        host.register_resource_type_provider("collections", Arc::new(Collections));

        let principal = request(&["DavAccessPrincipal on"]);
        assert_eq!(
            host.resource_type(&principal),
            ResourceTypeDecision::Type {
                name: "principal",
                namespace: "DAV:"
            }
        );

        let plain = request(&[]);
        assert_eq!(
            host.resource_type(&plain),
            ResourceTypeDecision::Type {
                name: "collection",
                namespace: "DAV:"
            }
        );

        assert_eq!(
            HostRegistry::new().resource_type(&plain),
            ResourceTypeDecision::Declined
        );
    }
}
