//! The dav_access provider
//!
//! Binds the catalog, resolvers and advertisers to the host hook tables.

use std::sync::Arc;

use tracing::info;

use crate::catalog::{self, NamespaceTable, ACCESS_LIVEPROP_GROUP, ACCESS_NAMESPACE_URIS};
use crate::error::Result;
use crate::host::{
    FindLiveprop, Host, LivePropHooks, OptionsProvider, PatchContext, PatchElement,
    PatchOperation, PatchRollback, ResourceTypeProvider,
};
use crate::insert::{self, InsertMode, Inserted};
use crate::options;
use crate::request::{RequestContext, Resource};
use crate::resolver;
use crate::resource_type::{self, ResourceTypeDecision};
use crate::MODULE_NAME;

/// RFC3744 live property provider
#[derive(Debug, Clone, Copy, Default)]
pub struct DavAccessProvider;

impl DavAccessProvider {
    /// Register the property group, OPTIONS provider, resource type provider
    /// and find-liveprop hook with `host`
    pub fn register(host: &mut dyn Host) {
        let provider = Arc::new(DavAccessProvider);

        host.register_liveprop_group(&ACCESS_LIVEPROP_GROUP);
        host.register_options_provider(MODULE_NAME, provider.clone());
        host.register_resource_type_provider(MODULE_NAME, provider.clone());
        host.hook_find_liveprop(provider);

        info!(
            properties = ACCESS_LIVEPROP_GROUP.specs.len(),
            "registered {} live property provider", MODULE_NAME
        );
    }
}

// None of our properties are writable, so every PROPPATCH phase succeeds
// without doing anything.
impl LivePropHooks for DavAccessProvider {
    fn insert_prop(
        &self,
        resource: &dyn Resource,
        propid: i32,
        mode: InsertMode,
        namespaces: &NamespaceTable,
        out: &mut String,
    ) -> Inserted {
        insert::insert_prop(resource, propid, mode, namespaces, out)
    }

    fn is_writable(&self, _resource: &dyn Resource, propid: i32) -> bool {
        resolver::is_writable(propid)
    }

    fn namespace_uris(&self) -> &'static [&'static str] {
        ACCESS_NAMESPACE_URIS
    }

    fn patch_validate(
        &self,
        _resource: &dyn Resource,
        _elem: &PatchElement,
        _operation: PatchOperation,
    ) -> Result<Option<PatchContext>> {
        Ok(None)
    }

    fn patch_exec(
        &self,
        _resource: &dyn Resource,
        _elem: &PatchElement,
        _operation: PatchOperation,
        _context: Option<&PatchContext>,
    ) -> Result<Option<PatchRollback>> {
        Ok(None)
    }

    fn patch_commit(
        &self,
        _resource: &dyn Resource,
        _operation: PatchOperation,
        _context: Option<PatchContext>,
        _rollback: Option<PatchRollback>,
    ) {
    }

    fn patch_rollback(
        &self,
        _resource: &dyn Resource,
        _operation: PatchOperation,
        _context: Option<PatchContext>,
        _rollback: Option<PatchRollback>,
    ) -> Result<()> {
        Ok(())
    }
}

impl OptionsProvider for DavAccessProvider {
    fn dav_header(&self, request: &dyn RequestContext, tokens: &mut Vec<String>) -> Result<()> {
        options::options_header(request.scope(), tokens);
        Ok(())
    }

    fn dav_method(&self, request: &dyn RequestContext, tokens: &mut Vec<String>) -> Result<()> {
        options::options_methods(request.scope(), tokens);
        Ok(())
    }
}

impl ResourceTypeProvider for DavAccessProvider {
    fn get_resource_type(&self, resource: &dyn Resource) -> ResourceTypeDecision {
        resource_type::get_resource_type(resource)
    }
}

impl FindLiveprop for DavAccessProvider {
    fn find_liveprop(
        &self,
        _resource: &dyn Resource,
        namespace_uri: &str,
        name: &str,
    ) -> Option<(i32, Arc<dyn LivePropHooks>)> {
        let (propid, _) = catalog::lookup(namespace_uri, name)?;
        let hooks: Arc<dyn LivePropHooks> = Arc::new(*self);
        Some((propid.raw(), hooks))
    }
}
