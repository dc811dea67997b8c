//! Live property catalog
//!
//! The RFC3744 properties this module answers for, and the table that maps
//! namespace URIs to the global `lpN` prefixes used when rendering them.

use tracing::debug;

use crate::DAV_XML_NAMESPACE;

/// Namespace URIs referenced by [`ACCESS_LIVEPROP_GROUP`].
///
/// Index 0 is the `DAV:` namespace; [`PropertySpec::ns`] points into this list.
pub const ACCESS_NAMESPACE_URIS: &[&str] = &[DAV_XML_NAMESPACE];

/// Index of `DAV:` within [`ACCESS_NAMESPACE_URIS`]
pub const ACCESS_URI_DAV: usize = 0;

/// Property identifiers
///
/// Raw values start at 1 and are stable; the host hands them back to us.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(i32)]
pub enum PropId {
    Acl = 1,
    AclRestrictions,
    AlternateUriSet,
    CurrentUserPrincipal,
    CurrentUserPrivilegeSet,
    Group,
    GroupMembership,
    GroupMemberSet,
    InheritedAclSet,
    Owner,
    PrincipalCollectionSet,
    PrincipalUrl,
    SupportedPrivilegeSet,
}

impl PropId {
    /// Every identifier, in catalog order
    pub const ALL: [PropId; 13] = [
        PropId::Acl,
        PropId::AclRestrictions,
        PropId::AlternateUriSet,
        PropId::CurrentUserPrincipal,
        PropId::CurrentUserPrivilegeSet,
        PropId::Group,
        PropId::GroupMembership,
        PropId::GroupMemberSet,
        PropId::InheritedAclSet,
        PropId::Owner,
        PropId::PrincipalCollectionSet,
        PropId::PrincipalUrl,
        PropId::SupportedPrivilegeSet,
    ];

    /// Map a host-supplied integer back to an identifier
    pub fn from_raw(raw: i32) -> Option<Self> {
        if raw < 1 {
            return None;
        }
        Self::ALL.get((raw - 1) as usize).copied()
    }

    /// Integer handed to the host
    pub fn raw(self) -> i32 {
        self as i32
    }
}

/// One supported live property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertySpec {
    /// Index into the owning group's namespace list
    pub ns: usize,
    /// Local element name, spelled exactly as RFC3744 does
    pub name: &'static str,
    pub propid: PropId,
    pub writable: bool,
}

const fn dav(name: &'static str, propid: PropId) -> PropertySpec {
    PropertySpec {
        ns: ACCESS_URI_DAV,
        name,
        propid,
        writable: false,
    }
}

static ACCESS_PROPS: [PropertySpec; 13] = [
    dav("acl", PropId::Acl),
    dav("acl-restrictions", PropId::AclRestrictions),
    dav("alternate-URI-set", PropId::AlternateUriSet),
    dav("current-user-principal", PropId::CurrentUserPrincipal),
    dav("current-user-privilege-set", PropId::CurrentUserPrivilegeSet),
    dav("group", PropId::Group),
    dav("group-membership", PropId::GroupMembership),
    dav("group-member-set", PropId::GroupMemberSet),
    dav("inherited-acl-set", PropId::InheritedAclSet),
    dav("owner", PropId::Owner),
    dav("principal-collection-set", PropId::PrincipalCollectionSet),
    dav("principal-URL", PropId::PrincipalUrl),
    dav("supported-privilege-set", PropId::SupportedPrivilegeSet),
];

/// A set of live properties registered with the host as a unit
#[derive(Debug)]
pub struct PropertyGroup {
    pub specs: &'static [PropertySpec],
    pub namespace_uris: &'static [&'static str],
}

/// The single property group provided by this module
pub static ACCESS_LIVEPROP_GROUP: PropertyGroup = PropertyGroup {
    specs: &ACCESS_PROPS,
    namespace_uris: ACCESS_NAMESPACE_URIS,
};

impl PropertyGroup {
    /// Find a property by qualified name
    ///
    /// Returns the identifier and its writability, or `None` when the name
    /// belongs to someone else.
    pub fn lookup(&self, namespace_uri: &str, local_name: &str) -> Option<(PropId, bool)> {
        let found = self
            .specs
            .iter()
            .find(|spec| spec.name == local_name && self.namespace_uri(spec) == namespace_uri)
            .map(|spec| (spec.propid, spec.writable));

        debug!(
            namespace = namespace_uri,
            name = local_name,
            found = found.is_some(),
            "live property lookup"
        );
        found
    }

    /// Metadata for a property identifier
    pub fn describe(&self, propid: PropId) -> Option<&'static PropertySpec> {
        self.specs.iter().find(|spec| spec.propid == propid)
    }

    /// Namespace URI of one of this group's specs
    pub fn namespace_uri(&self, spec: &PropertySpec) -> &'static str {
        self.namespace_uris[spec.ns]
    }
}

/// Convenience wrapper for [`PropertyGroup::lookup`] on the access group
pub fn lookup(namespace_uri: &str, local_name: &str) -> Option<(PropId, bool)> {
    ACCESS_LIVEPROP_GROUP.lookup(namespace_uri, local_name)
}

/// Convenience wrapper for [`PropertyGroup::describe`] on the access group
pub fn describe(propid: PropId) -> Option<&'static PropertySpec> {
    ACCESS_LIVEPROP_GROUP.describe(propid)
}

/// Process-wide namespace table
///
/// Every registered group contributes its namespace URIs; the position of a
/// URI in this table is the `N` of the `lpN` prefix used in responses.
#[derive(Debug, Clone, Default)]
pub struct NamespaceTable {
    uris: Vec<&'static str>,
}

impl NamespaceTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every namespace of `group`; URIs already present keep their index
    pub fn register_group(&mut self, group: &PropertyGroup) {
        for &uri in group.namespace_uris {
            if self.global_index(uri).is_none() {
                debug!(uri, index = self.uris.len(), "registered live property namespace");
                self.uris.push(uri);
            }
        }
    }

    /// Global index assigned to `uri`
    pub fn global_index(&self, uri: &str) -> Option<usize> {
        self.uris.iter().position(|known| *known == uri)
    }

    /// Registered URIs in index order
    pub fn uris(&self) -> &[&'static str] {
        &self.uris
    }
}

/// Global namespace index and metadata for a property of `group`
///
/// `None` when the property is not in the group or the group was never
/// registered with `table`.
pub fn global_ns(
    group: &PropertyGroup,
    propid: PropId,
    table: &NamespaceTable,
) -> Option<(usize, &'static PropertySpec)> {
    let spec = group.describe(propid)?;
    let index = table.global_index(group.namespace_uri(spec))?;
    Some((index, spec))
}
