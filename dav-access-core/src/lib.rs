//! # dav-access-core: RFC3744 access-control properties for WebDAV
//!
//! A live property provider for DAV servers. It answers the identity and
//! capability parts of the WebDAV Access Control Protocol without keeping
//! any ACLs of its own:
//!
//! - `DAV:current-user-principal` and `DAV:principal-URL`, derived from the
//!   authenticated user through a configurable URL template
//! - `DAV:current-user-privilege-set`, from a static per-location grant
//! - the `access-control` compliance class in OPTIONS responses
//! - the `DAV:principal` resource type for principal collections
//!
//! ## Architecture
//!
//! ```text
//!   host PROPFIND/OPTIONS handler
//!               │
//!               ▼
//!   ┌───────────────────────┐      ┌──────────────────┐
//!   │ DavAccessProvider     │─────▶│ catalog          │
//!   │ (host hook tables)    │      └──────────────────┘
//!   └───────────────────────┘
//!       │            │
//!       ▼            ▼
//!   insert ──▶ resolver ──▶ principal ──▶ expr
//!                    │
//!                    ▼
//!              ConfigScope (merged per location by ScopeTree)
//! ```
//!
//! ## Configuration
//!
//! | Directive | Values |
//! |-----------|--------|
//! | `DavAccess` | `on`/`off`: advertise `access-control` |
//! | `DavAccessPrincipal` | `on`/`off`: declare resources as principals |
//! | `DavAccessPriviledge` | `all`: grant read, write, bind and unbind |
//! | `DavAccessPrincipalUrl` | template, e.g. `/principals/%{escape:%{REMOTE_USER}}` |
//! | `DavAccessPrincipalUrlMode` | `template` (default) or `prefix` |

pub mod catalog;
pub mod config;
pub mod error;
pub mod escape;
pub mod expr;
pub mod host;
pub mod insert;
pub mod options;
pub mod principal;
pub mod provider;
pub mod request;
pub mod resolver;
pub mod resource_type;
pub mod tree;

// Re-exports for convenience
pub use catalog::{PropId, PropertyGroup, PropertySpec, ACCESS_LIVEPROP_GROUP};
pub use config::{ConfigScope, Directive, PrivilegeGrant, Setting};
pub use error::{DavAccessError, Result};
pub use expr::CompiledExpression;
pub use host::{Host, HostRegistry};
pub use insert::{InsertMode, Inserted};
pub use principal::{resolve_principal_url, PrincipalUrlMode};
pub use provider::DavAccessProvider;
pub use request::{Request, RequestContext, Resource};
pub use resolver::Outcome;
pub use resource_type::ResourceTypeDecision;
pub use tree::ScopeTree;

/// The `DAV:` XML namespace
pub const DAV_XML_NAMESPACE: &str = "DAV:";

/// Name the provider registers under
pub const MODULE_NAME: &str = "dav_access";
