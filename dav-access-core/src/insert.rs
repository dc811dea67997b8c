//! Property insertion
//!
//! Renders a property into a PROPFIND response buffer in one of the three
//! shapes the host asks for.

use std::fmt::Write;

use crate::catalog::{global_ns, NamespaceTable, PropId, ACCESS_LIVEPROP_GROUP};
use crate::resolver::{resolve, Outcome};
use crate::request::Resource;

/// What the host wants inserted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertMode {
    /// Element with its value
    Value,
    /// Empty element, for `<D:propname/>` requests
    Name,
    /// `supported-live-property` descriptor
    Supported,
}

/// What was inserted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inserted {
    /// Nothing; the property is not defined here
    NotDefined,
    Value,
    Name,
    Supported,
}

impl From<InsertMode> for Inserted {
    fn from(mode: InsertMode) -> Self {
        match mode {
            InsertMode::Value => Inserted::Value,
            InsertMode::Name => Inserted::Name,
            InsertMode::Supported => Inserted::Supported,
        }
    }
}

/// Insert property `propid` of `resource` into `out`
///
/// `table` supplies the global namespace index for the `lpN` prefix. Returns
/// the requested mode when something was appended, and
/// [`Inserted::NotDefined`] (with `out` untouched) otherwise.
pub fn insert_prop(
    resource: &dyn Resource,
    propid: i32,
    mode: InsertMode,
    table: &NamespaceTable,
    out: &mut String,
) -> Inserted {
    let Some((global, spec)) =
        PropId::from_raw(propid).and_then(|id| global_ns(&ACCESS_LIVEPROP_GROUP, id, table))
    else {
        return Inserted::NotDefined;
    };

    // Advertising support does not depend on the property having a value
    if mode == InsertMode::Supported {
        let _ = writeln!(
            out,
            "<D:supported-live-property D:name=\"{}\" D:namespace=\"{}\"/>",
            spec.name,
            ACCESS_LIVEPROP_GROUP.namespace_uri(spec)
        );
        return Inserted::Supported;
    }

    let value = match resolve(propid, resource) {
        Outcome::Value(value) => value,
        Outcome::NotApplicable => return Inserted::NotDefined,
    };

    // Writing into a String cannot fail
    let _ = match mode {
        InsertMode::Value => writeln!(
            out,
            "<lp{ns}:{name}>{value}</lp{ns}:{name}>",
            ns = global,
            name = spec.name,
            value = value
        ),
        InsertMode::Name | InsertMode::Supported => {
            writeln!(out, "<lp{}:{}/>", global, spec.name)
        }
    };

    mode.into()
}
