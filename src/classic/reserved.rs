//! Reserved field names of the classic syntax
//!
//! The table is consulted before any content-model resolution: a name found
//! here never reaches the dictionary.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Handler selected for a reserved field name
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReservedField {
    /// Configured full-text fields
    Text,
    /// Every text property of the content model
    All,
    Id,
    QName,
    Type { exact: bool },
    Aspect { exact: bool },
    Path,
    Ancestor,
    Parent,
    PrimaryParent,
    Owner,
    Reader,
    Denied,
    /// Reader or owner
    Authority,
    Tag,
    Site,
    Exists,
    IsNotNull,
    IsNull,
    IsUnset,
    /// Recognized but never compiled
    Unsupported,
}

const UNSUPPORTED: [&str; 22] = [
    "ISROOT",
    "ISCONTAINER",
    "ISNODE",
    "TX",
    "TXID",
    "INTXID",
    "ACLTXID",
    "INACLTXID",
    "ACLID",
    "DBID",
    "TXCOMMITTIME",
    "ACLTXCOMMITTIME",
    "PRIMARYASSOCTYPEQNAME",
    "ASSOCTYPEQNAME",
    "FTSSTATUS",
    "CASCADETX",
    "TENANT",
    "PATHWITHREPEATS",
    "NPATH",
    "PNAME",
    "APATH",
    "ANAME",
];

static RESERVED_FIELDS: LazyLock<HashMap<&'static str, ReservedField>> = LazyLock::new(|| {
    let mut table = HashMap::with_capacity(48);
    table.insert("TEXT", ReservedField::Text);
    table.insert("ALL", ReservedField::All);
    table.insert("ID", ReservedField::Id);
    table.insert("QNAME", ReservedField::QName);
    table.insert("TYPE", ReservedField::Type { exact: false });
    table.insert("EXACTTYPE", ReservedField::Type { exact: true });
    table.insert("ASPECT", ReservedField::Aspect { exact: false });
    table.insert("EXACTASPECT", ReservedField::Aspect { exact: true });
    table.insert("PATH", ReservedField::Path);
    table.insert("ANCESTOR", ReservedField::Ancestor);
    table.insert("PARENT", ReservedField::Parent);
    table.insert("PRIMARYPARENT", ReservedField::PrimaryParent);
    table.insert("OWNER", ReservedField::Owner);
    table.insert("READER", ReservedField::Reader);
    table.insert("DENIED", ReservedField::Denied);
    table.insert("AUTHORITY", ReservedField::Authority);
    table.insert("TAG", ReservedField::Tag);
    table.insert("SITE", ReservedField::Site);
    table.insert("EXISTS", ReservedField::Exists);
    table.insert("ISNOTNULL", ReservedField::IsNotNull);
    table.insert("ISNULL", ReservedField::IsNull);
    table.insert("ISUNSET", ReservedField::IsUnset);
    for name in UNSUPPORTED {
        table.insert(name, ReservedField::Unsupported);
    }
    table
});

/// Look up a reserved field by exact name
pub fn lookup(name: &str) -> Option<ReservedField> {
    RESERVED_FIELDS.get(name).copied()
}

pub fn is_reserved(name: &str) -> bool {
    RESERVED_FIELDS.contains_key(name)
}
