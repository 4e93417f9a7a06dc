//! Benign-error catalog keyed by SMAPI function and operation.
//!
//! Each entry lists message substrings that mean "the desired state already
//! holds" for that one (api, operation) pair. Entries never apply globally:
//! "Image disk already defined" is benign when creating a disk and a real
//! error anywhere else.

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Kind of change an operation makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum OpKind {
    /// Define a new object.
    Create,
    /// Remove an object.
    Delete,
    /// Modify an existing definition.
    Update,
    /// Log on / start an image.
    Activate,
    /// Log off / stop an image.
    Deactivate,
    /// Set a runtime attribute.
    Set,
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Delete => "delete",
            Self::Update => "update",
            Self::Activate => "activate",
            Self::Deactivate => "deactivate",
            Self::Set => "set",
        })
    }
}

/// Substrings shared by the image create/delete pair.
const IMAGE_DEFINED: &[&str] = &[
    "Image or profile name already defined",
    "Image or profile definition not found",
];

/// Substrings shared by the activate/deactivate pair.
const IMAGE_STATE: &[&str] = &["Image already active", "HCPUSO045E", "not logged on"];

/// Built-in entries.
const BUILTIN: &[(&str, OpKind, &[&str])] = &[
    ("Image_Create_DM", OpKind::Create, IMAGE_DEFINED),
    ("Image_Delete_DM", OpKind::Delete, IMAGE_DEFINED),
    ("Image_Disk_Create_DM", OpKind::Create, &["Image disk already defined"]),
    ("Image_Disk_Delete_DM", OpKind::Delete, &["Image disk does not exist"]),
    ("Image_Disk_Copy_DM", OpKind::Create, &["Image disk already defined"]),
    ("Image_Device_Dedicate_DM", OpKind::Create, &["Image device already defined"]),
    ("Image_Device_Undedicate_DM", OpKind::Delete, &["Image device not defined"]),
    (
        "Image_Definition_Update_DM",
        OpKind::Update,
        &["Image or profile name already defined"],
    ),
    ("Image_Activate", OpKind::Activate, IMAGE_STATE),
    ("Image_Deactivate", OpKind::Deactivate, IMAGE_STATE),
    ("Dirm_Nicdef", OpKind::Create, &[]),
    ("Dirm_Nicdef", OpKind::Delete, &[]),
    ("Cp_SetShare", OpKind::Set, &[]),
];

/// One catalog entry as it appears in a JSON file.
#[derive(Debug, Deserialize)]
struct Entry {
    /// SMAPI function name.
    api: String,
    /// Operation kind.
    operation: OpKind,
    /// Benign substrings.
    #[serde(default)]
    benign: Vec<String>,
}

/// Declarative table of benign substrings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorCatalog {
    /// API name, then operation, to substrings.
    entries: HashMap<String, HashMap<OpKind, Vec<String>>>,
}

impl ErrorCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the catalog of known z/VM benign messages.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for (api, op, benign) in BUILTIN {
            catalog.insert(*api, *op, benign.iter().copied());
        }
        catalog
    }

    /// Replaces the entry for `(api, op)`.
    pub fn insert<I, S>(&mut self, api: impl Into<String>, op: OpKind, benign: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries
            .entry(api.into())
            .or_default()
            .insert(op, benign.into_iter().map(Into::into).collect());
    }

    /// Returns the benign substrings for `(api, op)`, empty if unknown.
    pub fn lookup(&self, api: &str, op: OpKind) -> &[String] {
        self.entries
            .get(api)
            .and_then(|ops| ops.get(&op))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of `(api, op)` entries.
    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    /// Returns `true` if the catalog has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.values().all(HashMap::is_empty)
    }

    /// Overlays `other` on `self`. An `(api, op)` entry in `other` wins;
    /// other operations of the same api are kept.
    pub fn merge(&mut self, other: Self) {
        for (api, ops) in other.entries {
            self.entries.entry(api).or_default().extend(ops);
        }
    }

    /// Parses a JSON array of `{"api", "operation", "benign"}` objects.
    ///
    /// A key listed twice keeps its last entry.
    pub fn from_json(reader: impl Read) -> Result<Self> {
        let entries: Vec<Entry> =
            serde_json::from_reader(reader).map_err(|e| Error::Catalog(e.to_string()))?;
        let mut catalog = Self::new();
        for entry in entries {
            catalog.insert(entry.api, entry.operation, entry.benign);
        }
        Ok(catalog)
    }

    /// Loads a JSON catalog file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).map_err(|e| Error::Catalog(format!("{}: {e}", path.display())))?;
        Self::from_json(BufReader::new(file))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn builtin_lookups() {
        let catalog = ErrorCatalog::builtin();
        assert_eq!(
            catalog.lookup("Image_Disk_Create_DM", OpKind::Create),
            ["Image disk already defined"]
        );
        assert_eq!(
            catalog.lookup("Image_Activate", OpKind::Activate),
            ["Image already active", "HCPUSO045E", "not logged on"]
        );
        assert!(catalog.lookup("Dirm_Nicdef", OpKind::Create).is_empty());
    }

    #[test]
    fn entries_are_scoped_per_operation() {
        let catalog = ErrorCatalog::builtin();
        assert!(catalog.lookup("Image_Disk_Create_DM", OpKind::Delete).is_empty());
        assert!(catalog.lookup("No_Such_API", OpKind::Create).is_empty());
    }

    #[test]
    fn json_overrides_builtin() {
        let json = r#"[
            {"api": "Dirm_Nicdef", "operation": "create", "benign": ["HCPNIC2001E"]},
            {"api": "Cp_SetShare", "operation": "set"}
        ]"#;
        let mut catalog = ErrorCatalog::builtin();
        catalog.merge(ErrorCatalog::from_json(json.as_bytes()).unwrap());

        assert_eq!(catalog.lookup("Dirm_Nicdef", OpKind::Create), ["HCPNIC2001E"]);
        assert!(catalog.lookup("Cp_SetShare", OpKind::Set).is_empty());
        assert_eq!(
            catalog.lookup("Image_Disk_Delete_DM", OpKind::Delete),
            ["Image disk does not exist"]
        );
    }

    #[test]
    fn merge_keeps_sibling_operations() {
        let mut catalog = ErrorCatalog::new();
        catalog.insert("Image_Disk_Create_DM", OpKind::Create, ["already defined"]);
        catalog.insert("Image_Disk_Create_DM", OpKind::Delete, ["does not exist"]);

        let mut overrides = ErrorCatalog::new();
        overrides.insert("Image_Disk_Create_DM", OpKind::Create, ["HCPDIR001E"]);
        catalog.merge(overrides);

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.lookup("Image_Disk_Create_DM", OpKind::Create), ["HCPDIR001E"]);
        assert_eq!(catalog.lookup("Image_Disk_Create_DM", OpKind::Delete), ["does not exist"]);
    }

    #[test]
    fn merge_adds_operation_to_known_api() {
        let mut overrides = ErrorCatalog::new();
        overrides.insert("Dirm_Nicdef", OpKind::Update, ["HCPNIC2002E"]);

        let mut catalog = ErrorCatalog::builtin();
        catalog.merge(overrides);

        assert_eq!(catalog.lookup("Dirm_Nicdef", OpKind::Update), ["HCPNIC2002E"]);
        assert!(catalog.lookup("Dirm_Nicdef", OpKind::Create).is_empty());
        assert_eq!(catalog.len(), BUILTIN.len() + 1);
    }

    #[test]
    fn empty_catalog() {
        let catalog = ErrorCatalog::new();
        assert!(catalog.is_empty());
        assert_eq!(catalog.len(), 0);
        assert!(!ErrorCatalog::builtin().is_empty());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"api": "Image_Create_DM", "operation": "create", "benign": ["already there"]}}]"#
        )
        .unwrap();

        let catalog = ErrorCatalog::load(file.path()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.lookup("Image_Create_DM", OpKind::Create), ["already there"]);
    }

    #[test]
    fn rejects_unknown_operation() {
        let json = r#"[{"api": "Image_Create_DM", "operation": "explode", "benign": []}]"#;
        let err = ErrorCatalog::from_json(json.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Catalog(_)));
    }

    #[test]
    fn missing_file_is_catalog_error() {
        let err = ErrorCatalog::load("/nonexistent/catalog.json").unwrap_err();
        assert!(matches!(err, Error::Catalog(msg) if msg.contains("/nonexistent/catalog.json")));
    }
}
