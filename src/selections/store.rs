use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;

/// Field values remembered for one form: field name → last-known value.
///
/// `BTreeMap` keeps the on-disk document sorted by key.
pub type FieldValues = BTreeMap<String, Value>;

/// On-disk shape of the backing document: a single JSON object mapping form
/// identifiers to their remembered field values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
struct SelectionDocument(BTreeMap<String, FieldValues>);

/// JSON-backed store of remembered form selections.
///
/// The whole store is one JSON document: a top-level object keyed by
/// caller-chosen identifiers (conventionally one per form type), each value an
/// object of field-name → value. The document is loaded once at [`open`] and
/// rewritten in full on every [`set`]. There is no locking and no schema
/// versioning; a single-user desktop tool is the assumed caller.
///
/// [`open`]: Self::open
/// [`set`]: Self::set
#[derive(Debug, Clone)]
pub struct SelectionStore {
    file_path: Utf8PathBuf,
    data: SelectionDocument,
}

impl SelectionStore {
    /// Open the store backed by `file_path`, loading the document if it exists.
    ///
    /// A missing file yields an empty store; the file is created on the first
    /// [`set`](Self::set).
    ///
    /// # Errors
    ///
    /// Fails if an existing file cannot be read or is not valid JSON.
    pub fn open<P: AsRef<Utf8Path>>(file_path: P) -> Result<Self> {
        let file_path = file_path.as_ref().to_path_buf();

        let data = if file_path.exists() {
            let contents = fs::read_to_string(&file_path)
                .with_context(|| format!("Failed to read selection store: {file_path}"))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse selection store: {file_path}"))?
        } else {
            tracing::debug!(%file_path, "selection store file not found, starting empty");
            SelectionDocument::default()
        };

        Ok(Self { file_path, data })
    }

    /// The stored field values for `key`, or an empty mapping if absent.
    ///
    /// Never fails for a missing key.
    pub fn get(&self, key: &str) -> FieldValues {
        self.data.0.get(key).cloned().unwrap_or_default()
    }

    /// Whether any values are stored under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.data.0.contains_key(key)
    }

    /// Replace the stored mapping for `key` and rewrite the backing document.
    ///
    /// The write is synchronous and covers the whole document. Disk failures
    /// propagate to the caller; there is no retry policy.
    pub fn set(&mut self, key: impl Into<String>, values: FieldValues) -> Result<()> {
        let key = key.into();
        tracing::debug!(%key, fields = values.len(), "storing selection");
        self.data.0.insert(key, values);
        self.write_all()
    }

    /// Path of the backing document.
    pub fn file_path(&self) -> &Utf8Path {
        &self.file_path
    }

    // Write temp-then-rename so a crash mid-write cannot leave a truncated
    // document behind.
    fn write_all(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.data)
            .context("Failed to serialize selection store to JSON")?;

        let tmp_path = Utf8PathBuf::from(format!("{}.tmp", self.file_path));
        fs::write(&tmp_path, json)
            .with_context(|| format!("Failed to write selection store: {tmp_path}"))?;
        fs::rename(&tmp_path, &self.file_path)
            .with_context(|| format!("Failed to replace selection store: {}", self.file_path))?;

        Ok(())
    }
}
