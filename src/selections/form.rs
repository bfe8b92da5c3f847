use crate::selections::store::{FieldValues, SelectionStore};
use anyhow::Result;
use serde_json::Value;

/// Capability contract a form widget offers to the selection layer.
///
/// This is the whole surface the persistence helpers see; how a widget renders
/// or validates is its own business.
pub trait FormField {
    /// Current value of the widget, or `None` when it has nothing to report
    /// (empty entry, unselected dropdown).
    fn value(&self) -> Option<Value>;

    /// Push a stored value into the widget. `Err` means the widget rejects the
    /// value (out of range, unknown option).
    fn set_value(&mut self, value: &Value) -> Result<()>;
}

/// Collect the current values of `fields` and store them under `form_key`.
///
/// Fields reporting no value are left out of the stored mapping. The store
/// write is synchronous; disk failures propagate.
pub fn save_selection(
    store: &mut SelectionStore,
    form_key: &str,
    fields: &[(&str, &dyn FormField)],
) -> Result<()> {
    let mut values = FieldValues::new();
    for (name, field) in fields {
        match field.value() {
            Some(value) => {
                values.insert((*name).to_string(), value);
            }
            None => {
                tracing::debug!(form = form_key, field = *name, "no value to store, skipping");
            }
        }
    }
    store.set(form_key, values)
}

/// Push the values stored under `form_key` back into `fields`.
///
/// Restore is best effort per field: a field with no stored value, or whose
/// widget rejects the stored value, is skipped without aborting the rest.
/// Returns the number of fields actually restored.
pub fn restore_selection(
    store: &SelectionStore,
    form_key: &str,
    fields: &mut [(&str, &mut dyn FormField)],
) -> usize {
    let stored = store.get(form_key);
    let mut restored = 0;

    for (name, field) in fields.iter_mut() {
        let Some(value) = stored.get(*name) else {
            continue;
        };
        match field.set_value(value) {
            Ok(()) => restored += 1,
            Err(err) => {
                tracing::debug!(
                    form = form_key,
                    field = *name,
                    error = %err,
                    "stored value rejected, skipping field"
                );
            }
        }
    }

    restored
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use camino::Utf8PathBuf;
    use serde_json::json;
    use tempfile::TempDir;

    /// Free-text widget stand-in; accepts any string.
    #[derive(Default)]
    struct TextField {
        text: Option<String>,
    }

    impl FormField for TextField {
        fn value(&self) -> Option<Value> {
            self.text.clone().map(Value::from)
        }

        fn set_value(&mut self, value: &Value) -> Result<()> {
            match value.as_str() {
                Some(s) => {
                    self.text = Some(s.to_string());
                    Ok(())
                }
                None => bail!("expected a string"),
            }
        }
    }

    /// Bounded numeric widget stand-in; rejects values outside its range.
    struct DepthField {
        meters: Option<u64>,
        max: u64,
    }

    impl FormField for DepthField {
        fn value(&self) -> Option<Value> {
            self.meters.map(Value::from)
        }

        fn set_value(&mut self, value: &Value) -> Result<()> {
            let Some(meters) = value.as_u64() else {
                bail!("expected a non-negative integer");
            };
            if meters > self.max {
                bail!("depth {meters} exceeds maximum {}", self.max);
            }
            self.meters = Some(meters);
            Ok(())
        }
    }

    fn open_store(temp_dir: &TempDir) -> SelectionStore {
        let path = Utf8PathBuf::try_from(temp_dir.path().join("saves.json")).unwrap();
        SelectionStore::open(path).unwrap()
    }

    #[test]
    fn test_save_skips_empty_fields() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = open_store(&temp_dir);

        let cruise = TextField { text: Some("23".to_string()) };
        let station = TextField::default();

        save_selection(
            &mut store,
            "StationPreSystemFrame",
            &[("cruise", &cruise), ("station", &station)],
        )
        .unwrap();

        let stored = store.get("StationPreSystemFrame");
        assert_eq!(stored.get("cruise"), Some(&json!("23")));
        assert!(!stored.contains_key("station"));
    }

    #[test]
    fn test_restore_pushes_values_into_fields() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = open_store(&temp_dir);
        store
            .set(
                "StationPreSystemFrame",
                FieldValues::from([
                    ("cruise".to_string(), json!("23")),
                    ("water_depth".to_string(), json!(87)),
                ]),
            )
            .unwrap();

        let mut cruise = TextField::default();
        let mut depth = DepthField { meters: None, max: 500 };

        let restored = restore_selection(
            &store,
            "StationPreSystemFrame",
            &mut [("cruise", &mut cruise), ("water_depth", &mut depth)],
        );

        assert_eq!(restored, 2);
        assert_eq!(cruise.text.as_deref(), Some("23"));
        assert_eq!(depth.meters, Some(87));
    }

    #[test]
    fn test_invalid_stored_value_does_not_abort_restore() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = open_store(&temp_dir);
        store
            .set(
                "StationPreSystemFrame",
                FieldValues::from([
                    ("cruise".to_string(), json!("23")),
                    // Deeper than the widget allows; must be skipped.
                    ("water_depth".to_string(), json!(9000)),
                    ("station".to_string(), json!("BY15")),
                ]),
            )
            .unwrap();

        let mut cruise = TextField::default();
        let mut station = TextField::default();
        let mut depth = DepthField { meters: None, max: 500 };

        let restored = restore_selection(
            &store,
            "StationPreSystemFrame",
            &mut [
                ("cruise", &mut cruise),
                ("water_depth", &mut depth),
                ("station", &mut station),
            ],
        );

        assert_eq!(restored, 2);
        assert_eq!(cruise.text.as_deref(), Some("23"));
        assert_eq!(station.text.as_deref(), Some("BY15"));
        assert_eq!(depth.meters, None);
    }

    #[test]
    fn test_restore_missing_form_key_restores_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir);

        let mut cruise = TextField::default();
        let restored =
            restore_selection(&store, "NoSuchFrame", &mut [("cruise", &mut cruise)]);

        assert_eq!(restored, 0);
        assert_eq!(cruise.text, None);
    }
}
