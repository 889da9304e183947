//! External tag table (savory/sweet, dish type, cuisine, diet) joined onto
//! recipes by title. Values are opaque text.

use crate::config::TagsConfig;
use crate::events::{Event, EventSink};
use crate::model::Recipe;
use crate::ImportError;
use log::Level;
use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct TagTable {
    columns: Vec<String>,
    rows: HashMap<String, BTreeMap<String, String>>,
}

impl TagTable {
    /// A table with the configured columns and no rows
    pub fn empty(config: &TagsConfig) -> Self {
        Self {
            columns: config.columns.clone(),
            rows: HashMap::new(),
        }
    }

    pub fn from_path(path: &Path, config: &TagsConfig) -> Result<Self, ImportError> {
        let file = std::fs::File::open(path).map_err(|e| ImportError::io(path, e))?;
        Self::from_reader(file, config)
    }

    pub fn from_reader<R: Read>(reader: R, config: &TagsConfig) -> Result<Self, ImportError> {
        let delimiter = u8::try_from(config.delimiter).map_err(|_| {
            ::config::ConfigError::Message(format!(
                "Tag delimiter '{}' is not a single-byte character",
                config.delimiter
            ))
        })?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        let position = |name: &str| headers.iter().position(|h| h.trim() == name);
        let key = position(&config.key_column)
            .ok_or_else(|| ImportError::MissingTagColumn(config.key_column.clone()))?;
        let columns: Vec<(String, Option<usize>)> = config
            .columns
            .iter()
            .map(|c| (c.clone(), position(c)))
            .collect();

        let mut rows = HashMap::new();
        for record in reader.records() {
            let record = record?;
            let Some(name) = record.get(key).map(str::trim).filter(|n| !n.is_empty()) else {
                continue;
            };
            let values: BTreeMap<String, String> = columns
                .iter()
                .map(|(column, index)| {
                    let value = index.and_then(|i| record.get(i)).unwrap_or_default();
                    (column.clone(), value.trim().to_string())
                })
                .collect();
            rows.insert(name.to_string(), values);
        }

        Ok(Self {
            columns: config.columns.clone(),
            rows,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Copies tag values onto each recipe. Recipes without a tag row keep
    /// empty values for every column.
    pub fn join(&self, recipes: &mut [Recipe], sink: &dyn EventSink) {
        for recipe in recipes.iter_mut() {
            match self.rows.get(&recipe.name) {
                Some(values) => recipe.tags = values.clone(),
                None => {
                    if !self.rows.is_empty() {
                        sink.emit(
                            Event::new(Level::Warn, "recipe has no tag row")
                                .with("recipe", recipe.name.clone()),
                        );
                    }
                    recipe.tags = self
                        .columns
                        .iter()
                        .map(|c| (c.clone(), String::new()))
                        .collect();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingSink;

    const TAGS: &str = "Name;herzhaft;Gerichtart;Küche;VeggieFleischart;Notiz
Apfelkuchen;0;Kuchen;deutsch;vegetarisch;lecker
Chili;1;Hauptgericht;mexikanisch;Rind;
";

    fn recipe(name: &str) -> Recipe {
        Recipe {
            name: name.to_string(),
            standard_portions: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_reads_configured_columns_only() {
        let table = TagTable::from_reader(TAGS.as_bytes(), &TagsConfig::default()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.columns().len(), 4);

        let mut recipes = vec![recipe("Chili")];
        table.join(&mut recipes, &RecordingSink::new());
        assert_eq!(recipes[0].tags.get("Küche").map(String::as_str), Some("mexikanisch"));
        assert_eq!(recipes[0].tags.get("herzhaft").map(String::as_str), Some("1"));
        assert!(!recipes[0].tags.contains_key("Notiz"));
    }

    #[test]
    fn test_recipe_without_tags_keeps_empty_values() {
        let table = TagTable::from_reader(TAGS.as_bytes(), &TagsConfig::default()).unwrap();
        let sink = RecordingSink::new();
        let mut recipes = vec![recipe("Apfelkuchen"), recipe("Linsensuppe")];
        table.join(&mut recipes, &sink);

        assert_eq!(recipes[0].tags["Gerichtart"], "Kuchen");
        assert_eq!(recipes[1].tags.len(), 4);
        assert!(recipes[1].tags.values().all(String::is_empty));
        assert_eq!(sink.events().len(), 1);
        assert_eq!(sink.events()[0].get("recipe"), Some("Linsensuppe"));
    }

    #[test]
    fn test_missing_key_column_is_an_error() {
        let result =
            TagTable::from_reader("Titel;herzhaft\nA;1\n".as_bytes(), &TagsConfig::default());
        assert!(matches!(result, Err(ImportError::MissingTagColumn(ref c)) if c == "Name"));
    }

    #[test]
    fn test_missing_passthrough_column_is_empty() {
        let table =
            TagTable::from_reader("Name;herzhaft\nChili;1\n".as_bytes(), &TagsConfig::default())
                .unwrap();
        let mut recipes = vec![recipe("Chili")];
        table.join(&mut recipes, &RecordingSink::new());
        assert_eq!(recipes[0].tags["herzhaft"], "1");
        assert_eq!(recipes[0].tags["Küche"], "");
    }

    #[test]
    fn test_empty_table_joins_silently() {
        let sink = RecordingSink::new();
        let mut recipes = vec![recipe("Chili")];
        TagTable::empty(&TagsConfig::default()).join(&mut recipes, &sink);
        assert_eq!(recipes[0].tags.len(), 4);
        assert!(sink.events().is_empty());
    }
}
