use std::path::PathBuf;

use crate::{
    config::ImportConfig, events::EventSink, pipelines::read_cookbook, store::RecipeStore,
    Cookbook, ImportError,
};

/// Builder for configuring a cookbook import
#[derive(Debug, Default)]
pub struct CookbookImporterBuilder {
    config: Option<ImportConfig>,
    root: Option<PathBuf>,
    manifest: Option<String>,
    tags: Option<PathBuf>,
    database: Option<PathBuf>,
}

impl CookbookImporterBuilder {
    /// Start from a loaded configuration instead of the defaults
    ///
    /// Paths set on the builder still take precedence.
    pub fn config(mut self, config: ImportConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the directory holding the manifest and recipe documents
    ///
    /// # Example
    /// ```
    /// use cookbook_import::CookbookImporter;
    ///
    /// let builder = CookbookImporter::builder().root("/home/me/kochbuch");
    /// ```
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Set the manifest file name, relative to the root
    pub fn manifest(mut self, manifest: impl Into<String>) -> Self {
        self.manifest = Some(manifest.into());
        self
    }

    /// Set the delimited tag table joined onto recipes
    ///
    /// # Example
    /// ```
    /// use cookbook_import::CookbookImporter;
    ///
    /// let builder = CookbookImporter::builder()
    ///     .root("/home/me/kochbuch")
    ///     .tags("/home/me/Rezepte_Tags.csv");
    /// ```
    pub fn tags(mut self, tags: impl Into<PathBuf>) -> Self {
        self.tags = Some(tags.into());
        self
    }

    /// Set the SQLite database file the tables are created in
    pub fn database(mut self, database: impl Into<PathBuf>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Validate the settings and build the importer
    ///
    /// # Errors
    /// Returns `ImportError::BuilderError` if the root is not a directory or
    /// the manifest name is empty.
    pub fn build(self) -> Result<CookbookImporter, ImportError> {
        let mut config = self.config.unwrap_or_default();
        if let Some(root) = self.root {
            config.paths.root = root;
        }
        if let Some(manifest) = self.manifest {
            config.paths.manifest = manifest;
        }
        if let Some(tags) = self.tags {
            config.paths.tags = Some(tags);
        }
        if let Some(database) = self.database {
            config.paths.database = database;
        }

        if !config.paths.root.is_dir() {
            return Err(ImportError::BuilderError(format!(
                "Recipe root {} is not a directory",
                config.paths.root.display()
            )));
        }
        if config.paths.manifest.trim().is_empty() {
            return Err(ImportError::BuilderError(
                "No manifest specified. Use .manifest()".to_string(),
            ));
        }

        Ok(CookbookImporter { config })
    }
}

/// Main entry point for the builder API
#[derive(Debug, Clone)]
pub struct CookbookImporter {
    config: ImportConfig,
}

impl CookbookImporter {
    /// Creates a new builder for importing a cookbook
    ///
    /// # Example
    /// ```
    /// use cookbook_import::CookbookImporter;
    ///
    /// let builder = CookbookImporter::builder();
    /// ```
    pub fn builder() -> CookbookImporterBuilder {
        CookbookImporterBuilder::default()
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// Parse every document and standardize amounts, without touching the store
    pub fn parse(&self, sink: &dyn EventSink) -> Result<Cookbook, ImportError> {
        read_cookbook(&self.config, sink)
    }

    /// Parse, then create and fill both tables in the configured database
    ///
    /// # Errors
    /// Fails without writing anything if parsing fails. Fails with
    /// `ImportError::TableExists` if a target table is already present.
    pub fn run(&self, sink: &dyn EventSink) -> Result<Cookbook, ImportError> {
        let cookbook = self.parse(sink)?;
        let mut store = RecipeStore::open(&self.config.paths.database)?;
        store.load(&cookbook)?;
        Ok(cookbook)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides_config_paths() {
        let dir = tempfile::tempdir().unwrap();
        let importer = CookbookImporter::builder()
            .config(ImportConfig::default())
            .root(dir.path())
            .manifest("index.tex")
            .tags("tags.csv")
            .database("out.sqlite")
            .build()
            .unwrap();

        let paths = &importer.config().paths;
        assert_eq!(paths.root, dir.path());
        assert_eq!(paths.manifest, "index.tex");
        assert_eq!(paths.tags, Some(PathBuf::from("tags.csv")));
        assert_eq!(paths.database, PathBuf::from("out.sqlite"));
    }

    #[test]
    fn test_missing_root_is_rejected() {
        let result = CookbookImporter::builder()
            .root("/definitely/not/a/cookbook")
            .build();
        assert!(matches!(result, Err(ImportError::BuilderError(_))));
    }

    #[test]
    fn test_empty_manifest_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = CookbookImporter::builder()
            .root(dir.path())
            .manifest(" ")
            .build();
        assert!(matches!(result, Err(ImportError::BuilderError(_))));
    }
}
