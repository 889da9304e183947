pub mod amount;
pub mod builder;
pub mod config;
pub mod error;
pub mod events;
pub mod extractors;
pub mod model;
pub mod pipelines;
pub mod standardize;
pub mod store;
pub mod tags;

pub use amount::{normalize_amount, AmountNormalizer};
pub use builder::{CookbookImporter, CookbookImporterBuilder};
pub use config::ImportConfig;
pub use error::ImportError;
pub use events::{Event, EventSink, LogSink, RecordingSink};
pub use model::{Cookbook, IngredientRow, Recipe, RecipeDocument};
pub use store::RecipeStore;

/// Parse the cookbook described by `config` without writing anything.
///
/// Classifier events go to the `log` facade.
pub fn parse_cookbook(config: &ImportConfig) -> Result<Cookbook, ImportError> {
    pipelines::read_cookbook(config, &LogSink)
}

/// Parse the cookbook described by `config` and load it into its database.
pub fn import_cookbook(config: ImportConfig) -> Result<Cookbook, ImportError> {
    CookbookImporter::builder()
        .config(config)
        .build()?
        .run(&LogSink)
}
