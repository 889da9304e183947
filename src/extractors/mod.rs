use crate::events::EventSink;
use crate::ImportError;

mod ingredients;
mod instructions;
pub mod rows;

pub use self::ingredients::{IngredientExtractor, IngredientListBuilder};
pub use self::instructions::{InstructionExtractor, Instructions};
pub use self::rows::{RowClassifier, RowOutcome};

/// Pulls one part out of a recipe document
pub trait Extractor {
    type Output;

    fn can_parse(&self, text: &str) -> bool;
    fn parse(&self, text: &str, sink: &dyn EventSink) -> Result<Self::Output, ImportError>;
}
