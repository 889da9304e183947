use crate::config::{ImportConfig, Replacement};
use crate::events::{EventSink, Scoped};
use crate::extractors::{Extractor, IngredientExtractor, InstructionExtractor};
use crate::model::{Recipe, RecipeDocument};
use crate::ImportError;
use log::debug;
use std::path::Path;

/// Applies every replacement pair in order
pub fn apply_replacements(text: &str, replacements: &[Replacement]) -> String {
    replacements
        .iter()
        .filter(|r| !r.from.is_empty())
        .fold(text.to_string(), |acc, r| acc.replace(&r.from, &r.to))
}

/// Argument of the first command in the document, e.g. `\recipe{Apfelkuchen}`
pub fn extract_title(text: &str) -> Option<String> {
    let head = &text[..text.find('}')?];
    let title = head.rsplit('{').next().unwrap_or(head).trim();
    (!title.is_empty()).then(|| title.to_string())
}

/// Turns one recipe document into a recipe and its ingredient rows
#[derive(Debug, Clone)]
pub struct DocumentParser {
    replacements: Vec<Replacement>,
    ingredients: IngredientExtractor,
    instructions: InstructionExtractor,
}

impl Default for DocumentParser {
    fn default() -> Self {
        Self::new(&ImportConfig::default())
    }
}

impl DocumentParser {
    pub fn new(config: &ImportConfig) -> Self {
        Self {
            replacements: config.markup.replacements.clone(),
            ingredients: IngredientExtractor::new(config),
            instructions: InstructionExtractor::new(config),
        }
    }

    /// Reads a document and applies the configured replacements
    pub fn load(&self, path: &Path) -> Result<String, ImportError> {
        let text = std::fs::read_to_string(path).map_err(|e| ImportError::io(path, e))?;
        Ok(apply_replacements(&text, &self.replacements))
    }

    /// `origin` names the document in errors, usually its file name
    pub fn parse(
        &self,
        text: &str,
        origin: &str,
        sink: &dyn EventSink,
    ) -> Result<RecipeDocument, ImportError> {
        let title =
            extract_title(text).ok_or_else(|| ImportError::MissingTitle(origin.to_string()))?;
        let sink = Scoped::new(sink, "recipe", title.clone());

        let ingredients = self.ingredients.parse(text, &sink)?;
        let instructions = self.instructions.parse(text, &sink)?;
        debug!(
            "{}: {} ingredients, {} portions",
            title,
            ingredients.len(),
            instructions.standard_portions
        );

        Ok(RecipeDocument {
            recipe: Recipe {
                id: 0,
                name: title,
                standard_portions: instructions.standard_portions,
                source: instructions.source,
                instructions: instructions.text,
                tags: Default::default(),
            },
            ingredients,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingSink;

    #[test]
    fn test_replacements_apply_in_order() {
        let replacements = vec![
            Replacement {
                from: "\\textonehalf".to_string(),
                to: "0.5".to_string(),
            },
            Replacement {
                from: "Hand voll".to_string(),
                to: "Handvoll".to_string(),
            },
        ];
        assert_eq!(
            apply_replacements("\\textonehalf & Hand voll Nüsse", &replacements),
            "0.5 & Handvoll Nüsse"
        );
    }

    #[test]
    fn test_extract_title() {
        assert_eq!(
            extract_title("\\recipe{Apfelkuchen}\n\\begin{tabular}{ll}").as_deref(),
            Some("Apfelkuchen")
        );
        assert_eq!(extract_title("kein Titel"), None);
        assert_eq!(extract_title("\\recipe{ }"), None);
    }

    #[test]
    fn test_parse_without_title_fails() {
        let err = DocumentParser::default()
            .parse("nur Text", "leer.tex", &RecordingSink::new())
            .unwrap_err();
        assert!(matches!(err, ImportError::MissingTitle(ref o) if o == "leer.tex"));
    }

    #[test]
    fn test_events_carry_the_recipe_title() {
        let sink = RecordingSink::new();
        DocumentParser::default()
            .parse("\\recipe{Toast}", "toast", &sink)
            .unwrap();

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.get("recipe") == Some("Toast")));
    }
}
