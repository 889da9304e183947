use super::document::DocumentParser;
use crate::config::ImportConfig;
use crate::events::EventSink;
use crate::model::{Cookbook, RecipeDocument};
use crate::standardize::standardize_amounts;
use crate::tags::TagTable;
use crate::ImportError;
use log::info;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Document names referenced by the manifest's inclusion directives, in order
pub fn find_recipe_files(manifest: &str, directive: &str) -> Vec<String> {
    manifest
        .lines()
        .map(str::trim_start)
        .filter(|line| line.starts_with(directive))
        .filter_map(|line| {
            let argument = line.rsplit('{').next()?.trim();
            let name = argument.strip_suffix('}').unwrap_or(argument).trim();
            (!name.is_empty()).then(|| name.to_string())
        })
        .collect()
}

fn document_path(root: &Path, name: &str) -> PathBuf {
    if name.ends_with(".tex") {
        root.join(name)
    } else {
        root.join(format!("{name}.tex"))
    }
}

/// Reads the manifest and every document it names, joins tags and
/// standardizes amounts. Any unreadable file aborts the run.
pub fn read_cookbook(
    config: &ImportConfig,
    sink: &dyn EventSink,
) -> Result<Cookbook, ImportError> {
    let root = &config.paths.root;
    let manifest_path = root.join(&config.paths.manifest);
    let manifest = std::fs::read_to_string(&manifest_path)
        .map_err(|e| ImportError::io(&manifest_path, e))?;
    let names = find_recipe_files(&manifest, &config.markup.input_directive);
    info!("Found {} recipe documents in {}", names.len(), manifest_path.display());

    let parser = DocumentParser::new(config);
    let mut documents = Vec::with_capacity(names.len());
    for name in &names {
        let text = parser.load(&document_path(root, name))?;
        let document = parser.parse(&text, name, sink)?;
        info!("Import of {} finished", document.recipe.name);
        documents.push(document);
    }

    let tags = match &config.paths.tags {
        Some(path) => TagTable::from_path(path, &config.tags)?,
        None => TagTable::empty(&config.tags),
    };

    assemble(documents, &tags, sink)
}

/// Assigns ids in document order, joins tags, then rescales amounts per portion
pub fn assemble(
    documents: Vec<RecipeDocument>,
    tags: &TagTable,
    sink: &dyn EventSink,
) -> Result<Cookbook, ImportError> {
    let mut seen = HashSet::new();
    let mut cookbook = Cookbook {
        tag_columns: tags.columns().to_vec(),
        ..Default::default()
    };

    for (index, document) in documents.into_iter().enumerate() {
        let RecipeDocument {
            mut recipe,
            ingredients,
        } = document;
        if !seen.insert(recipe.name.clone()) {
            return Err(ImportError::DuplicateTitle(recipe.name));
        }

        recipe.id = index as i64 + 1;
        for mut ingredient in ingredients {
            ingredient.recipe_id = recipe.id;
            ingredient.id = cookbook.ingredients.len() as i64 + 1;
            cookbook.ingredients.push(ingredient);
        }
        cookbook.recipes.push(recipe);
    }

    tags.join(&mut cookbook.recipes, sink);
    standardize_amounts(&mut cookbook.ingredients, &cookbook.recipes);
    Ok(cookbook)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TagsConfig;
    use crate::events::RecordingSink;
    use crate::model::{IngredientRow, Recipe};

    fn document(name: &str, portions: u32, amounts: &[f64]) -> RecipeDocument {
        RecipeDocument {
            recipe: Recipe {
                name: name.to_string(),
                standard_portions: portions,
                ..Default::default()
            },
            ingredients: amounts
                .iter()
                .map(|&a| IngredientRow::new("Mehl", "", a, "g"))
                .collect(),
        }
    }

    #[test]
    fn test_find_recipe_files() {
        let manifest = "\\documentclass{book}
\\begin{document}
\\input{rezepte/apfelkuchen}
  \\input{rezepte/chili.tex}
% \\input{rezepte/alt}
\\include{vorwort}
\\end{document}
";
        assert_eq!(
            find_recipe_files(manifest, "\\input"),
            vec!["rezepte/apfelkuchen", "rezepte/chili.tex"]
        );
    }

    #[test]
    fn test_document_path_appends_extension_once() {
        let root = Path::new("/kochbuch");
        assert_eq!(document_path(root, "a"), PathBuf::from("/kochbuch/a.tex"));
        assert_eq!(document_path(root, "b.tex"), PathBuf::from("/kochbuch/b.tex"));
    }

    #[test]
    fn test_assemble_assigns_ids_and_standardizes() {
        let documents = vec![
            document("Kuchen", 4, &[8.0, f64::NAN]),
            document("Brot", 1, &[500.0]),
        ];
        let tags = TagTable::empty(&TagsConfig::default());
        let cookbook = assemble(documents, &tags, &RecordingSink::new()).unwrap();

        assert_eq!(cookbook.recipes[0].id, 1);
        assert_eq!(cookbook.recipes[1].id, 2);
        let ids: Vec<(i64, i64)> = cookbook
            .ingredients
            .iter()
            .map(|i| (i.id, i.recipe_id))
            .collect();
        assert_eq!(ids, vec![(1, 1), (2, 1), (3, 2)]);
        assert_eq!(cookbook.ingredients[0].amount, 2.0);
        assert!(cookbook.ingredients[1].amount.is_nan());
        assert_eq!(cookbook.ingredients[2].amount, 500.0);
        assert_eq!(cookbook.tag_columns.len(), 4);
    }

    #[test]
    fn test_duplicate_titles_are_fatal() {
        let documents = vec![document("Brot", 1, &[]), document("Brot", 2, &[])];
        let tags = TagTable::empty(&TagsConfig::default());
        let err = assemble(documents, &tags, &RecordingSink::new()).unwrap_err();
        assert!(matches!(err, ImportError::DuplicateTitle(ref t) if t == "Brot"));
    }
}
