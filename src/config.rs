use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main import configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ImportConfig {
    /// Where documents, tag table and store live
    pub paths: PathsConfig,
    /// Markup anchors and tokens of the recipe documents
    pub markup: MarkupConfig,
    /// Locale-specific words used by the row classifier
    pub vocabulary: VocabularyConfig,
    /// Source citation cleanup
    pub source: SourceConfig,
    /// External tag table layout
    pub tags: TagsConfig,
}

/// File locations
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory containing the manifest and the recipe documents
    pub root: PathBuf,
    /// Manifest file name, relative to `root`
    pub manifest: String,
    /// Delimited tag table joined by recipe title
    pub tags: Option<PathBuf>,
    /// SQLite database file
    pub database: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            manifest: "uebersicht.tex".to_string(),
            tags: None,
            database: PathBuf::from("cookbook.sqlite"),
        }
    }
}

/// One literal text replacement applied to every document on load
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Replacement {
    pub from: String,
    pub to: String,
}

impl Replacement {
    fn new(from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

/// Markup anchors of the recipe documents
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MarkupConfig {
    /// Line prefix of a manifest inclusion directive
    pub input_directive: String,
    pub table_begin: String,
    pub table_end: String,
    pub column_delimiter: String,
    pub row_terminator: String,
    /// Token between a quantity and its unit inside one column
    pub unit_separator: String,
    pub approx_marker: String,
    pub line_break: String,
    pub instructions_begin: String,
    pub instructions_end: String,
    /// Presence of this token means the instructions overflow into a second block
    pub page_break: String,
    /// Tokens removed from table rows before classification
    pub row_noise: Vec<String>,
    pub replacements: Vec<Replacement>,
}

impl Default for MarkupConfig {
    fn default() -> Self {
        Self {
            input_directive: "\\input".to_string(),
            table_begin: "begin{tabular}{l".to_string(),
            table_end: "end{tabular}".to_string(),
            column_delimiter: "&".to_string(),
            row_terminator: "\\\\".to_string(),
            unit_separator: "\\,".to_string(),
            approx_marker: "$\\sim$".to_string(),
            line_break: "\\\\".to_string(),
            instructions_begin: "\\begin{minipage}".to_string(),
            instructions_end: "\\end{minipage}".to_string(),
            page_break: "\\newpage".to_string(),
            row_noise: strings(&["\\hline", "\\toprule", "\\midrule", "\\bottomrule"]),
            replacements: vec![
                Replacement::new("\\textonehalf", "0.5"),
                Replacement::new("\\textonequarter", "0.25"),
                Replacement::new("Hand voll", "Handvoll"),
                Replacement::new("\\textcelsius", "°C"),
                Replacement::new("\\&", "und"),
            ],
        }
    }
}

/// Locale tokens of the row classifier and the portion detector
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct VocabularyConfig {
    /// Measurement words that may start the name column
    pub unit_keywords: Vec<String>,
    /// Name prefix that marks an alternative to the previous ingredient
    pub continuation_keyword: String,
    /// Bare name cells that belong to the previous ingredient
    pub continuation_phrases: Vec<String>,
    /// Amount words that mean "unspecified"
    pub qualitative_markers: Vec<String>,
    /// Keyword of a row that opens a new table section
    pub section_keyword: String,
    /// Footnote commands stripped from the end of the name column
    pub footnote_markers: Vec<String>,
    /// Words following the serving count in the instructions
    pub portion_words: Vec<String>,
    /// How many trailing characters of the instructions are searched for the serving count
    pub portion_tail_chars: usize,
}

impl Default for VocabularyConfig {
    fn default() -> Self {
        Self {
            unit_keywords: strings(&[
                "Tasse", "Tassen", "ml", "l", "g", "kg", "TL", "EL", "Dose", "Dosen", "Prise",
                "Prisen", "Stück", "Schuss", "Handvoll", "Würfel", "Bund", "Zweig", "Zweige",
                "Packung", "Päckchen", "Pck.",
            ]),
            continuation_keyword: "oder ".to_string(),
            continuation_phrases: strings(&[
                "nach Belieben",
                "nach Geschmack",
                "zum Bestreuen",
                "zum Garnieren",
            ]),
            qualitative_markers: strings(&["etwas", "wenig", "einige", "viel", "n.B."]),
            section_keyword: "multicolumn".to_string(),
            footnote_markers: strings(&["\\footnote", "\\textsuperscript", "$^"]),
            portion_words: strings(&["Portion", "Person"]),
            portion_tail_chars: 80,
        }
    }
}

/// Cleanup of the free text following the instructions
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SourceConfig {
    pub strip_tokens: Vec<String>,
    /// Citations of this many characters or fewer count as absent
    pub min_length: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            strip_tokens: strings(&[
                "\\end{document}",
                "\\vfill",
                "\\small",
                "\\footnotesize",
                "\\textit",
                "\\emph",
                "\\newpage",
                "Quelle:",
                "\\\\",
                "{",
                "}",
            ]),
            min_length: 3,
        }
    }
}

/// Layout of the delimited tag table
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TagsConfig {
    pub delimiter: char,
    /// Column holding the recipe title
    pub key_column: String,
    /// Columns copied verbatim onto the recipes table
    pub columns: Vec<String>,
}

impl Default for TagsConfig {
    fn default() -> Self {
        Self {
            delimiter: ';',
            key_column: "Name".to_string(),
            columns: strings(&["herzhaft", "Gerichtart", "Küche", "VeggieFleischart"]),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl ImportConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with COOKBOOK__ prefix
    /// 2. The given file, or cookbook.toml in the current directory
    /// 3. Default values
    ///
    /// Environment variable format: COOKBOOK__PATHS__DATABASE
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        load_config(path)
    }
}

/// Load configuration from file and environment variables
///
/// An explicitly named file must exist, the implicit `cookbook.toml` may be missing.
pub fn load_config(path: Option<&Path>) -> Result<ImportConfig, ConfigError> {
    let file = match path {
        Some(path) => File::from(path).required(true),
        None => File::with_name("cookbook").required(false),
    };

    let settings = Config::builder()
        .add_source(file)
        // Use double underscore for nested: COOKBOOK__PATHS__ROOT
        .add_source(
            Environment::with_prefix("COOKBOOK")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_values() {
        let config = ImportConfig::default();
        assert_eq!(config.paths.manifest, "uebersicht.tex");
        assert_eq!(config.markup.column_delimiter, "&");
        assert_eq!(config.markup.unit_separator, "\\,");
        assert_eq!(config.vocabulary.continuation_keyword, "oder ");
        assert_eq!(config.source.min_length, 3);
        assert_eq!(config.tags.delimiter, ';');
        assert_eq!(config.tags.columns.len(), 4);
    }

    #[test]
    fn test_default_replacements_keep_order() {
        let config = MarkupConfig::default();
        assert_eq!(
            config.replacements.first(),
            Some(&Replacement::new("\\textonehalf", "0.5"))
        );
        assert_eq!(
            config.replacements.last(),
            Some(&Replacement::new("\\&", "und"))
        );
    }

    #[test]
    fn test_load_config_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[paths]
root = "/srv/kochbuch"
database = "rezepte.sqlite"

[vocabulary]
unit_keywords = ["cup", "tbsp"]
continuation_keyword = "or "
"#
        )
        .unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.paths.root, PathBuf::from("/srv/kochbuch"));
        assert_eq!(config.paths.database, PathBuf::from("rezepte.sqlite"));
        assert_eq!(config.vocabulary.unit_keywords, vec!["cup", "tbsp"]);
        assert_eq!(config.vocabulary.continuation_keyword, "or ");
        // untouched sections keep their defaults
        assert_eq!(config.paths.manifest, "uebersicht.tex");
        assert_eq!(config.markup.table_end, "end{tabular}");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = load_config(Some(Path::new("/definitely/not/here.toml")));
        assert!(result.is_err());
    }
}
