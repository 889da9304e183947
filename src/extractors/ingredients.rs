use super::rows::{ParsedIngredient, RowClassifier, RowOutcome};
use super::Extractor;
use crate::config::ImportConfig;
use crate::events::{Event, EventSink};
use crate::model::IngredientRow;
use crate::ImportError;
use log::{debug, Level};

/// Accepted rows of one table plus the section they currently land in
#[derive(Debug, Default)]
pub struct IngredientListBuilder {
    rows: Vec<IngredientRow>,
    section: String,
}

impl IngredientListBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_section(&mut self, label: impl Into<String>) {
        self.section = label.into();
    }

    pub fn push(&mut self, parsed: ParsedIngredient) {
        let mut row =
            IngredientRow::new(parsed.name, self.section.clone(), parsed.amount, parsed.unit);
        row.needs_review = parsed.needs_review;
        self.rows.push(row);
    }

    pub fn last_mut(&mut self) -> Option<&mut IngredientRow> {
        self.rows.last_mut()
    }

    /// Appends `text` to the name of the last accepted row. False if there is none yet.
    pub fn extend_last(&mut self, text: &str) -> bool {
        match self.last_mut() {
            Some(row) => {
                row.name.push(' ');
                row.name.push_str(text);
                true
            }
            None => false,
        }
    }

    pub fn finish(self) -> Vec<IngredientRow> {
        self.rows
    }
}

/// Extracts the ingredient table of a recipe document
#[derive(Debug, Clone)]
pub struct IngredientExtractor {
    classifier: RowClassifier,
    table_begin: String,
    table_end: String,
    row_terminator: String,
    row_noise: Vec<String>,
}

impl Default for IngredientExtractor {
    fn default() -> Self {
        Self::new(&ImportConfig::default())
    }
}

impl IngredientExtractor {
    pub fn new(config: &ImportConfig) -> Self {
        Self {
            classifier: RowClassifier::new(&config.markup, &config.vocabulary),
            table_begin: config.markup.table_begin.clone(),
            table_end: config.markup.table_end.clone(),
            row_terminator: config.markup.row_terminator.clone(),
            row_noise: config.markup.row_noise.clone(),
        }
    }

    pub fn with_classifier(mut self, classifier: RowClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Raw table lines between the line holding the begin anchor and the end anchor
    pub fn table_rows(&self, text: &str) -> Option<Vec<String>> {
        let begin = text.find(&self.table_begin)?;
        let body_start = begin + text[begin..].find('\n')? + 1;
        let body_len = text[body_start..].find(&self.table_end)?;
        // drop the backslash of `\end{tabular}`
        let body = text[body_start..body_start + body_len].trim_end_matches('\\');

        Some(body.lines().map(|line| self.clean_row(line)).collect())
    }

    /// Tabs, noise tokens and the row terminator removed
    fn clean_row(&self, line: &str) -> String {
        let mut row = line.replace('\t', "");
        for noise in self.row_noise.iter().filter(|n| !n.is_empty()) {
            row = row.replace(noise.as_str(), "");
        }
        if !self.row_terminator.is_empty() {
            if let Some(end) = row.find(&self.row_terminator) {
                row.truncate(end);
            }
        }
        row.trim().to_string()
    }

    /// Runs the classifier over rows in document order
    pub fn extract_rows<S: AsRef<str>>(
        &self,
        rows: &[S],
        sink: &dyn EventSink,
    ) -> Result<Vec<IngredientRow>, ImportError> {
        let mut builder = IngredientListBuilder::new();

        for raw in rows {
            let raw = raw.as_ref();
            match self.classifier.classify(raw, sink)? {
                RowOutcome::Section(label) => {
                    debug!("Section '{}'", label);
                    builder.set_section(label);
                }
                RowOutcome::Continuation(text) => {
                    if !builder.extend_last(&text) {
                        let message = "continuation row without an ingredient before it";
                        sink.emit(Event::new(Level::Warn, message).with("row", raw));
                    }
                }
                RowOutcome::Ingredient(parsed) => builder.push(parsed),
                RowOutcome::Skip | RowOutcome::Unparseable => {}
            }
        }

        Ok(builder.finish())
    }
}

impl Extractor for IngredientExtractor {
    type Output = Vec<IngredientRow>;

    fn can_parse(&self, text: &str) -> bool {
        self.table_rows(text).is_some()
    }

    fn parse(&self, text: &str, sink: &dyn EventSink) -> Result<Self::Output, ImportError> {
        match self.table_rows(text) {
            Some(rows) => self.extract_rows(&rows, sink),
            None => {
                sink.emit(Event::new(Level::Warn, "no ingredient table found"));
                Ok(Vec::new())
            }
        }
    }
}
