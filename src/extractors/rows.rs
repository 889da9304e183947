//! Classification of a single ingredient-table row.
//!
//! A row is matched against an ordered list of [`Rule`]s. The first rule
//! whose predicate accepts the row decides the outcome; later rules never
//! see it. Predicates only look at the row, so classifying the same rows
//! again always gives the same outcomes.

use crate::amount::AmountNormalizer;
use crate::config::{MarkupConfig, VocabularyConfig};
use crate::events::{Event, EventSink};
use crate::ImportError;
use log::Level;

/// A table row split into its columns
#[derive(Debug, Clone)]
pub struct Row<'a> {
    pub raw: &'a str,
    /// Text before the first column delimiter, trimmed
    pub amount: &'a str,
    /// Text after the last column delimiter, footnotes removed, trimmed
    pub name: String,
    /// The row had no column delimiter at all
    pub single_column: bool,
}

/// What a row contributes to the ingredient list
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    /// Following rows belong to this section
    Section(String),
    /// Extends the name of the previously accepted ingredient
    Continuation(String),
    Ingredient(ParsedIngredient),
    /// Nothing to record (empty name column)
    Skip,
    /// No rule matched, the row is dropped with a warning
    Unparseable,
}

#[derive(Debug, Clone)]
pub struct ParsedIngredient {
    pub name: String,
    pub amount: f64,
    pub unit: String,
    pub needs_review: bool,
}

impl PartialEq for ParsedIngredient {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.unit == other.unit
            && self.needs_review == other.needs_review
            && ((self.amount.is_nan() && other.amount.is_nan()) || self.amount == other.amount)
    }
}

impl ParsedIngredient {
    fn new(name: impl Into<String>, amount: f64, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            amount,
            unit: unit.into(),
            needs_review: false,
        }
    }

    fn unspecified(name: impl Into<String>) -> Self {
        Self::new(name, f64::NAN, "")
    }
}

type Predicate = fn(&RowClassifier, &Row) -> bool;
type Handler = fn(&RowClassifier, &Row, &dyn EventSink) -> Result<RowOutcome, ImportError>;

/// One predicate/handler pair of the classification cascade
#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    matches: Predicate,
    apply: Handler,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).finish()
    }
}

/// Rules in precedence order
pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule {
            name: "section",
            matches: |c, row| {
                !c.vocabulary.section_keyword.is_empty()
                    && row.raw.contains(&c.vocabulary.section_keyword)
            },
            apply: |_, row, _| Ok(RowOutcome::Section(section_label(row.raw))),
        },
        Rule {
            name: "empty_name",
            matches: |_, row| row.name.is_empty(),
            apply: |_, _, _| Ok(RowOutcome::Skip),
        },
        Rule {
            name: "continuation_keyword",
            matches: |c, row| {
                !c.vocabulary.continuation_keyword.is_empty()
                    && row.name.starts_with(&c.vocabulary.continuation_keyword)
            },
            apply: continuation,
        },
        Rule {
            name: "parenthesized",
            matches: |_, row| {
                row.amount.is_empty() && row.name.starts_with('(') && row.name.ends_with(')')
            },
            apply: continuation,
        },
        Rule {
            name: "continuation_phrase",
            matches: |c, row| c.vocabulary.continuation_phrases.contains(&row.name),
            apply: continuation,
        },
        Rule {
            name: "single_column",
            // `Salz` or `Salz & Salz`: nothing but the name
            matches: |_, row| row.single_column || row.amount == row.name,
            apply: unspecified_amount,
        },
        Rule {
            name: "blank_amount",
            matches: |_, row| row.amount.is_empty(),
            apply: unspecified_amount,
        },
        Rule {
            name: "qualitative_amount",
            matches: |c, row| {
                c.vocabulary
                    .qualitative_markers
                    .iter()
                    .any(|marker| row.amount.contains(marker.as_str()))
            },
            apply: unspecified_amount,
        },
        Rule {
            name: "unit_separator",
            matches: |c, row| {
                !c.unit_separator.is_empty() && row.amount.contains(&c.unit_separator)
            },
            apply: |c, row, _| {
                let (quantity, unit) = row
                    .amount
                    .split_once(c.unit_separator.as_str())
                    .unwrap_or((row.amount, ""));
                let amount = c.normalizer.normalize(quantity)?;
                Ok(RowOutcome::Ingredient(ParsedIngredient::new(
                    row.name.clone(),
                    amount,
                    unit.trim(),
                )))
            },
        },
        Rule {
            name: "amount_with_words",
            matches: |c, row| !c.normalizer.is_number(row.amount),
            apply: amount_with_words,
        },
        Rule {
            name: "plain_amount",
            matches: |c, row| c.leading_unit(&row.name).is_none(),
            apply: |c, row, _| {
                let amount = c.normalizer.normalize(row.amount)?;
                Ok(RowOutcome::Ingredient(ParsedIngredient::new(
                    row.name.clone(),
                    amount,
                    "",
                )))
            },
        },
        Rule {
            name: "unit_in_name",
            matches: |c, row| c.leading_unit(&row.name).is_some(),
            apply: |c, row, _| {
                let amount = c.normalizer.normalize(row.amount)?;
                let (unit, rest) = c.leading_unit(&row.name).unwrap_or((row.name.as_str(), ""));
                // `1 & Prise`: the unit word is also the name
                let name = if rest.is_empty() { unit } else { rest };
                Ok(RowOutcome::Ingredient(ParsedIngredient::new(name, amount, unit)))
            },
        },
    ]
}

fn continuation(
    _: &RowClassifier,
    row: &Row,
    _: &dyn EventSink,
) -> Result<RowOutcome, ImportError> {
    Ok(RowOutcome::Continuation(row.name.clone()))
}

fn unspecified_amount(
    _: &RowClassifier,
    row: &Row,
    _: &dyn EventSink,
) -> Result<RowOutcome, ImportError> {
    Ok(RowOutcome::Ingredient(ParsedIngredient::unspecified(
        row.name.clone(),
    )))
}

/// Amount column holds words as well as (maybe) a number, e.g. `2 große`, `2-3`, `Prise`
fn amount_with_words(
    c: &RowClassifier,
    row: &Row,
    sink: &dyn EventSink,
) -> Result<RowOutcome, ImportError> {
    let tokens: Vec<&str> = row.amount.split_whitespace().collect();
    let words = |tokens: &[&str]| {
        tokens
            .iter()
            .filter(|t| !c.normalizer.is_number(t))
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    };

    if let Some(first) = tokens.first().filter(|t| c.normalizer.is_number(t)) {
        let amount = c.normalizer.normalize(first)?;
        return Ok(RowOutcome::Ingredient(ParsedIngredient::new(
            row.name.clone(),
            amount,
            words(&tokens[1..]),
        )));
    }

    if row.amount.contains(['-', '–']) {
        let amount = c.normalizer.normalize(row.amount)?;
        return Ok(RowOutcome::Ingredient(ParsedIngredient::new(
            row.name.clone(),
            amount,
            "",
        )));
    }

    sink.emit(
        Event::new(Level::Info, "no number in amount column, assuming 1")
            .with("row", row.raw)
            .with("ingredient", row.name.clone()),
    );
    let mut ingredient = ParsedIngredient::new(row.name.clone(), 1.0, words(&tokens));
    ingredient.needs_review = true;
    Ok(RowOutcome::Ingredient(ingredient))
}

/// Text of the last `{...}` group, e.g. `\multicolumn{2}{l}{\textbf{Teig}}` gives `Teig`
fn section_label(raw: &str) -> String {
    match raw.rfind('{') {
        Some(open) => {
            let inner = &raw[open + 1..];
            inner[..inner.find('}').unwrap_or(inner.len())].trim().to_string()
        }
        None => raw.trim().to_string(),
    }
}

/// Decides the shape of single table rows
#[derive(Debug, Clone)]
pub struct RowClassifier {
    vocabulary: VocabularyConfig,
    column_delimiter: String,
    unit_separator: String,
    normalizer: AmountNormalizer,
    rules: Vec<Rule>,
}

impl Default for RowClassifier {
    fn default() -> Self {
        Self::new(&MarkupConfig::default(), &VocabularyConfig::default())
    }
}

impl RowClassifier {
    pub fn new(markup: &MarkupConfig, vocabulary: &VocabularyConfig) -> Self {
        Self {
            vocabulary: vocabulary.clone(),
            column_delimiter: markup.column_delimiter.clone(),
            unit_separator: markup.unit_separator.clone(),
            normalizer: AmountNormalizer::from_markup(markup),
            rules: default_rules(),
        }
    }

    /// Replace the rule cascade, e.g. to drop or reorder rules for another corpus
    pub fn with_rules(mut self, rules: Vec<Rule>) -> Self {
        self.rules = rules;
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Split a cleaned row into amount and name columns
    pub fn split<'a>(&self, raw: &'a str) -> Row<'a> {
        let delimiter = self.column_delimiter.as_str();
        let (amount, name, single_column) = match (raw.find(delimiter), raw.rfind(delimiter)) {
            (Some(first), Some(last)) => (&raw[..first], &raw[last + delimiter.len()..], false),
            _ => (raw, raw, true),
        };

        Row {
            raw,
            amount: amount.trim(),
            name: self.strip_footnote(name).trim().to_string(),
            single_column,
        }
    }

    fn strip_footnote<'a>(&self, name: &'a str) -> &'a str {
        let cut = self
            .vocabulary
            .footnote_markers
            .iter()
            .filter(|marker| !marker.is_empty())
            .filter_map(|marker| name.find(marker.as_str()))
            .min();
        match cut {
            Some(at) => &name[..at],
            None => name,
        }
    }

    /// The first word of `name` if it is a unit keyword, with the remaining words
    fn leading_unit<'a>(&self, name: &'a str) -> Option<(&'a str, &'a str)> {
        let (first, rest) = name.split_once(char::is_whitespace).unwrap_or((name, ""));
        self.vocabulary
            .unit_keywords
            .iter()
            .any(|unit| unit == first)
            .then(|| (first, rest.trim()))
    }

    pub fn classify(&self, raw: &str, sink: &dyn EventSink) -> Result<RowOutcome, ImportError> {
        let row = self.split(raw);

        for rule in &self.rules {
            if (rule.matches)(self, &row) {
                return (rule.apply)(self, &row, sink);
            }
        }

        sink.emit(Event::new(Level::Warn, "row matches no rule, dropped").with("row", raw));
        Ok(RowOutcome::Unparseable)
    }
}
