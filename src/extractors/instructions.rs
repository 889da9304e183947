use super::Extractor;
use crate::config::ImportConfig;
use crate::events::{Event, EventSink};
use crate::ImportError;
use log::Level;
use regex::Regex;

/// Free text of a recipe document
#[derive(Debug, Clone, PartialEq)]
pub struct Instructions {
    pub text: String,
    /// Servings named at the end of the instructions, 1 when none is given
    pub standard_portions: u32,
    pub source: Option<String>,
}

/// Byte range of one instructions block: body start, body end, end of closing marker
#[derive(Debug, Clone, Copy)]
struct Block {
    body_start: usize,
    body_end: usize,
    after: usize,
}

/// Extracts instructions, serving count and source citation
#[derive(Debug, Clone)]
pub struct InstructionExtractor {
    begin: String,
    end: String,
    page_break: String,
    unit_separator: String,
    line_break: String,
    portion_pattern: Option<Regex>,
    portion_tail_chars: usize,
    source_strip_tokens: Vec<String>,
    source_min_length: usize,
}

impl Default for InstructionExtractor {
    fn default() -> Self {
        Self::new(&ImportConfig::default())
    }
}

impl InstructionExtractor {
    pub fn new(config: &ImportConfig) -> Self {
        Self {
            begin: config.markup.instructions_begin.clone(),
            end: config.markup.instructions_end.clone(),
            page_break: config.markup.page_break.clone(),
            unit_separator: config.markup.unit_separator.clone(),
            line_break: config.markup.line_break.clone(),
            portion_pattern: portion_pattern(&config.vocabulary.portion_words),
            portion_tail_chars: config.vocabulary.portion_tail_chars,
            source_strip_tokens: config.source.strip_tokens.clone(),
            source_min_length: config.source.min_length,
        }
    }

    /// The body starts on the line after the begin anchor, which carries the size arguments
    fn block_at(&self, text: &str, from: usize) -> Option<Block> {
        let begin = from + text[from..].find(&self.begin)?;
        let body_start = begin + text[begin..].find('\n')? + 1;
        let body_end = body_start + text[body_start..].find(&self.end)?;
        Some(Block {
            body_start,
            body_end,
            after: body_end + self.end.len(),
        })
    }

    fn blocks(&self, text: &str) -> Vec<Block> {
        let Some(first) = self.block_at(text, 0) else {
            return Vec::new();
        };
        let overflows = !self.page_break.is_empty() && text.contains(&self.page_break);
        match self.block_at(text, first.after).filter(|_| overflows) {
            Some(second) => vec![first, second],
            None => vec![first],
        }
    }

    fn clean(&self, body: &str) -> String {
        let mut text = body.to_string();
        if !self.unit_separator.is_empty() {
            text = text.replace(&self.unit_separator, " ");
        }
        if !self.line_break.is_empty() {
            text = text.replace(&self.line_break, "\n");
        }
        text.trim().to_string()
    }

    /// Finds "<number> <portion word>" near the end of the text. Returns the
    /// start of the line holding it and the digits of the number.
    fn find_portions<'t>(&self, text: &'t str) -> Option<(usize, &'t str)> {
        let pattern = self.portion_pattern.as_ref()?;

        let char_count = text.chars().count();
        let tail_start = text
            .char_indices()
            .nth(char_count.saturating_sub(self.portion_tail_chars))
            .map_or(text.len(), |(i, _)| i);

        let captures = pattern.captures(&text[tail_start..])?;
        let count = captures.get(1)?;

        // the search window may begin in the middle of the number
        let count_end = tail_start + count.end();
        let count_start = text[..tail_start + count.start()]
            .trim_end_matches(|c: char| c.is_ascii_digit())
            .len();
        let line_start = text[..count_start].rfind('\n').map_or(0, |i| i + 1);
        Some((line_start, &text[count_start..count_end]))
    }

    /// Cuts the serving-count line off the instructions and returns the count.
    /// A count too large for `u32` leaves the text untouched.
    pub fn split_portions(&self, text: &str) -> (String, Option<u32>) {
        let Some((line_start, digits)) = self.find_portions(text) else {
            return (text.to_string(), None);
        };
        match digits.parse::<u32>() {
            Ok(count) => (text[..line_start].trim_end().to_string(), Some(count)),
            Err(_) => (text.to_string(), None),
        }
    }

    /// Text after the last instructions block, formatting removed
    pub fn source(&self, trailing: &str) -> Option<String> {
        let mut text = trailing.to_string();
        for token in self.source_strip_tokens.iter().filter(|t| !t.is_empty()) {
            text = text.replace(token.as_str(), "");
        }
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        (text.chars().count() > self.source_min_length).then_some(text)
    }
}

fn portion_pattern(words: &[String]) -> Option<Regex> {
    if words.is_empty() {
        return None;
    }
    let alternatives = words
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)(\d+)\s*(?:{alternatives})")).ok()
}

impl Extractor for InstructionExtractor {
    type Output = Instructions;

    fn can_parse(&self, text: &str) -> bool {
        self.block_at(text, 0).is_some()
    }

    fn parse(&self, text: &str, sink: &dyn EventSink) -> Result<Self::Output, ImportError> {
        let blocks = self.blocks(text);
        let Some(last) = blocks.last() else {
            sink.emit(Event::new(Level::Warn, "no instructions block found"));
            return Ok(Instructions {
                text: String::new(),
                standard_portions: 1,
                source: None,
            });
        };

        let joined = blocks
            .iter()
            .map(|b| self.clean(&text[b.body_start..b.body_end]))
            .collect::<Vec<_>>()
            .join("\n");

        let (instructions, portions) = self.split_portions(&joined);
        let standard_portions = match portions {
            Some(0) => {
                sink.emit(Event::new(Level::Warn, "serving count of 0, using 1"));
                1
            }
            Some(n) => n,
            None => {
                if let Some((_, digits)) = self.find_portions(&joined) {
                    sink.emit(
                        Event::new(Level::Warn, "serving count out of range, using 1")
                            .with("count", digits),
                    );
                }
                1
            }
        };

        Ok(Instructions {
            text: instructions,
            standard_portions,
            source: self.source(&text[last.after..]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingSink;

    const DOCUMENT: &str = "\\recipe{Pfannkuchen}
\\begin{minipage}[t]{0.6\\textwidth}
Mehl, Milch und Eier verrühren.\\\\
In der Pfanne bei 200\\,°C ausbacken.\\\\
Ergibt 12 Portionen
\\end{minipage}
\\vfill
\\small{Quelle: Omas Kochbuch}
\\end{document}
";

    fn parse(text: &str) -> Instructions {
        InstructionExtractor::default()
            .parse(text, &RecordingSink::new())
            .unwrap()
    }

    #[test]
    fn test_single_block() {
        let parsed = parse(DOCUMENT);
        assert_eq!(
            parsed.text,
            "Mehl, Milch und Eier verrühren.\n\nIn der Pfanne bei 200 °C ausbacken."
        );
        assert_eq!(parsed.source.as_deref(), Some("Omas Kochbuch"));
    }

    #[test]
    fn test_multi_digit_serving_count_is_kept_whole() {
        assert_eq!(parse(DOCUMENT).standard_portions, 12);
    }

    #[test]
    fn test_serving_count_defaults_to_one() {
        let text = "\\begin{minipage}{\\textwidth}\nAlles mischen.\n\\end{minipage}\n";
        let parsed = parse(text);
        assert_eq!(parsed.standard_portions, 1);
        assert_eq!(parsed.text, "Alles mischen.");
        assert_eq!(parsed.source, None);
    }

    #[test]
    fn test_serving_count_is_case_insensitive() {
        let extractor = InstructionExtractor::default();
        let (text, portions) = extractor.split_portions("Backen.\nFür 4 PERSONEN");
        assert_eq!(portions, Some(4));
        assert_eq!(text, "Backen.");
    }

    #[test]
    fn test_serving_count_outside_tail_is_ignored() {
        let long = format!("Für 4 Personen vorbereiten.\n{}", "Rühren. ".repeat(20));
        let (text, portions) = InstructionExtractor::default().split_portions(&long);
        assert_eq!(portions, None);
        assert_eq!(text, long);
    }

    #[test]
    fn test_serving_count_cut_by_search_window_is_read_whole() {
        // 85 characters, the last 80 start on the "2" of "12"
        let text = format!("Für 12 Portionen\n{}Ende", "Rühren. ".repeat(8));
        assert_eq!(text.chars().count(), 85);

        let (rest, portions) = InstructionExtractor::default().split_portions(&text);
        assert_eq!(portions, Some(12));
        assert_eq!(rest, "");
    }

    #[test]
    fn test_oversized_serving_count_warns_and_keeps_text() {
        let text = "\\begin{minipage}{\\textwidth}
Backen.\\\\
999999999999 Portionen
\\end{minipage}
";
        let sink = RecordingSink::new();
        let parsed = InstructionExtractor::default().parse(text, &sink).unwrap();

        assert_eq!(parsed.standard_portions, 1);
        assert_eq!(parsed.text, "Backen.\n\n999999999999 Portionen");
        let warnings = sink.at_level(Level::Warn);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].get("count"), Some("999999999999"));
    }

    #[test]
    fn test_two_fragments_are_joined_when_page_breaks() {
        let text = "\\begin{minipage}{\\textwidth}
Teig kneten.
\\end{minipage}
\\newpage
\\begin{minipage}{\\textwidth}
Backen.\\\\
4 Portionen
\\end{minipage}
Quelle: chefkoch.de
";
        let parsed = parse(text);
        assert_eq!(parsed.text, "Teig kneten.\nBacken.");
        assert_eq!(parsed.standard_portions, 4);
        assert_eq!(parsed.source.as_deref(), Some("chefkoch.de"));
    }

    #[test]
    fn test_second_block_without_page_break_is_not_instructions() {
        let text = "\\begin{minipage}{\\textwidth}
Teig kneten.
\\end{minipage}
\\begin{minipage}{\\textwidth}
Foto
\\end{minipage}
";
        assert_eq!(parse(text).text, "Teig kneten.");
    }

    #[test]
    fn test_short_source_is_absent() {
        let extractor = InstructionExtractor::default();
        assert_eq!(extractor.source("\\vfill \\small{abc}"), None);
        assert_eq!(extractor.source("\\vfill \\small{abcd}").as_deref(), Some("abcd"));
    }

    #[test]
    fn test_missing_block_warns() {
        let sink = RecordingSink::new();
        let parsed = InstructionExtractor::default()
            .parse("\\recipe{Nichts}", &sink)
            .unwrap();
        assert_eq!(parsed.text, "");
        assert_eq!(parsed.standard_portions, 1);
        assert_eq!(sink.at_level(Level::Warn).len(), 1);
    }
}
