use crate::config::MarkupConfig;
use crate::ImportError;

const RANGE_DASHES: [char; 2] = ['-', '–'];

/// Turns the text of an amount cell into a number.
///
/// Handles decimal commas, `a/b` fractions and `a-b` ranges (mean of the
/// endpoints). An empty token is NaN, meaning "unspecified". A token that
/// looks numeric but does not parse is a hard error: it means the document
/// uses a shape the rules do not know yet.
#[derive(Debug, Clone)]
pub struct AmountNormalizer {
    approx_marker: String,
    unit_separator: String,
}

impl Default for AmountNormalizer {
    fn default() -> Self {
        Self::from_markup(&MarkupConfig::default())
    }
}

impl AmountNormalizer {
    pub fn from_markup(markup: &MarkupConfig) -> Self {
        Self {
            approx_marker: markup.approx_marker.clone(),
            unit_separator: markup.unit_separator.clone(),
        }
    }

    /// Cuts at the unit separator before touching commas, since the
    /// separator itself contains one.
    fn numeric_part(&self, raw: &str) -> String {
        let without_approx = if self.approx_marker.is_empty() {
            raw.to_string()
        } else {
            raw.replace(&self.approx_marker, "")
        };
        let head = if self.unit_separator.is_empty() {
            without_approx.as_str()
        } else {
            without_approx
                .split(self.unit_separator.as_str())
                .next()
                .unwrap_or_default()
        };
        head.replace(',', ".").trim().to_string()
    }

    pub fn normalize(&self, raw: &str) -> Result<f64, ImportError> {
        let token = self.numeric_part(raw);
        let invalid = || ImportError::InvalidAmount {
            raw: raw.to_string(),
        };

        if token.is_empty() {
            return Ok(f64::NAN);
        }

        if let Some((numerator, denominator)) = token.split_once('/') {
            let numerator = parse_float(numerator).ok_or_else(invalid)?;
            let denominator = parse_float(denominator)
                .filter(|d| *d != 0.0)
                .ok_or_else(invalid)?;
            return finite(numerator / denominator).ok_or_else(invalid);
        }

        if token.contains(RANGE_DASHES) {
            let endpoints = token
                .split(RANGE_DASHES)
                .map(parse_float)
                .collect::<Option<Vec<f64>>>()
                .ok_or_else(invalid)?;
            let mean = endpoints.iter().sum::<f64>() / endpoints.len() as f64;
            return finite(mean).ok_or_else(invalid);
        }

        let value = parse_float(&token).ok_or_else(invalid)?;
        // `NaN` spelled out is the unspecified sentinel, infinities are not amounts
        if value.is_infinite() {
            return Err(invalid());
        }
        Ok(value)
    }

    /// Whether the whole token is a single number or fraction (not a range)
    pub fn is_number(&self, raw: &str) -> bool {
        let token = raw.replace(&self.approx_marker, "").replace(',', ".");
        let token = token.trim();
        match token.split_once('/') {
            Some((numerator, denominator)) => {
                parse_float(numerator).is_some() && parse_float(denominator).is_some()
            }
            None => parse_float(token).is_some(),
        }
    }
}

fn parse_float(token: &str) -> Option<f64> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    token.parse::<f64>().ok()
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Normalizes an amount token using the default markup tokens
pub fn normalize_amount(raw: &str) -> Result<f64, ImportError> {
    AmountNormalizer::default().normalize(raw)
}
