//! Extraction response schema and nutrient normalization

use crate::error::{ClientResult, ExtractionError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Key of the carbohydrate total in `combined`
pub const CARBS_TOTAL: &str = "carbs_total";
/// Key of the protein total in `combined`
pub const PROTEIN_TOTAL: &str = "protein_total";
/// Key of the sodium total in `combined`
pub const SODIUM_TOTAL: &str = "sodium_total";

static AMOUNT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d+(?:\.\d*)?|\.\d+)\s*(.*?)\s*$").expect("valid regex")
});

/// Convert a `<number><optional unit>` string to grams.
///
/// A unit containing `mg` (any case) divides by 1000; anything else, or no
/// unit, is taken as grams.
///
/// # Example
/// ```
/// use nutrivision_client::normalize_to_grams;
///
/// assert_eq!(normalize_to_grams("500mg").unwrap(), 0.5);
/// assert_eq!(normalize_to_grams("12 g").unwrap(), 12.0);
/// assert!(normalize_to_grams("abc").is_err());
/// ```
pub fn normalize_to_grams(raw: &str) -> ClientResult<f64> {
    let caps = AMOUNT_RE
        .captures(raw)
        .ok_or_else(|| ExtractionError::ParseError(raw.to_string()))?;

    let value: f64 = caps[1]
        .parse()
        .map_err(|_| ExtractionError::ParseError(raw.to_string()))?;

    if caps[2].to_ascii_lowercase().contains("mg") {
        Ok(value / 1000.0)
    } else {
        Ok(value)
    }
}

/// One value of the `combined` map as the service sends it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NutrientValue {
    /// Amount with an optional unit suffix, e.g. `"500mg"`
    Text(String),
    /// Bare number, taken as grams
    Number(f64),
}

impl NutrientValue {
    /// The amount in grams. Negative or non-finite numbers are rejected.
    pub fn grams(&self) -> ClientResult<f64> {
        match self {
            Self::Text(raw) => normalize_to_grams(raw),
            Self::Number(value) if value.is_finite() && *value >= 0.0 => Ok(*value),
            Self::Number(value) => Err(ExtractionError::ParseError(value.to_string())),
        }
    }
}

impl fmt::Display for NutrientValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(raw) => f.write_str(raw),
            Self::Number(value) => write!(f, "{value}g"),
        }
    }
}

/// Parsed body of a successful extraction response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Nutrient name to amount
    pub combined: BTreeMap<String, NutrientValue>,
}

impl ExtractionResult {
    /// Parse and validate a response body.
    ///
    /// Anything that is not a JSON object with a `combined` object of string
    /// or number values is a [`ExtractionError::MalformedResponse`].
    pub fn from_slice(body: &[u8]) -> ClientResult<Self> {
        serde_json::from_slice(body).map_err(|e| ExtractionError::MalformedResponse(e.to_string()))
    }

    /// Raw value for `name`.
    pub fn get(&self, name: &str) -> Option<&NutrientValue> {
        self.combined.get(name)
    }

    /// Amount of `name` in grams; `None` when the service did not report it.
    pub fn grams(&self, name: &str) -> Option<ClientResult<f64>> {
        self.get(name).map(NutrientValue::grams)
    }

    /// Carbohydrate, protein and sodium totals in grams.
    ///
    /// Missing totals count as zero.
    pub fn totals(&self) -> ClientResult<NutrientTotals> {
        let grams_or_zero = |name: &str| self.grams(name).unwrap_or(Ok(0.0));
        Ok(NutrientTotals {
            carbs: grams_or_zero(CARBS_TOTAL)?,
            protein: grams_or_zero(PROTEIN_TOTAL)?,
            sodium: grams_or_zero(SODIUM_TOTAL)?,
        })
    }
}

/// Nutrient totals in grams.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NutrientTotals {
    /// Carbohydrates
    pub carbs: f64,
    /// Protein
    pub protein: f64,
    /// Sodium
    pub sodium: f64,
}

impl NutrientTotals {
    /// Sum of all totals.
    pub fn total(&self) -> f64 {
        self.carbs + self.protein + self.sodium
    }

    /// Share of each nutrient in the total.
    pub fn breakdown(&self) -> IntakeBreakdown {
        IntakeBreakdown::from_amounts([
            ("carbs", self.carbs),
            ("protein", self.protein),
            ("sodium", self.sodium),
        ])
    }
}

/// One nutrient's slice of the intake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutrientShare {
    /// Display name
    pub name: String,
    /// Amount in grams
    pub grams: f64,
    /// Percentage of the total, 0-100
    pub percent: f64,
}

/// Total intake and each nutrient's share of it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IntakeBreakdown {
    /// Sum of all shares in grams
    pub total_grams: f64,
    /// Shares in input order
    pub shares: Vec<NutrientShare>,
}

impl IntakeBreakdown {
    /// Build from `(name, grams)` pairs. A zero total gives 0% everywhere.
    pub fn from_amounts<'a>(amounts: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        let amounts: Vec<_> = amounts.into_iter().collect();
        let total_grams: f64 = amounts.iter().map(|(_, grams)| grams).sum();

        let shares = amounts
            .into_iter()
            .map(|(name, grams)| NutrientShare {
                name: name.to_string(),
                grams,
                percent: if total_grams > 0.0 {
                    grams / total_grams * 100.0
                } else {
                    0.0
                },
            })
            .collect();

        Self {
            total_grams,
            shares,
        }
    }

    /// Share for `name`.
    pub fn share(&self, name: &str) -> Option<&NutrientShare> {
        self.shares.iter().find(|s| s.name == name)
    }
}
