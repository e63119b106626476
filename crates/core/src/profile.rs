//! Biometric profile inputs
//!
//! Age, weight and height as the user types them, with the parsing and unit
//! rules of the intake form:
//! - Age accepts digits only (up to three), and never goes below 18
//! - Weight is a decimal number in kilograms or pounds
//! - Height is `5'7` style feet and inches, or centimetres

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Youngest age the form accepts
pub const MIN_AGE: u16 = 18;

/// Longest age input, in characters
pub const MAX_AGE_DIGITS: usize = 3;

const KG_PER_LB: f64 = 0.453_592_37;
const CM_PER_INCH: f64 = 2.54;
const INCHES_PER_FOOT: f64 = 12.0;

static AGE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").expect("valid regex"));
static DECIMAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(?:\.\d+)?$").expect("valid regex"));
static FEET_INCHES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(\d+)\s*'\s*(?:(\d+(?:\.\d+)?)\s*(?:"|'')?)?$"#).expect("valid regex")
});

/// A validated age in years
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Age(u16);

impl Age {
    /// Build an age, raising anything below the minimum to the minimum
    #[must_use]
    pub fn clamped(years: u16) -> Self {
        Self(years.max(MIN_AGE))
    }

    /// Years
    #[must_use]
    pub fn years(self) -> u16 {
        self.0
    }

    /// Parse typed input: digits only, at most three of them
    pub fn parse(text: &str) -> Result<Self> {
        if text.len() > MAX_AGE_DIGITS || !AGE_RE.is_match(text) {
            return Err(Error::invalid_input(
                "age",
                format!("Please enter numbers only ({MIN_AGE}-999)"),
            ));
        }
        let years: u16 = text
            .parse()
            .map_err(|_| Error::invalid_input("age", format!("Not a number: {text}")))?;
        Ok(Self::clamped(years))
    }

    /// One year older
    #[must_use]
    pub fn increment(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// One year younger, never below the minimum
    #[must_use]
    pub fn decrement(self) -> Self {
        Self::clamped(self.0.saturating_sub(1))
    }
}

impl Default for Age {
    fn default() -> Self {
        Self(25)
    }
}

impl fmt::Display for Age {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Age text field state: what the user typed and the last valid age
///
/// Invalid input flags an error but keeps the previous age; committing the
/// field (losing focus) snaps the text back to the valid age.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgeField {
    age: Age,
    input: String,
    error: bool,
}

impl AgeField {
    /// Field showing the given age
    #[must_use]
    pub fn new(age: Age) -> Self {
        Self {
            age,
            input: age.to_string(),
            error: false,
        }
    }

    /// Apply typed text
    pub fn set_text(&mut self, text: &str) {
        self.input = text.to_string();
        match Age::parse(text) {
            Ok(age) => {
                self.age = age;
                self.error = false;
            }
            Err(_) => self.error = true,
        }
    }

    /// Step up one year
    pub fn increment(&mut self) {
        self.age = self.age.increment();
        self.input = self.age.to_string();
    }

    /// Step down one year
    pub fn decrement(&mut self) {
        self.age = self.age.decrement();
        self.input = self.age.to_string();
    }

    /// Restore the text to the current valid age
    pub fn commit(&mut self) {
        if self.error || self.input != self.age.to_string() {
            self.input = self.age.to_string();
            self.error = false;
        }
    }

    /// Current valid age
    #[must_use]
    pub fn age(&self) -> Age {
        self.age
    }

    /// Text as displayed
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Whether the last typed text was rejected
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.error
    }
}

impl Default for AgeField {
    fn default() -> Self {
        Self::new(Age::default())
    }
}

/// Weight unit toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    /// Kilograms
    #[default]
    Kg,
    /// Pounds
    Lb,
}

impl FromStr for WeightUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kg" | "kgs" | "kilograms" => Ok(Self::Kg),
            "lb" | "lbs" | "pounds" => Ok(Self::Lb),
            other => Err(Error::invalid_input(
                "weight_unit",
                format!("Unknown weight unit: {other}"),
            )),
        }
    }
}

impl fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kg => write!(f, "kg"),
            Self::Lb => write!(f, "lb"),
        }
    }
}

/// Body weight in the unit the user picked
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weight {
    /// Value as entered
    pub value: f64,
    /// Unit of `value`
    pub unit: WeightUnit,
}

impl Weight {
    /// Parse a positive decimal value in the given unit
    pub fn parse(text: &str, unit: WeightUnit) -> Result<Self> {
        let text = text.trim();
        if !DECIMAL_RE.is_match(text) {
            return Err(Error::invalid_input(
                "weight",
                format!("Weight must be a number, got {text:?}"),
            )
            .with_suggestion("Enter a value such as 54.2"));
        }
        let value: f64 = text
            .parse()
            .map_err(|_| Error::invalid_input("weight", format!("Not a number: {text}")))?;
        if value <= 0.0 {
            return Err(Error::out_of_range("weight", "Weight must be greater than zero"));
        }
        Ok(Self { value, unit })
    }

    /// Weight in kilograms
    #[must_use]
    pub fn kilograms(&self) -> f64 {
        match self.unit {
            WeightUnit::Kg => self.value,
            WeightUnit::Lb => self.value * KG_PER_LB,
        }
    }

    /// Same quantity expressed in another unit
    #[must_use]
    pub fn converted_to(&self, unit: WeightUnit) -> Self {
        let value = match unit {
            WeightUnit::Kg => self.kilograms(),
            WeightUnit::Lb => self.kilograms() / KG_PER_LB,
        };
        Self { value, unit }
    }
}

impl Default for Weight {
    fn default() -> Self {
        Self {
            value: 54.2,
            unit: WeightUnit::Kg,
        }
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} {}", self.value, self.unit)
    }
}

/// Height unit toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeightUnit {
    /// Feet and inches
    #[default]
    Ft,
    /// Centimetres
    Cm,
}

impl FromStr for HeightUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ft" | "feet" => Ok(Self::Ft),
            "cm" | "centimetres" | "centimeters" => Ok(Self::Cm),
            other => Err(Error::invalid_input(
                "height_unit",
                format!("Unknown height unit: {other}"),
            )),
        }
    }
}

/// Body height
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "unit", rename_all = "lowercase")]
pub enum Height {
    /// `feet'inches`
    Ft {
        /// Whole feet
        feet: u32,
        /// Remaining inches
        inches: f64,
    },
    /// Centimetres
    Cm {
        /// Value in centimetres
        value: f64,
    },
}

impl Height {
    /// Parse `5'7`, `5'7"`, `6'` or a bare number of feet; or centimetres
    pub fn parse(text: &str, unit: HeightUnit) -> Result<Self> {
        let text = text.trim();
        match unit {
            HeightUnit::Ft => {
                if let Some(caps) = FEET_INCHES_RE.captures(text) {
                    let feet: u32 = caps[1].parse().map_err(|_| {
                        Error::invalid_input("height", format!("Invalid feet: {text}"))
                    })?;
                    let inches = caps
                        .get(2)
                        .map(|m| m.as_str().parse::<f64>())
                        .transpose()
                        .map_err(|_| {
                            Error::invalid_input("height", format!("Invalid inches: {text}"))
                        })?
                        .unwrap_or(0.0);
                    if inches >= INCHES_PER_FOOT {
                        return Err(Error::out_of_range("height", "Inches must be below 12"));
                    }
                    Self::Ft { feet, inches }.checked()
                } else if let Ok(feet) = text.parse::<u32>() {
                    Self::Ft { feet, inches: 0.0 }.checked()
                } else {
                    Err(Error::invalid_input(
                        "height",
                        format!("Height must look like 5'7, got {text:?}"),
                    ))
                }
            }
            HeightUnit::Cm => {
                if !DECIMAL_RE.is_match(text) {
                    return Err(Error::invalid_input(
                        "height",
                        format!("Height must be a number of centimetres, got {text:?}"),
                    ));
                }
                let value: f64 = text.parse().map_err(|_| {
                    Error::invalid_input("height", format!("Not a number: {text}"))
                })?;
                Self::Cm { value }.checked()
            }
        }
    }

    fn checked(self) -> Result<Self> {
        if self.centimetres() <= 0.0 {
            return Err(Error::out_of_range("height", "Height must be greater than zero"));
        }
        Ok(self)
    }

    /// Height in centimetres
    #[must_use]
    pub fn centimetres(&self) -> f64 {
        match *self {
            Self::Ft { feet, inches } => {
                (f64::from(feet) * INCHES_PER_FOOT + inches) * CM_PER_INCH
            }
            Self::Cm { value } => value,
        }
    }
}

impl Default for Height {
    fn default() -> Self {
        Self::Ft {
            feet: 5,
            inches: 7.0,
        }
    }
}

impl fmt::Display for Height {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ft { feet, inches } => write!(f, "{feet}'{inches}"),
            Self::Cm { value } => write!(f, "{value:.1} cm"),
        }
    }
}

/// Everything the intake form collects
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Profile {
    /// Age in years
    pub age: Age,
    /// Body weight
    pub weight: Weight,
    /// Body height
    pub height: Height,
}

impl Profile {
    /// Body mass index from the metric conversions
    #[must_use]
    pub fn bmi(&self) -> f64 {
        let metres = self.height.centimetres() / 100.0;
        self.weight.kilograms() / (metres * metres)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use proptest::prelude::*;

    #[test]
    fn test_age_parse_clamps_to_minimum() {
        assert_eq!(Age::parse("12").unwrap().years(), 18);
        assert_eq!(Age::parse("42").unwrap().years(), 42);
    }

    #[test]
    fn test_age_parse_rejects_non_digits() {
        for text in ["", "4a", "-3", "1.5", "1000"] {
            let err = Age::parse(text).unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidInput, "input {text:?}");
        }
    }

    #[test]
    fn test_age_decrement_floors() {
        assert_eq!(Age::clamped(18).decrement().years(), 18);
        assert_eq!(Age::clamped(30).decrement().years(), 29);
        assert_eq!(Age::clamped(30).increment().years(), 31);
    }

    #[test]
    fn test_age_field_keeps_last_valid_age() {
        let mut field = AgeField::default();
        field.set_text("3x");
        assert!(field.has_error());
        assert_eq!(field.age().years(), 25);
        assert_eq!(field.input(), "3x");

        field.commit();
        assert!(!field.has_error());
        assert_eq!(field.input(), "25");
    }

    #[test]
    fn test_age_field_commit_shows_clamped_value() {
        let mut field = AgeField::default();
        field.set_text("9");
        assert!(!field.has_error());
        assert_eq!(field.input(), "9");
        field.commit();
        assert_eq!(field.input(), "18");
    }

    #[test]
    fn test_weight_units() {
        let kg = Weight::parse("54.2", WeightUnit::Kg).unwrap();
        assert!((kg.kilograms() - 54.2).abs() < f64::EPSILON);

        let lb = Weight::parse("100", WeightUnit::Lb).unwrap();
        assert!((lb.kilograms() - 45.359_237).abs() < 1e-9);

        let back = lb.converted_to(WeightUnit::Kg).converted_to(WeightUnit::Lb);
        assert!((back.value - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_weight_rejects_garbage() {
        assert!(Weight::parse("heavy", WeightUnit::Kg).is_err());
        assert!(Weight::parse("0", WeightUnit::Kg).is_err());
    }

    #[test]
    fn test_height_feet_inches() {
        let h = Height::parse("5'7", HeightUnit::Ft).unwrap();
        assert_eq!(h, Height::Ft { feet: 5, inches: 7.0 });
        assert!((h.centimetres() - 170.18).abs() < 1e-9);

        let quoted = Height::parse("6'0\"", HeightUnit::Ft).unwrap();
        assert!((quoted.centimetres() - 182.88).abs() < 1e-9);

        let bare = Height::parse("6", HeightUnit::Ft).unwrap();
        assert_eq!(bare, Height::Ft { feet: 6, inches: 0.0 });
    }

    #[test]
    fn test_height_rejects_bad_inches() {
        let err = Height::parse("5'13", HeightUnit::Ft).unwrap_err();
        assert_eq!(err.code, ErrorCode::OutOfRange);
        assert!(Height::parse("tall", HeightUnit::Ft).is_err());
    }

    #[test]
    fn test_height_centimetres() {
        let h = Height::parse("172.5", HeightUnit::Cm).unwrap();
        assert!((h.centimetres() - 172.5).abs() < f64::EPSILON);
        assert!(Height::parse("5'7", HeightUnit::Cm).is_err());
    }

    #[test]
    fn test_units_from_str() {
        assert_eq!("LB".parse::<WeightUnit>().unwrap(), WeightUnit::Lb);
        assert_eq!("cm".parse::<HeightUnit>().unwrap(), HeightUnit::Cm);
        assert!("stone".parse::<WeightUnit>().is_err());
    }

    #[test]
    fn test_default_profile_bmi() {
        let bmi = Profile::default().bmi();
        assert!((bmi - 18.71).abs() < 0.01);
    }

    proptest! {
        #[test]
        fn prop_parsed_age_never_below_minimum(years in 0u16..1000) {
            let age = Age::parse(&years.to_string()).unwrap();
            prop_assert!(age.years() >= MIN_AGE);
            prop_assert_eq!(age.years(), years.max(MIN_AGE));
        }

        #[test]
        fn prop_decrement_never_below_minimum(years in 0u16..1000, steps in 0usize..50) {
            let mut age = Age::clamped(years);
            for _ in 0..steps {
                age = age.decrement();
            }
            prop_assert!(age.years() >= MIN_AGE);
        }
    }
}
