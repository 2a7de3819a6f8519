//! Cell value types

use std::fmt;
use std::sync::Arc;

/// Represents the raw value stored in a cell
///
/// Values are stored exactly as written. Formulas keep their source text and
/// are resolved on every read by the formula crate. Converting text that
/// starts with `=` yields a [`CellValue::Formula`].
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellValue {
    /// Placeholder cell with no value (reads as null)
    #[default]
    Empty,

    /// Numeric value
    Number(f64),

    /// String value
    String(SharedString),

    /// Formula source text, including the leading `=`
    Formula(String),
}

impl CellValue {
    /// Create a new string value
    pub fn string<S: Into<String>>(s: S) -> Self {
        CellValue::String(SharedString::new(s.into()))
    }

    /// Create a new formula value
    pub fn formula<S: Into<String>>(text: S) -> Self {
        CellValue::Formula(text.into())
    }

    /// Interpret raw text typed into a cell
    ///
    /// Text starting with `=` becomes a formula and empty text clears the
    /// cell. Anything else is kept verbatim; numeric text is only coerced
    /// when a formula aggregates it.
    ///
    /// ```
    /// use linksheet_core::CellValue;
    ///
    /// assert_eq!(CellValue::from_input("=SUM(A1:A3)"), CellValue::formula("=SUM(A1:A3)"));
    /// assert_eq!(CellValue::from_input("007"), CellValue::string("007"));
    /// assert_eq!(CellValue::from_input("007").as_number(), Some(7.0));
    /// ```
    pub fn from_input(text: &str) -> Self {
        if text.is_empty() {
            return CellValue::Empty;
        }
        CellValue::from(text)
    }

    /// Check if the cell is a placeholder
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Check if the cell contains a formula
    pub fn is_formula(&self) -> bool {
        matches!(self, CellValue::Formula(_))
    }

    /// Try to read the value as a number
    ///
    /// Strings are parsed locale-agnostically after trimming. Placeholders and
    /// formulas are never numeric.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::String(s) => parse_number(s.as_str()),
            CellValue::Empty | CellValue::Formula(_) => None,
        }
    }

    /// Try to get the value as a string
    pub fn as_string(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Get the formula text if this is a formula cell
    pub fn formula_text(&self) -> Option<&str> {
        match self {
            CellValue::Formula(text) => Some(text),
            _ => None,
        }
    }

    /// Get the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Empty => "empty",
            CellValue::Number(_) => "number",
            CellValue::String(_) => "string",
            CellValue::Formula(_) => "formula",
        }
    }
}

/// Parse trimmed text as a finite number
pub(crate) fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Format a number without a trailing `.0` for integral values
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => write!(f, ""),
            CellValue::Number(n) => write!(f, "{}", format_number(*n)),
            CellValue::String(s) => write!(f, "{}", s.as_str()),
            CellValue::Formula(text) => write!(f, "{}", text),
        }
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

/// Text starting with `=` converts to a formula, anything else to a string
impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        if s.starts_with('=') {
            CellValue::formula(s)
        } else {
            CellValue::string(s)
        }
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        if s.starts_with('=') {
            CellValue::Formula(s)
        } else {
            CellValue::string(s)
        }
    }
}

/// Error tokens shown in place of a value that could not be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellError {
    /// #VALUE! - Malformed formula
    Value,
    /// #REF! - Invalid cell reference
    Ref,
    /// #NAME? - Unrecognized function name
    Name,
}

impl CellError {
    /// Get the display string for this error
    pub fn as_str(&self) -> &'static str {
        match self {
            CellError::Value => "#VALUE!",
            CellError::Ref => "#REF!",
            CellError::Name => "#NAME?",
        }
    }
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reference-counted string
///
/// Cloning a value (e.g. when evaluating or batching) shares the text
/// instead of copying it.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SharedString(Arc<str>);

impl SharedString {
    /// Create a new shared string
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        SharedString(Arc::from(s.as_ref()))
    }

    /// Get the string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the length of the string
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the string is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SharedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl fmt::Display for SharedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SharedString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SharedString {
    fn from(s: &str) -> Self {
        SharedString::new(s)
    }
}

impl From<String> for SharedString {
    fn from(s: String) -> Self {
        SharedString::new(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for SharedString {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for SharedString {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(SharedString::new(s))
    }
}
