//! Isolates (named biological samples) within an analysis.

use std::str::FromStr;

use serde::Deserialize;

/// The isolates analyzed by default.
pub const KNOWN_ISOLATES: &[&str] = &[
    "5B", "5C", "B20", "C1995", "CFF1", "CFF2", "E282", "FSU48", "IMI58289", "KSU3368", "M567",
    "MRC2276", "NCIM1100",
];

/// An error related to the parsing of an isolate.
#[derive(Debug, Eq, PartialEq)]
pub enum ParseError {
    /// The isolate name was empty.
    Empty,

    /// The isolate name contained a character that is not allowed.
    InvalidCharacter(String, char),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Empty => write!(f, "isolate name cannot be empty"),
            ParseError::InvalidCharacter(name, c) => {
                write!(f, "invalid character {c:?} in isolate name \"{name}\"")
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// A named isolate.
///
/// Isolate names are used to build file paths and standardized identifiers,
/// so they may not be empty and may not contain whitespace, path separators,
/// or the `|` character used to tag cluster members.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[serde(try_from = "String")]
pub struct Isolate(String);

impl Isolate {
    /// Gets the isolate name.
    ///
    /// # Examples
    ///
    /// ```
    /// use secretome::Isolate;
    ///
    /// let isolate = "KSU3368".parse::<Isolate>()?;
    /// assert_eq!(isolate.name(), "KSU3368");
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Gets the default set of isolates.
    ///
    /// # Examples
    ///
    /// ```
    /// use secretome::Isolate;
    ///
    /// let isolates = Isolate::known();
    /// assert_eq!(isolates.len(), 13);
    /// assert_eq!(isolates[0].name(), "5B");
    /// ```
    pub fn known() -> Vec<Isolate> {
        KNOWN_ISOLATES
            .iter()
            .map(|name| Isolate((*name).to_owned()))
            .collect()
    }
}

impl FromStr for Isolate {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseError::Empty);
        }

        if let Some(c) = s
            .chars()
            .find(|c| c.is_whitespace() || matches!(c, '/' | '\\' | '|'))
        {
            return Err(ParseError::InvalidCharacter(s.to_owned(), c));
        }

        Ok(Self(s.to_owned()))
    }
}

impl TryFrom<String> for Isolate {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl AsRef<str> for Isolate {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Isolate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
