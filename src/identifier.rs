//! Standardized protein identifiers.
//!
//! Each prediction tool reports the identifier of a protein in its own way:
//! some keep the leading `>` of the FASTA header, some zero-pad the numeric
//! portion, and some prefix the identifier differently depending on the
//! isolate. [`normalize()`] reconciles all of these into a single
//! `{isolate}_{integer}` form so that identifier sets from different tools can
//! be intersected.
//!
//! Only the _last_ run of digits is used. An identifier that carries another
//! numeric component after the protein number (such as a chunk or part
//! number) normalizes to the wrong protein. [`digit_runs()`] is exposed so
//! that callers can detect identifiers with more than one run.

use std::sync::LazyLock;

use regex::Regex;

/// The marker at the start of a FASTA header line.
pub const HEADER_MARKER: char = '>';

/// The separator between the isolate and the protein number.
pub const SEPARATOR: char = '_';

/// Matches maximal runs of ASCII digits.
static DIGIT_RUN: LazyLock<Regex> = LazyLock::new(|| {
    // SAFETY: this pattern is tested below and is known to compile.
    Regex::new(r"[0-9]+").unwrap()
});

/// A standardized protein identifier.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Identifier(String);

impl Identifier {
    /// Gets the identifier as a string slice.
    ///
    /// # Examples
    ///
    /// ```
    /// use secretome::identifier;
    ///
    /// let id = identifier::normalize("5B_000001", "5B");
    /// assert_eq!(id.as_str(), "5B_1");
    /// ```
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes `self` and returns the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Strips surrounding whitespace and a single leading header marker.
fn strip(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix(HEADER_MARKER)
        .map(str::trim_start)
        .unwrap_or(trimmed)
}

/// Gets every maximal run of digits within a raw identifier (after stripping
/// surrounding whitespace and the header marker).
///
/// # Examples
///
/// ```
/// use secretome::identifier;
///
/// assert_eq!(identifier::digit_runs("KSU3368_000042"), vec!["3368", "000042"]);
/// assert!(identifier::digit_runs("no-digits").is_empty());
/// ```
pub fn digit_runs(raw: &str) -> Vec<&str> {
    DIGIT_RUN
        .find_iter(strip(raw))
        .map(|m| m.as_str())
        .collect()
}

/// Normalizes a raw identifier emitted by a prediction tool into a
/// standardized identifier for the provided isolate.
///
/// The last run of digits is taken as the protein number, its leading zeros
/// are dropped, and the result is tagged with the isolate name. If the raw
/// identifier contains no digits, the stripped raw identifier is returned
/// unchanged.
///
/// Numbers are never parsed into a fixed-width integer, so arbitrarily long
/// digit runs are handled without overflow.
///
/// # Examples
///
/// ```
/// use secretome::identifier;
///
/// assert_eq!(identifier::normalize("B20_000007", "B20").as_str(), "B20_7");
/// assert_eq!(identifier::normalize(">5B_000012", "5B").as_str(), "5B_12");
///
/// // Already standardized identifiers are left as-is.
/// assert_eq!(identifier::normalize("B20_7", "B20").as_str(), "B20_7");
///
/// // Identifiers without digits are returned unchanged.
/// assert_eq!(identifier::normalize("  >orphan ", "B20").as_str(), "orphan");
/// ```
pub fn normalize(raw: &str, isolate: impl AsRef<str>) -> Identifier {
    let stripped = strip(raw);

    match DIGIT_RUN.find_iter(stripped).last() {
        Some(run) => {
            let number = run.as_str().trim_start_matches('0');
            let number = if number.is_empty() { "0" } else { number };
            Identifier(format!("{}{}{}", isolate.as_ref(), SEPARATOR, number))
        }
        None => Identifier(stripped.to_owned()),
    }
}
