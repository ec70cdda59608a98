//! Resolution of per-isolate file names.
//!
//! The naming of files produced by the various tools is not consistent
//! across isolates. Rather than assuming one fixed name, every lookup is
//! expressed as an ordered list of templates in which `{isolate}` is replaced
//! by the isolate name.
//!
//! - [`Candidates`] are tried in order and the first existing file wins.
//! - [`Patterns`] are glob patterns; the matches of every pattern are unioned.

use std::collections::BTreeSet;
use std::path::Path;
use std::path::PathBuf;

use glob::Pattern;
use nonempty::NonEmpty;
use serde::Deserialize;

use crate::isolate::Isolate;

/// The placeholder replaced by the isolate name within a template.
pub const ISOLATE_PLACEHOLDER: &str = "{isolate}";

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error related to resolution.
#[derive(Debug)]
pub enum Error {
    /// No templates were provided.
    Empty,

    /// A glob pattern was invalid.
    Pattern(String, glob::PatternError),

    /// A matched path could not be read.
    Glob(glob::GlobError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Empty => write!(f, "at least one template must be provided"),
            Error::Pattern(pattern, err) => write!(f, "invalid pattern `{pattern}`: {err}"),
            Error::Glob(err) => write!(f, "glob error: {err}"),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

/// Substitutes the isolate name into a template.
fn substitute(template: &str, isolate: &str) -> String {
    template.replace(ISOLATE_PLACEHOLDER, isolate)
}

////////////////////////////////////////////////////////////////////////////////////////
// Candidates
////////////////////////////////////////////////////////////////////////////////////////

/// An ordered list of candidate file name templates.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(try_from = "Vec<String>")]
pub struct Candidates(NonEmpty<String>);

impl Candidates {
    /// Gets the templates.
    pub fn templates(&self) -> &NonEmpty<String> {
        &self.0
    }

    /// Gets every candidate path for an isolate, in order.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::PathBuf;
    ///
    /// use secretome::resolve::Candidates;
    ///
    /// let candidates = Candidates::try_from(vec![
    ///     String::from("{isolate}.faa"),
    ///     String::from("{isolate}.sanitized.faa"),
    /// ])?;
    ///
    /// let isolate = "B20".parse::<secretome::Isolate>()?;
    /// assert_eq!(
    ///     candidates.paths("input", &isolate),
    ///     vec![PathBuf::from("input/B20.faa"), PathBuf::from("input/B20.sanitized.faa")]
    /// );
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn paths(&self, dir: impl AsRef<Path>, isolate: &Isolate) -> Vec<PathBuf> {
        self.0
            .iter()
            .map(|template| dir.as_ref().join(substitute(template, isolate.name())))
            .collect()
    }

    /// Gets the first candidate path that names an existing file.
    pub fn first_existing(&self, dir: impl AsRef<Path>, isolate: &Isolate) -> Option<PathBuf> {
        self.paths(dir, isolate)
            .into_iter()
            .find(|path| path.is_file())
    }
}

impl TryFrom<Vec<String>> for Candidates {
    type Error = Error;

    fn try_from(value: Vec<String>) -> Result<Self> {
        NonEmpty::from_vec(value).map(Self).ok_or(Error::Empty)
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Patterns
////////////////////////////////////////////////////////////////////////////////////////

/// A list of glob pattern templates.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(try_from = "Vec<String>")]
pub struct Patterns(NonEmpty<String>);

impl Patterns {
    /// Gets the templates.
    pub fn templates(&self) -> &NonEmpty<String> {
        &self.0
    }

    /// Gets every existing file matched by any pattern for an isolate.
    ///
    /// The directory and the isolate name are escaped before matching, so
    /// only the wildcards within the templates themselves are interpreted.
    /// The results are deduplicated and sorted.
    pub fn matches(&self, dir: impl AsRef<Path>, isolate: &Isolate) -> Result<Vec<PathBuf>> {
        let dir = Pattern::escape(&dir.as_ref().to_string_lossy());
        let name = Pattern::escape(isolate.name());

        let mut results = BTreeSet::new();

        for template in self.0.iter() {
            let pattern = format!("{}/{}", dir, substitute(template, &name));

            for entry in
                glob::glob(&pattern).map_err(|err| Error::Pattern(pattern.clone(), err))?
            {
                let path = entry.map_err(Error::Glob)?;

                if path.is_file() {
                    results.insert(path);
                }
            }
        }

        Ok(results.into_iter().collect())
    }
}

impl TryFrom<Vec<String>> for Patterns {
    type Error = Error;

    fn try_from(value: Vec<String>) -> Result<Self> {
        NonEmpty::from_vec(value).map(Self).ok_or(Error::Empty)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempdir::TempDir;

    use super::*;

    #[test]
    fn test_empty_templates() {
        let err = Candidates::try_from(Vec::new()).unwrap_err();
        assert_eq!(err.to_string(), "at least one template must be provided");
        assert!(Patterns::try_from(Vec::new()).is_err());
    }

    #[test]
    fn test_first_existing_prefers_earlier_candidates() -> std::result::Result<(), Box<dyn std::error::Error>>
    {
        let dir = TempDir::new("resolve")?;
        let isolate = "CFF1".parse::<Isolate>()?;
        let candidates = Candidates::try_from(vec![
            String::from("{isolate}.faa"),
            String::from("{isolate}.sanitized.faa"),
        ])?;

        assert_eq!(candidates.first_existing(dir.path(), &isolate), None);

        fs::write(dir.path().join("CFF1.sanitized.faa"), ">CFF1_1\nM\n")?;
        assert_eq!(
            candidates.first_existing(dir.path(), &isolate),
            Some(dir.path().join("CFF1.sanitized.faa"))
        );

        fs::write(dir.path().join("CFF1.faa"), ">CFF1_1\nM\n")?;
        assert_eq!(
            candidates.first_existing(dir.path(), &isolate),
            Some(dir.path().join("CFF1.faa"))
        );

        Ok(())
    }

    #[test]
    fn test_patterns_union_and_deduplicate() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new("resolve")?;
        let isolate = "5B".parse::<Isolate>()?;
        fs::create_dir_all(dir.path().join("5B"))?;
        fs::write(dir.path().join("5B").join("5B_summary.targetp2"), "")?;
        fs::write(dir.path().join("5B").join("other.targetp2"), "")?;
        fs::write(dir.path().join("5B").join("notes.txt"), "")?;

        let patterns = Patterns::try_from(vec![
            String::from("{isolate}/*.targetp2"),
            String::from("{isolate}/*summary*"),
        ])?;

        let matches = patterns.matches(dir.path(), &isolate)?;
        assert_eq!(
            matches,
            vec![
                dir.path().join("5B").join("5B_summary.targetp2"),
                dir.path().join("5B").join("other.targetp2"),
            ]
        );

        Ok(())
    }
}
