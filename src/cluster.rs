//! Protein cluster files.
//!
//! Cluster files list clusters of similar proteins pooled from several
//! isolates. Every member is tagged with its isolate, separated from the
//! protein identifier by a `|`:
//!
//! ```text
//! >Cluster 0
//! 0	250aa, >5B|5B_000001... *
//! 1	248aa, >B20|B20_000002... at 95.00%
//! >Cluster 1
//! 0	102aa, >5C|5C_000040... *
//! ```
//!
//! The membership of each isolate across clusters feeds a presence/absence
//! [`Matrix`](crate::matrix::Matrix).

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::io::{self};
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::isolate::Isolate;
use crate::reader;
use crate::reader::Reader;

/// The prefix of a cluster header line.
pub const HEADER_PREFIX: &str = ">Cluster";

/// The suffix that marks a truncated identifier.
pub const TRUNCATION_MARKER: &str = "...";

/// A tagged member: the isolate tag, a `|`, then the identifier.
static MEMBER: LazyLock<Regex> = LazyLock::new(|| {
    // SAFETY: this pattern is tested below and is known to compile.
    Regex::new(r"(?:^|[\s>])([^|\s>,]+)\|(\S+)").unwrap()
});

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error associated with parsing a line of a cluster file.
#[derive(Debug, Eq, PartialEq)]
pub enum ParseError {
    /// The cluster header has no valid cluster number.
    InvalidClusterNumber(String),

    /// The member line has no isolate tag.
    MissingTag(String),

    /// The isolate tag is not a valid isolate name.
    InvalidIsolate(String),

    /// A member was listed before any cluster header.
    MemberBeforeHeader(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::InvalidClusterNumber(line) => {
                write!(f, "invalid cluster number: \"{line}\"")
            }
            ParseError::MissingTag(line) => write!(f, "missing isolate tag: \"{line}\""),
            ParseError::InvalidIsolate(tag) => write!(f, "invalid isolate tag: \"{tag}\""),
            ParseError::MemberBeforeHeader(line) => {
                write!(f, "member before any cluster header: \"{line}\"")
            }
        }
    }
}

impl std::error::Error for ParseError {}

////////////////////////////////////////////////////////////////////////////////////////
// Lines
////////////////////////////////////////////////////////////////////////////////////////

/// A member of a cluster.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Member {
    /// The isolate the member belongs to.
    isolate: Isolate,

    /// The identifier of the member.
    identifier: String,
}

impl Member {
    /// Gets the isolate.
    pub fn isolate(&self) -> &Isolate {
        &self.isolate
    }

    /// Gets the identifier.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }
}

impl FromStr for Member {
    type Err = ParseError;

    /// Parses a member line.
    ///
    /// # Examples
    ///
    /// ```
    /// use secretome::cluster::Member;
    ///
    /// let member = "1\t248aa, >B20|B20_000002... at 95.00%".parse::<Member>()?;
    /// assert_eq!(member.isolate().name(), "B20");
    /// assert_eq!(member.identifier(), "B20_000002");
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let captures = MEMBER
            .captures(s)
            .ok_or_else(|| ParseError::MissingTag(s.trim().to_owned()))?;

        // SAFETY: both groups always participate in a match.
        let tag = captures.get(1).unwrap().as_str();
        let identifier = captures.get(2).unwrap().as_str();

        let isolate = tag
            .parse::<Isolate>()
            .map_err(|_| ParseError::InvalidIsolate(tag.to_owned()))?;

        Ok(Self {
            isolate,
            identifier: identifier.trim_end_matches(TRUNCATION_MARKER).to_owned(),
        })
    }
}

/// A line within a cluster file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Line {
    /// An empty line.
    Empty,

    /// A cluster header with its number.
    Header(usize),

    /// A cluster member.
    Member(Member),
}

impl FromStr for Line {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = s.trim();

        if line.is_empty() {
            return Ok(Line::Empty);
        }

        if let Some(rest) = line.strip_prefix(HEADER_PREFIX) {
            return rest
                .trim()
                .parse()
                .map(Line::Header)
                .map_err(|_| ParseError::InvalidClusterNumber(line.to_owned()));
        }

        line.parse().map(Line::Member)
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Clusters
////////////////////////////////////////////////////////////////////////////////////////

/// A cluster of proteins.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Cluster {
    /// The cluster number.
    number: usize,

    /// The members, in file order.
    members: Vec<Member>,
}

impl Cluster {
    /// Gets the cluster number.
    pub fn number(&self) -> usize {
        self.number
    }

    /// Gets the members.
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Gets the name of the cluster as used in matrices.
    pub fn name(&self) -> String {
        format!("Cluster_{}", self.number)
    }

    /// Gets the distinct isolates with at least one member.
    pub fn isolates(&self) -> BTreeSet<&Isolate> {
        self.members.iter().map(Member::isolate).collect()
    }
}

/// The clusters within a cluster file.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Clusters {
    /// The clusters, in file order.
    clusters: Vec<Cluster>,

    /// The number of malformed lines that were skipped.
    skipped: usize,
}

impl Clusters {
    /// Reads clusters from a cluster file.
    ///
    /// Malformed lines (including members listed before the first header)
    /// are skipped and counted.
    ///
    /// # Examples
    ///
    /// ```
    /// use secretome::cluster::Clusters;
    ///
    /// let data = b">Cluster 0\n0\t250aa, >5B|5B_000001... *\n1\t248aa, >B20|B20_000002... at 95%\n";
    /// let clusters = Clusters::from_reader(&data[..])?;
    ///
    /// assert_eq!(clusters.clusters().len(), 1);
    /// assert_eq!(clusters.clusters()[0].members().len(), 2);
    ///
    /// # Ok::<(), std::io::Error>(())
    /// ```
    pub fn from_reader<R>(inner: R) -> io::Result<Self>
    where
        R: BufRead,
    {
        let mut result = Clusters::default();
        let mut reader = Reader::new(inner);

        for line in reader.lines::<Line>() {
            let line = match line {
                Ok(line) => line,
                Err(reader::Error::Io(err)) => return Err(err),
                Err(reader::Error::Line { line_no, inner }) => {
                    debug!("clusters: skipping malformed line {line_no}: {inner}");
                    result.skipped += 1;
                    continue;
                }
            };

            match line {
                Line::Empty => {}
                Line::Header(number) => result.clusters.push(Cluster {
                    number,
                    members: Vec::new(),
                }),
                Line::Member(member) => match result.clusters.last_mut() {
                    Some(cluster) => cluster.members.push(member),
                    None => {
                        let err = ParseError::MemberBeforeHeader(member.identifier);
                        debug!("clusters: skipping line: {err}");
                        result.skipped += 1;
                    }
                },
            }
        }

        Ok(result)
    }

    /// Reads clusters from a file.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        Self::from_reader(BufReader::new(File::open(path)?))
    }

    /// Gets the clusters.
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// Gets the number of malformed lines that were skipped.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Gets, for every isolate, the names of the clusters it is a member of.
    pub fn memberships(&self) -> BTreeMap<Isolate, BTreeSet<String>> {
        let mut memberships: BTreeMap<Isolate, BTreeSet<String>> = BTreeMap::new();

        for cluster in &self.clusters {
            for isolate in cluster.isolates() {
                memberships
                    .entry(isolate.clone())
                    .or_default()
                    .insert(cluster.name());
            }
        }

        memberships
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_tag_positions() -> Result<(), Box<dyn std::error::Error>> {
        for line in ["5B|5B_1", "0\t250aa 5B|5B_1...", "0\t250aa, >5B|5B_1... *"] {
            let member = line.parse::<Member>()?;
            assert_eq!(member.isolate().name(), "5B");
            assert_eq!(member.identifier(), "5B_1");
        }

        assert!(!MEMBER.is_match("0\t250aa,5B|5B_1"));

        Ok(())
    }

    #[test]
    fn test_parse_lines() -> Result<(), Box<dyn std::error::Error>> {
        assert_eq!("".parse::<Line>()?, Line::Empty);
        assert_eq!(">Cluster 12".parse::<Line>()?, Line::Header(12));
        assert_eq!(
            ">Cluster x".parse::<Line>().unwrap_err(),
            ParseError::InvalidClusterNumber(String::from(">Cluster x"))
        );

        match ">KSU3368|KSU3368_part2_000004".parse::<Line>()? {
            Line::Member(member) => {
                assert_eq!(member.isolate().name(), "KSU3368");
                assert_eq!(member.identifier(), "KSU3368_part2_000004");
            }
            line => panic!("unexpected line: {line:?}"),
        }

        assert_eq!(
            "0\t250aa, >5B_000001... *".parse::<Line>().unwrap_err(),
            ParseError::MissingTag(String::from("0\t250aa, >5B_000001... *"))
        );

        Ok(())
    }

    #[test]
    fn test_memberships() -> Result<(), Box<dyn std::error::Error>> {
        let data = "\
0\t99aa, >5C|5C_000009... *
>Cluster 0
0\t250aa, >5B|5B_000001... *
1\t248aa, >B20|B20_000002... at 95.00%
2\t248aa, >B20|B20_000003... at 90.00%
>Cluster 1
0\t102aa, >5C|5C_000040... *
1\tgarbage
";

        let clusters = Clusters::from_reader(data.as_bytes())?;
        assert_eq!(clusters.clusters().len(), 2);
        assert_eq!(clusters.skipped(), 2);

        let memberships = clusters.memberships();
        let b20 = "B20".parse::<Isolate>()?;
        let five_c = "5C".parse::<Isolate>()?;

        assert_eq!(
            memberships[&b20],
            BTreeSet::from([String::from("Cluster_0")])
        );
        assert_eq!(
            memberships[&five_c],
            BTreeSet::from([String::from("Cluster_1")])
        );
        assert_eq!(clusters.clusters()[0].isolates().len(), 2);

        Ok(())
    }
}
