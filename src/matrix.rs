//! Presence/absence matrices.
//!
//! A matrix has one row per identifier (effector or cluster) and one column
//! per isolate. A cell is `1` when the identifier is present in the isolate.

use std::collections::BTreeSet;
use std::collections::HashMap;
use std::io::{self};
use std::path::Path;

use tabled::Tabled;

use crate::isolate::Isolate;

/// The default file name of the effector matrix.
pub const EFFECTOR_MATRIX_FILE_NAME: &str = "effector_presence_absence_matrix.csv";

/// The row label header of the effector matrix.
pub const EFFECTOR_LABEL: &str = "Effector_ID";

/// The row label header of the cluster matrix.
pub const CLUSTER_LABEL: &str = "Cluster";

/// A presence/absence matrix.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Matrix {
    /// The header of the row label column.
    label: String,

    /// The isolates, in column order.
    isolates: Vec<Isolate>,

    /// The rows, sorted by identifier.
    rows: Vec<(String, Vec<bool>)>,
}

impl Matrix {
    /// Creates a matrix from the identifiers present in each isolate.
    ///
    /// Isolates without memberships have an all-absent column.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::BTreeSet;
    ///
    /// use secretome::matrix::Matrix;
    /// use secretome::Isolate;
    ///
    /// let a = "5B".parse::<Isolate>()?;
    /// let b = "B20".parse::<Isolate>()?;
    /// let in_a = BTreeSet::from([String::from("x"), String::from("y")]);
    /// let in_b = BTreeSet::from([String::from("y")]);
    ///
    /// let matrix = Matrix::new("Effector_ID", vec![a, b], [(0, &in_a), (1, &in_b)]);
    /// assert_eq!(matrix.rows().len(), 2);
    /// assert_eq!(matrix.summary().core, 1);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn new<'a, I>(label: impl Into<String>, isolates: Vec<Isolate>, memberships: I) -> Self
    where
        I: IntoIterator<Item = (usize, &'a BTreeSet<String>)>,
    {
        let mut by_column: HashMap<usize, Vec<&BTreeSet<String>>> = HashMap::new();

        for (column, ids) in memberships {
            by_column.entry(column).or_default().push(ids);
        }

        let ids = by_column
            .values()
            .flatten()
            .flat_map(|ids| ids.iter())
            .collect::<BTreeSet<_>>();

        let rows = ids
            .into_iter()
            .map(|id| {
                let cells = (0..isolates.len())
                    .map(|column| {
                        by_column
                            .get(&column)
                            .map(|sets| sets.iter().any(|set| set.contains(id)))
                            .unwrap_or(false)
                    })
                    .collect();

                (id.clone(), cells)
            })
            .collect();

        Self {
            label: label.into(),
            isolates,
            rows,
        }
    }

    /// Creates a matrix keyed by isolate rather than by column.
    ///
    /// Memberships for isolates that are not columns of the matrix are
    /// ignored.
    pub fn from_isolates<'a, I>(label: impl Into<String>, isolates: Vec<Isolate>, memberships: I) -> Self
    where
        I: IntoIterator<Item = (&'a Isolate, &'a BTreeSet<String>)>,
    {
        let columns = isolates
            .iter()
            .enumerate()
            .map(|(column, isolate)| (isolate.clone(), column))
            .collect::<HashMap<_, _>>();

        let memberships = memberships
            .into_iter()
            .filter_map(|(isolate, ids)| columns.get(isolate).map(|column| (*column, ids)))
            .collect::<Vec<_>>();

        Self::new(label, isolates, memberships)
    }

    /// Gets the header of the row label column.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Gets the isolates, in column order.
    pub fn isolates(&self) -> &[Isolate] {
        &self.isolates
    }

    /// Gets the rows.
    pub fn rows(&self) -> &[(String, Vec<bool>)] {
        &self.rows
    }

    /// Summarizes the distribution of rows across isolates.
    pub fn summary(&self) -> Summary {
        let isolates = self.isolates.len();
        let mut summary = Summary {
            total: self.rows.len(),
            ..Default::default()
        };

        for (_, cells) in &self.rows {
            let count = cells.iter().filter(|present| **present).count();

            if count == isolates {
                summary.core += 1;
            }

            if count == 1 {
                summary.singleton += 1;
            }
        }

        summary.accessory = summary.total - summary.core;
        summary
    }

    /// Writes the matrix as CSV.
    pub fn write<W>(&self, writer: W) -> csv::Result<()>
    where
        W: io::Write,
    {
        let mut writer = csv::Writer::from_writer(writer);

        writer.write_record(
            std::iter::once(self.label.as_str()).chain(self.isolates.iter().map(Isolate::name)),
        )?;

        for (id, cells) in &self.rows {
            writer.write_record(
                std::iter::once(id.as_str())
                    .chain(cells.iter().map(|present| if *present { "1" } else { "0" })),
            )?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Writes the matrix as CSV to a file, creating parent directories as
    /// needed.
    pub fn write_path(&self, path: &Path) -> csv::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        self.write(std::fs::File::create(path)?)
    }
}

/// The distribution of a matrix's rows across isolates.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Tabled)]
pub struct Summary {
    /// The number of rows.
    #[tabled(rename = "Total")]
    pub total: usize,

    /// The number of rows present in every isolate.
    #[tabled(rename = "Core")]
    pub core: usize,

    /// The number of rows absent from at least one isolate.
    #[tabled(rename = "Accessory")]
    pub accessory: usize,

    /// The number of rows present in exactly one isolate.
    #[tabled(rename = "Singleton")]
    pub singleton: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|id| (*id).to_owned()).collect()
    }

    fn isolates(names: &[&str]) -> Vec<Isolate> {
        names.iter().map(|name| name.parse().unwrap()).collect()
    }

    #[test]
    fn test_summary() {
        let a = set(&["e1", "e2", "e3"]);
        let b = set(&["e1", "e2"]);
        let c = set(&["e1", "e4"]);

        let columns = isolates(&["5B", "5C", "B20"]);
        let matrix = Matrix::from_isolates(
            EFFECTOR_LABEL,
            columns.clone(),
            [(&columns[0], &a), (&columns[1], &b), (&columns[2], &c)],
        );

        assert_eq!(
            matrix.summary(),
            Summary {
                total: 4,
                core: 1,
                accessory: 3,
                singleton: 2,
            }
        );
    }

    #[test]
    fn test_missing_isolate_column() {
        let a = set(&["e1"]);
        let columns = isolates(&["5B", "5C"]);
        let matrix = Matrix::from_isolates(EFFECTOR_LABEL, columns.clone(), [(&columns[0], &a)]);

        assert_eq!(matrix.rows(), &[(String::from("e1"), vec![true, false])]);
        assert_eq!(matrix.summary().core, 0);
        assert_eq!(matrix.summary().singleton, 1);
    }

    #[test]
    fn test_write_csv() -> Result<(), Box<dyn std::error::Error>> {
        let a = set(&["e2", "e1"]);
        let b = set(&["e2"]);
        let columns = isolates(&["5B", "B20"]);
        let matrix = Matrix::from_isolates(
            EFFECTOR_LABEL,
            columns.clone(),
            [(&columns[0], &a), (&columns[1], &b)],
        );

        let mut buffer = Vec::new();
        matrix.write(&mut buffer)?;

        assert_eq!(
            String::from_utf8(buffer)?,
            "Effector_ID,5B,B20\ne1,1,0\ne2,1,1\n"
        );

        Ok(())
    }
}
