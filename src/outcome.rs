//! Outcomes of individual units of work and the reports that collect them.
//!
//! A unit of work is an isolate (or, for chunked tools, one chunk of an
//! isolate's proteome). A failed unit is recorded and the batch moves on.

/// The outcome of a single unit of work.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Outcome<T> {
    /// The unit completed.
    Success(T),

    /// The unit failed for the provided reason.
    Failure(String),
}

impl<T> Outcome<T> {
    /// Returns whether the unit completed.
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// Gets the value of a successful unit.
    pub fn success(&self) -> Option<&T> {
        match self {
            Outcome::Success(value) => Some(value),
            Outcome::Failure(_) => None,
        }
    }

    /// Gets the reason for a failed unit.
    pub fn failure(&self) -> Option<&str> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure(reason) => Some(reason),
        }
    }
}

impl<T, E> From<Result<T, E>> for Outcome<T>
where
    E: std::fmt::Display,
{
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Outcome::Success(value),
            Err(err) => Outcome::Failure(err.to_string()),
        }
    }
}

/// The outcomes of a batch, in the order the units were processed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BatchReport<T> {
    /// The named outcomes.
    units: Vec<(String, Outcome<T>)>,
}

impl<T> Default for BatchReport<T> {
    fn default() -> Self {
        Self { units: Vec::new() }
    }
}

impl<T> BatchReport<T> {
    /// Records the outcome of a unit.
    ///
    /// # Examples
    ///
    /// ```
    /// use secretome::BatchReport;
    /// use secretome::Outcome;
    ///
    /// let mut report = BatchReport::default();
    /// report.push("5B", Outcome::Success(12));
    /// report.push("5C", Outcome::Failure(String::from("missing FASTA")));
    ///
    /// assert_eq!(report.len(), 2);
    /// assert_eq!(report.successes().count(), 1);
    /// assert_eq!(report.failures().collect::<Vec<_>>(), vec![("5C", "missing FASTA")]);
    /// assert!(!report.is_success());
    /// ```
    pub fn push(&mut self, unit: impl Into<String>, outcome: Outcome<T>) {
        self.units.push((unit.into(), outcome));
    }

    /// Gets the named outcomes.
    pub fn units(&self) -> &[(String, Outcome<T>)] {
        &self.units
    }

    /// Gets the number of units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Returns whether no units were recorded.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Gets the successful units.
    pub fn successes(&self) -> impl Iterator<Item = (&str, &T)> {
        self.units
            .iter()
            .filter_map(|(unit, outcome)| outcome.success().map(|value| (unit.as_str(), value)))
    }

    /// Gets the failed units along with their reasons.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.units
            .iter()
            .filter_map(|(unit, outcome)| outcome.failure().map(|reason| (unit.as_str(), reason)))
    }

    /// Returns whether every unit succeeded.
    pub fn is_success(&self) -> bool {
        self.units.iter().all(|(_, outcome)| outcome.is_success())
    }
}

impl<T> std::fmt::Display for BatchReport<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let failures = self.failures().count();
        write!(
            f,
            "{} unit(s): {} succeeded, {} failed",
            self.len(),
            self.len() - failures,
            failures
        )
    }
}
