//! Run report for the file modes

use renamer_core::TestCase;
use renamer_eval::UnitFailure;
use serde::Serialize;
use std::collections::BTreeMap;

/// File name of the report written next to the outputs
pub const REPORT_FILE_NAME: &str = "rename_report.json";

/// What happened to one test method
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodOutcome {
    pub name: String,
    pub new_name: Option<String>,
    pub clean: bool,
    pub attempts: usize,
    pub failure: Option<String>,
}

impl From<&TestCase> for MethodOutcome {
    fn from(case: &TestCase) -> Self {
        Self {
            name: case.name().to_string(),
            new_name: case.new_name().map(str::to_string),
            clean: case.is_clean(),
            attempts: case.attempts(),
            failure: case.failure().map(str::to_string),
        }
    }
}

/// What happened to one input file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    /// Where the processed file was written
    pub output: String,
    pub tests_found: usize,
    pub renamed: usize,
    pub unchanged: usize,
    /// False when the original text was written because reassembly failed
    pub reassembled: bool,
    pub methods: Vec<MethodOutcome>,
}

impl FileOutcome {
    /// Summarize the cases of one file
    #[must_use]
    pub fn new(output: impl Into<String>, cases: &[TestCase], reassembled: bool) -> Self {
        let renamed = if reassembled {
            cases.iter().filter(|c| c.is_clean()).count()
        } else {
            0
        };
        Self {
            output: output.into(),
            tests_found: cases.len(),
            renamed,
            unchanged: cases.len() - renamed,
            reassembled,
            methods: cases.iter().map(MethodOutcome::from).collect(),
        }
    }
}

/// Outcome of a `single` or `dir` run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    /// Per-file outcomes keyed by input path
    pub files: BTreeMap<String, FileOutcome>,
    /// Files written with their accepted rewrites in place
    pub processed: usize,
    /// Units with a recorded failure, including files written unchanged
    /// because their text drifted
    pub failed: usize,
    /// Failures sorted by unit
    pub failures: Vec<UnitFailure>,
    pub execution_time_s: f64,
}

impl RunReport {
    /// Methods renamed across all files
    #[must_use]
    pub fn renamed(&self) -> usize {
        self.files.values().map(|f| f.renamed).sum()
    }

    /// Methods found across all files
    #[must_use]
    pub fn tests_found(&self) -> usize {
        self.files.values().map(|f| f.tests_found).sum()
    }
}
