//! Batch driver
//!
//! Fans independent units (one Java file, or one oracle record) out to a
//! fixed pool of tokio workers pulling from a shared queue. Each worker
//! builds its own generator client once and keeps it for every unit it
//! handles. A unit that fails or panics is recorded against its id and the
//! worker moves on; nothing a unit does can stop its siblings.
//!
//! Results are keyed by unit, never by completion order.

use crate::config::PipelineConfig;
use crate::error::{BatchError, UnitError};
use crate::files::list_files;
use crate::oracle::{load_oracle_file, OracleRecord};
use crate::report::{FileOutcome, RunReport, REPORT_FILE_NAME};
use futures::FutureExt;
use parking_lot::Mutex;
use renamer_core::{
    reassemble, write_output, ReassembleError, RenameOrchestrator, RenameSettings, TestCase,
};
use renamer_eval::{evaluate, DatasetMetrics, MetricsAccumulator, UnitFailure};
use renamer_java::{declared_method_name, extract_spans_from_file, unwrap};
use renamer_llm::{score_or_zero, GeneratorError, ReadabilityScorer, TextGenerator};
use serde::Serialize;
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Builds one generator client per worker
pub type GeneratorFactory =
    Arc<dyn Fn() -> Result<Box<dyn TextGenerator>, GeneratorError> + Send + Sync>;

type Queue<U> = Arc<tokio::sync::Mutex<mpsc::Receiver<U>>>;

/// Work the pool knows how to run on one unit
#[async_trait::async_trait]
trait UnitJob: Send + Sync + 'static {
    type Unit: Send + 'static;

    /// Key the unit's result is recorded under
    fn unit_id(&self, unit: &Self::Unit) -> String;

    /// Process one unit; records its own outcome
    async fn run(&self, generator: &dyn TextGenerator, unit: Self::Unit);

    fn record_failure(&self, unit_id: String, reason: String);
}

/// Process every unit on `workers` concurrent workers
async fn run_pool<J: UnitJob>(
    job: Arc<J>,
    units: Vec<J::Unit>,
    workers: usize,
    factory: &GeneratorFactory,
) {
    if units.is_empty() {
        return;
    }
    let workers = workers.clamp(1, units.len());

    let (tx, rx) = mpsc::channel(units.len());
    for unit in units {
        if tx.send(unit).await.is_err() {
            break;
        }
    }
    drop(tx);
    let queue: Queue<J::Unit> = Arc::new(tokio::sync::Mutex::new(rx));

    tracing::debug!(workers, "starting worker pool");
    let mut handles = Vec::with_capacity(workers);
    for worker in 0..workers {
        let job = Arc::clone(&job);
        let queue = Arc::clone(&queue);
        let factory = Arc::clone(factory);
        handles.push(tokio::spawn(worker_loop(worker, job, queue, factory)));
    }
    for handle in handles {
        if let Err(e) = handle.await {
            tracing::error!(error = %e, "worker task aborted");
        }
    }
}

async fn next_unit<U>(queue: &Queue<U>) -> Option<U> {
    queue.lock().await.recv().await
}

async fn worker_loop<J: UnitJob>(
    worker: usize,
    job: Arc<J>,
    queue: Queue<J::Unit>,
    factory: GeneratorFactory,
) {
    let generator = match factory() {
        Ok(generator) => generator,
        Err(e) => {
            // Units still have to be accounted for.
            let reason = UnitError::from(e).to_string();
            tracing::error!(worker, reason = %reason, "cannot build generator client");
            while let Some(unit) = next_unit(&queue).await {
                job.record_failure(job.unit_id(&unit), reason.clone());
            }
            return;
        }
    };

    while let Some(unit) = next_unit(&queue).await {
        let id = job.unit_id(&unit);
        let outcome = AssertUnwindSafe(job.run(generator.as_ref(), unit))
            .catch_unwind()
            .await;
        if let Err(payload) = outcome {
            let reason = UnitError::Panicked(panic_message(payload.as_ref())).to_string();
            tracing::error!(worker, unit = %id, reason = %reason, "unit panicked");
            job.record_failure(id, reason);
        }
    }
    tracing::debug!(worker, "worker finished");
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Rename every test of one file and write the result
struct FileJob {
    settings: RenameSettings,
    output_dir: PathBuf,
    overwrite: bool,
    outcomes: Mutex<BTreeMap<String, FileOutcome>>,
    failures: Mutex<Vec<UnitFailure>>,
}

impl FileJob {
    async fn process(
        &self,
        generator: &dyn TextGenerator,
        path: &Path,
    ) -> Result<FileOutcome, UnitError> {
        let (source, spans) = extract_spans_from_file(path)?;
        tracing::info!(file = %path.display(), tests = spans.len(), "processing file");

        let orchestrator = RenameOrchestrator::new(generator, &self.settings);
        let mut cases: Vec<TestCase> = Vec::with_capacity(spans.len());
        for span in &spans {
            cases.push(orchestrator.rename_span(span, &source).await);
        }

        let (merged, drift) = match reassemble(&source, &cases) {
            Ok(merged) => (merged, None),
            Err(e @ ReassembleError::SpanNotFound { .. }) => {
                tracing::warn!(file = %path.display(), error = %e, "writing original text unchanged");
                (source.clone(), Some(e))
            }
            Err(e) => return Err(e.into()),
        };

        let file_name = path.file_name().ok_or_else(|| UnitError::NotFound {
            path: path.to_path_buf(),
        })?;
        let output = self.output_dir.join(file_name);
        write_output(&output, &merged, self.overwrite)?;

        if let Some(e) = &drift {
            self.record_failure(path.display().to_string(), e.to_string());
        }
        Ok(FileOutcome::new(
            output.display().to_string(),
            &cases,
            drift.is_none(),
        ))
    }

    fn finish(&self, elapsed: Duration) -> RunReport {
        let files = std::mem::take(&mut *self.outcomes.lock());
        let mut failures = std::mem::take(&mut *self.failures.lock());
        failures.sort_by(|a, b| a.unit.cmp(&b.unit));
        // A drifted file is written but already counted among the failures.
        let processed = files.values().filter(|f| f.reassembled).count();
        RunReport {
            processed,
            failed: failures.len(),
            files,
            failures,
            execution_time_s: elapsed.as_secs_f64(),
        }
    }
}

#[async_trait::async_trait]
impl UnitJob for FileJob {
    type Unit = PathBuf;

    fn unit_id(&self, unit: &PathBuf) -> String {
        unit.display().to_string()
    }

    async fn run(&self, generator: &dyn TextGenerator, unit: PathBuf) {
        let key = self.unit_id(&unit);
        match self.process(generator, &unit).await {
            Ok(outcome) => {
                tracing::info!(
                    file = %key,
                    renamed = outcome.renamed,
                    unchanged = outcome.unchanged,
                    "file done"
                );
                self.outcomes.lock().insert(key, outcome);
            }
            Err(e) => {
                tracing::error!(file = %key, error = %e, "file failed");
                self.record_failure(key, e.to_string());
            }
        }
    }

    fn record_failure(&self, unit_id: String, reason: String) {
        self.failures.lock().push(UnitFailure {
            unit: unit_id,
            reason,
        });
    }
}

/// Rename one oracle prompt and score it against the ground truth
struct EvalJob {
    settings: RenameSettings,
    scorer: Option<Arc<dyn ReadabilityScorer>>,
    metrics: MetricsAccumulator,
}

#[async_trait::async_trait]
impl UnitJob for EvalJob {
    type Unit = OracleRecord;

    fn unit_id(&self, unit: &OracleRecord) -> String {
        unit.id.clone()
    }

    async fn run(&self, generator: &dyn TextGenerator, record: OracleRecord) {
        let started = Instant::now();
        let prompt = unwrap(&record.prompt);
        let oracle = unwrap(&record.response);
        let name = declared_method_name(&prompt).unwrap_or_else(|| record.id.clone());

        let case = RenameOrchestrator::new(generator, &self.settings)
            .rename(&name, &prompt)
            .await;
        if !case.is_clean() {
            let reason = case.failure().unwrap_or("rename not accepted").to_string();
            tracing::info!(record = %record.id, reason = %reason, "record not scored");
            self.metrics.record_failure(record.id, reason);
            return;
        }

        let mut pair = evaluate(&oracle, case.code());
        if let Some(scorer) = &self.scorer {
            pair = pair.with_readability(score_or_zero(scorer.as_ref(), case.code()).await);
        }
        pair.elapsed_s = started.elapsed().as_secs_f64();
        tracing::debug!(record = %record.id, f1 = pair.f1, cer = pair.cer, "record scored");
        self.metrics.push(record.id, pair);
    }

    fn record_failure(&self, unit_id: String, reason: String) {
        self.metrics.record_failure(unit_id, reason);
    }
}

/// Entry point for every run mode
pub struct BatchDriver<'a> {
    config: &'a PipelineConfig,
    factory: GeneratorFactory,
    scorer: Option<Arc<dyn ReadabilityScorer>>,
    output_dir: PathBuf,
    overwrite: bool,
}

impl<'a> BatchDriver<'a> {
    /// Create driver writing under `output_dir`
    #[must_use]
    pub fn new(
        config: &'a PipelineConfig,
        factory: GeneratorFactory,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            config,
            factory,
            scorer: None,
            output_dir: output_dir.into(),
            overwrite: false,
        }
    }

    /// Replace existing outputs instead of failing
    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Score readability of every accepted prediction in eval mode
    #[must_use]
    pub fn with_scorer(mut self, scorer: Arc<dyn ReadabilityScorer>) -> Self {
        self.scorer = Some(scorer);
        self
    }

    #[inline]
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Rename the tests of one file
    ///
    /// # Errors
    /// - `BatchError` only if the report cannot be written; a missing
    ///   file is a recorded unit failure
    pub async fn run_single(&self, file: &Path) -> Result<RunReport, BatchError> {
        self.run_files(vec![file.to_path_buf()]).await
    }

    /// Rename the tests of every `.java` file in `dir`
    ///
    /// # Errors
    /// - `BatchError::NotFound` if `dir` does not exist
    pub async fn run_dir(&self, dir: &Path) -> Result<RunReport, BatchError> {
        let files = list_files(dir, "java")?;
        if files.is_empty() {
            tracing::warn!(dir = %dir.display(), "no .java files found");
        }
        self.run_files(files).await
    }

    /// Rename the tests of `files` and write `rename_report.json`
    ///
    /// # Errors
    /// - `BatchError` if the report cannot be written
    pub async fn run_files(&self, files: Vec<PathBuf>) -> Result<RunReport, BatchError> {
        let started = Instant::now();
        let job = Arc::new(FileJob {
            settings: self.config.rename_settings(),
            output_dir: self.output_dir.clone(),
            overwrite: self.overwrite,
            outcomes: Mutex::new(BTreeMap::new()),
            failures: Mutex::new(Vec::new()),
        });
        tracing::info!(files = files.len(), "rename run started");
        run_pool(
            Arc::clone(&job),
            files,
            self.config.worker_count(),
            &self.factory,
        )
        .await;

        let report = job.finish(started.elapsed());
        let path = self.write_report(REPORT_FILE_NAME, &report)?;
        tracing::info!(
            processed = report.processed,
            failed = report.failed,
            tests = report.tests_found(),
            renamed = report.renamed(),
            report = %path.display(),
            "rename run finished"
        );
        Ok(report)
    }

    /// Score renames of every oracle record under `dir`
    ///
    /// Reads `.jsonl` files in sorted order, capped by
    /// `AMOUNT_OF_EVAL_SAMPLES`, and writes
    /// `<METRICS_NAME>_benchmark_results.json`.
    ///
    /// # Errors
    /// - `BatchError::NotFound` if `dir` does not exist
    /// - `BatchError` if the results cannot be written
    pub async fn run_eval(&self, dir: &Path) -> Result<DatasetMetrics, BatchError> {
        let started = Instant::now();
        let mut files = list_files(dir, "jsonl")?;
        if let Some(cap) = self.config.eval_sample_cap() {
            files.truncate(cap);
        }

        let job = Arc::new(EvalJob {
            settings: self.config.rename_settings(),
            scorer: self.scorer.clone(),
            metrics: MetricsAccumulator::new(),
        });

        let mut records = Vec::new();
        for file in &files {
            match load_oracle_file(file) {
                Ok(loaded) => records.extend(loaded),
                Err(e) => {
                    tracing::error!(file = %file.display(), error = %e, "oracle file failed");
                    job.metrics.record_failure(file.display().to_string(), e.to_string());
                }
            }
        }
        tracing::info!(files = files.len(), records = records.len(), "eval run started");

        run_pool(
            Arc::clone(&job),
            records,
            self.config.worker_count(),
            &self.factory,
        )
        .await;

        let metrics = job.metrics.finish(started.elapsed());
        let path = self.write_report(&self.config.benchmark_file_name(), &metrics)?;
        tracing::info!(
            scored = metrics.scored,
            failed = metrics.failed,
            f1 = metrics.f1,
            results = %path.display(),
            "eval run finished"
        );
        Ok(metrics)
    }

    fn write_report<T: Serialize>(&self, file_name: &str, report: &T) -> Result<PathBuf, BatchError> {
        let path = self.output_dir.join(file_name);
        let json = serde_json::to_string_pretty(report)?;
        write_output(&path, &json, true)?;
        Ok(path)
    }
}
