//! Rejection-sampling loop producing exactly `target_count` accepted samples

use super::config::{AugmentConfig, CorpusPaths};
use super::corpus::{Corpus, SourceImage};
use crate::error::{AbandonReason, AttemptError, DriverError};
use crate::sample::LabeledImage;
use crate::traits::Augment;
use crate::utils::ImageUtils;
use autolabel_core::{BoxValidator, LabelError, read_labels, write_labels};
use log::{debug, info, warn};
use rand::Rng;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Abandoned attempts per reason.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AbandonCounts {
    pub missing_label: usize,
    pub decode: usize,
    pub label: usize,
    pub empty_labels: usize,
    pub transform: usize,
    pub empty_result: usize,
    pub io: usize,
}

impl AbandonCounts {
    pub fn record(&mut self, reason: AbandonReason) {
        let slot = match reason {
            AbandonReason::MissingLabel => &mut self.missing_label,
            AbandonReason::Decode => &mut self.decode,
            AbandonReason::Label => &mut self.label,
            AbandonReason::EmptyLabels => &mut self.empty_labels,
            AbandonReason::Transform => &mut self.transform,
            AbandonReason::EmptyResult => &mut self.empty_result,
            AbandonReason::Io => &mut self.io,
        };
        *slot += 1;
    }

    pub fn total(&self) -> usize {
        self.missing_label
            + self.decode
            + self.label
            + self.empty_labels
            + self.transform
            + self.empty_result
            + self.io
    }
}

/// One persisted image/label pair and the source it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputPair {
    pub source: PathBuf,
    pub image: PathBuf,
    pub label: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub requested: usize,
    pub accepted: usize,
    pub attempts: usize,
    pub abandoned: AbandonCounts,
    pub outputs: Vec<OutputPair>,
}

impl RunReport {
    fn new(requested: usize) -> Self {
        Self {
            requested,
            accepted: 0,
            attempts: 0,
            abandoned: AbandonCounts::default(),
            outputs: Vec::with_capacity(requested),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.accepted == self.requested
    }
}

/// Sources still eligible for sampling.
struct SourcePool {
    live: Vec<usize>,
}

impl SourcePool {
    fn new(len: usize) -> Self {
        Self {
            live: (0..len).collect(),
        }
    }

    /// Uniform draw with replacement.
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<usize> {
        if self.live.is_empty() {
            return None;
        }
        Some(self.live[rng.gen_range(0..self.live.len())])
    }

    fn retire(&mut self, index: usize) {
        if let Some(pos) = self.live.iter().position(|&i| i == index) {
            self.live.swap_remove(pos);
        }
    }
}

struct Progress {
    target: usize,
    step: usize,
}

impl Progress {
    fn new(target: usize) -> Self {
        Self {
            target,
            step: (target / 10).max(1),
        }
    }

    fn record(&self, accepted: usize) {
        if accepted % self.step == 0 || accepted == self.target {
            info!("Generated {}/{} augmented samples", accepted, self.target);
        }
    }
}

/// Drives an [`Augment`] implementation over a corpus until the target
/// number of samples has been written.
pub struct AugmentationDriver<'a, A: Augment> {
    config: &'a AugmentConfig,
    augmenter: &'a A,
    paths: &'a CorpusPaths,
    validator: BoxValidator,
}

impl<'a, A: Augment> AugmentationDriver<'a, A> {
    pub fn new(config: &'a AugmentConfig, augmenter: &'a A, paths: &'a CorpusPaths) -> Self {
        Self {
            config,
            augmenter,
            paths,
            validator: config.validator(),
        }
    }

    pub fn run<R: Rng + ?Sized>(
        &self,
        corpus: &Corpus,
        rng: &mut R,
    ) -> Result<RunReport, DriverError> {
        self.check_corpus(corpus)?;
        self.prepare_output_dirs()?;

        let target = self.config.target_count;
        let budget = self.config.attempt_budget();
        let progress = Progress::new(target);
        let mut report = RunReport::new(target);
        let mut pool = SourcePool::new(corpus.len());

        while report.accepted < target && report.attempts < budget {
            let Some(index) = pool.sample(rng) else {
                return Err(DriverError::NoValidSources {
                    attempts: report.attempts,
                });
            };
            let source = &corpus.sources()[index];
            report.attempts += 1;

            let outcome = self
                .prepare(source, rng)
                .and_then(|sample| self.persist(source, &sample, report.accepted));

            match outcome {
                Ok(pair) => {
                    report.outputs.push(pair);
                    report.accepted += 1;
                    progress.record(report.accepted);
                }
                Err(err) => self.abandon(&mut report, &mut pool, index, source, &err),
            }
        }

        self.finish(report)
    }

    fn check_corpus(&self, corpus: &Corpus) -> Result<(), DriverError> {
        if corpus.is_empty() {
            return Err(DriverError::EmptyCorpus(corpus.image_dir().to_path_buf()));
        }
        Ok(())
    }

    fn prepare_output_dirs(&self) -> Result<(), DriverError> {
        for dir in [&self.paths.output_image_dir, &self.paths.output_label_dir] {
            fs::create_dir_all(dir).map_err(|source| DriverError::Io {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Load, augment and filter one source; nothing touches the disk.
    fn prepare<R: Rng + ?Sized>(
        &self,
        source: &SourceImage,
        rng: &mut R,
    ) -> Result<LabeledImage, AttemptError> {
        if !source.label_path.is_file() {
            return Err(AttemptError::MissingLabel(source.label_path.clone()));
        }

        let image = ImageUtils::load_rgb(&source.image_path).map_err(|err| AttemptError::Decode {
            path: source.image_path.clone(),
            source: err,
        })?;

        let labels = read_labels(&source.label_path)?;
        if labels.is_empty() {
            return Err(AttemptError::EmptyLabels(source.label_path.clone()));
        }

        let augmented = self
            .augmenter
            .augment(LabeledImage::new(image, labels), rng)?;

        // validate what will actually be written
        let filtered = augmented.retain_labels(|label| self.validator.is_valid(&label.bbox.rounded()));
        if filtered.is_empty() {
            return Err(AttemptError::EmptyResult);
        }

        Ok(filtered)
    }

    /// Write `<stem>_aug_<index>` image then labels; a failed label write
    /// removes the image again.
    fn persist(
        &self,
        source: &SourceImage,
        sample: &LabeledImage,
        index: usize,
    ) -> Result<OutputPair, AttemptError> {
        let name = format!("{}_aug_{}", source.stem, index);
        let image_path = self
            .paths
            .output_image_dir
            .join(format!("{}.{}", name, self.config.output_extension));
        let label_path = self.paths.output_label_dir.join(format!("{name}.txt"));

        ImageUtils::save_rgb(&sample.image, &image_path).map_err(|err| AttemptError::Encode {
            path: image_path.clone(),
            source: err,
        })?;

        if let Err(err) = write_labels(&label_path, sample.labels()) {
            remove_quietly(&image_path);
            return Err(match err {
                LabelError::Io { path, source } => AttemptError::Io { path, source },
                other => AttemptError::Label(other),
            });
        }

        Ok(OutputPair {
            source: source.image_path.clone(),
            image: image_path,
            label: label_path,
        })
    }

    fn abandon(
        &self,
        report: &mut RunReport,
        pool: &mut SourcePool,
        index: usize,
        source: &SourceImage,
        err: &AttemptError,
    ) {
        let reason = err.reason();
        report.abandoned.record(reason);

        match reason {
            AbandonReason::Decode | AbandonReason::Label | AbandonReason::Io => {
                warn!("{}: {}", source.image_path.display(), error_chain(err));
            }
            _ => debug!("Abandoned attempt on {}: {}", source.image_path.display(), err),
        }

        if reason.is_source_fault() {
            debug!("Retiring source {}", source.image_path.display());
            pool.retire(index);
        }
    }

    fn finish(&self, report: RunReport) -> Result<RunReport, DriverError> {
        if report.is_complete() {
            info!(
                "Finished: {} samples in {} attempts",
                report.accepted, report.attempts
            );
            return Ok(report);
        }

        if report.accepted == 0 {
            return Err(DriverError::NoValidSources {
                attempts: report.attempts,
            });
        }

        warn!(
            "Attempt budget exhausted: produced {} of {} samples in {} attempts",
            report.accepted, report.requested, report.attempts
        );
        Ok(report)
    }
}

#[cfg(feature = "parallel")]
impl<'a, A: Augment + Sync> AugmentationDriver<'a, A> {
    /// Parallel variant of [`run`](Self::run).
    ///
    /// Attempts are prepared in batches on the rayon pool, each with its
    /// own RNG seeded from `seed`, and persisted sequentially so output
    /// indices are assigned in batch order.
    pub fn run_parallel(&self, corpus: &Corpus, seed: u64) -> Result<RunReport, DriverError> {
        use rand::rngs::StdRng;
        use rand::{RngCore, SeedableRng};
        use rayon::prelude::*;

        self.check_corpus(corpus)?;
        self.prepare_output_dirs()?;

        let target = self.config.target_count;
        let budget = self.config.attempt_budget();
        let progress = Progress::new(target);
        let mut report = RunReport::new(target);
        let mut pool = SourcePool::new(corpus.len());
        let mut master = StdRng::seed_from_u64(seed);

        while report.accepted < target && report.attempts < budget {
            let remaining = target - report.accepted;
            let batch_len = (remaining * 2).min(budget - report.attempts);

            let mut picks = Vec::with_capacity(batch_len);
            for _ in 0..batch_len {
                let Some(index) = pool.sample(&mut master) else {
                    break;
                };
                picks.push((index, master.next_u64()));
            }
            if picks.is_empty() {
                return Err(DriverError::NoValidSources {
                    attempts: report.attempts,
                });
            }

            let prepared: Vec<_> = picks
                .into_par_iter()
                .map(|(index, attempt_seed)| {
                    let mut rng = StdRng::seed_from_u64(attempt_seed);
                    (index, self.prepare(&corpus.sources()[index], &mut rng))
                })
                .collect();

            for (index, outcome) in prepared {
                if report.accepted == target {
                    break;
                }
                let source = &corpus.sources()[index];
                report.attempts += 1;

                match outcome.and_then(|sample| self.persist(source, &sample, report.accepted)) {
                    Ok(pair) => {
                        report.outputs.push(pair);
                        report.accepted += 1;
                        progress.record(report.accepted);
                    }
                    Err(err) => self.abandon(&mut report, &mut pool, index, source, &err),
                }
            }
        }

        self.finish(report)
    }
}

fn remove_quietly(path: &Path) {
    if let Err(err) = fs::remove_file(path) {
        warn!("Failed to remove {}: {}", path.display(), err);
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
