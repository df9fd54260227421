use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use crate::estimation::ibd_segment::IbdSegmentSource;
use crate::estimation::window_writer::WindowWriter;
use crate::imputation::imputation_data::ImputationData;
use crate::imputation::li_stephens_hmm::LiStephensHmm;
use crate::model::genetic_map::GeneticMap;
use crate::model::genotype_values::GenotypeValues;
use crate::utils::errors::ImputationError;
use crate::window::current_data::CurrentData;
use crate::window::emission::{EmissionSource, ExcludeSamplesSource};
use crate::window::marker_window::MarkerWindowIterator;

/// Runtime parameters of the imputation engine.
#[derive(Debug, Clone)]
pub struct ImputationConfig {
    /// Maximum genetic span of a target-marker cluster in cM.
    pub cluster_cm: f64,
    /// Per-marker allele error rate.
    pub err_rate: f64,
    /// Effective population size.
    pub ne: f64,
    pub n_threads: usize,
    /// Requested marker overlap between consecutive windows.
    pub overlap: usize,
    /// Window length in markers, or in cM when `window_cm` is set.
    pub window_size: usize,
    pub window_cm: Option<f64>,
    /// Bound the forward buffer to O(sqrt(nClusters)) columns.
    pub low_mem: bool,
    /// Emit the GP field.
    pub gprobs: bool,
    /// Impute ungenotyped markers; otherwise observed genotypes pass
    /// through.
    pub impute: bool,
    pub exclude_samples: HashSet<String>,
    pub exclude_from_ref: HashSet<String>,
    pub out_prefix: PathBuf,
}

impl Default for ImputationConfig {
    fn default() -> Self {
        ImputationConfig {
            cluster_cm: 0.005,
            err_rate: 1e-4,
            ne: 1e6,
            n_threads: 1,
            overlap: 3000,
            window_size: 50000,
            window_cm: None,
            low_mem: false,
            gprobs: false,
            impute: true,
            exclude_samples: HashSet::new(),
            exclude_from_ref: HashSet::new(),
            out_prefix: PathBuf::from("petrel"),
        }
    }
}

impl ImputationConfig {
    pub fn generate_from_clap(m: &clap::ArgMatches) -> Result<ImputationConfig, ImputationError> {
        let to_set = |id: &str| -> HashSet<String> {
            m.get_many::<String>(id)
                .map(|values| values.cloned().collect())
                .unwrap_or_default()
        };
        let config = ImputationConfig {
            cluster_cm: *m.get_one::<f64>("cluster").unwrap(),
            err_rate: *m.get_one::<f64>("err").unwrap(),
            ne: *m.get_one::<f64>("ne").unwrap(),
            n_threads: *m.get_one::<usize>("threads").unwrap(),
            overlap: *m.get_one::<usize>("overlap").unwrap(),
            window_size: *m.get_one::<usize>("window").unwrap(),
            window_cm: m.get_one::<f64>("window-cm").copied(),
            low_mem: m.get_flag("low-mem"),
            gprobs: m.get_flag("gprobs"),
            impute: !m.get_flag("no-impute"),
            exclude_samples: to_set("exclude-samples"),
            exclude_from_ref: to_set("exclude-from-ref"),
            out_prefix: PathBuf::from(m.get_one::<String>("output").unwrap()),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ImputationError> {
        if !(self.cluster_cm > 0.0) {
            return Err(ImputationError::ConfigError(format!(
                "cluster must be positive: {}",
                self.cluster_cm
            )));
        }
        if !(0.0..=1.0).contains(&self.err_rate) {
            return Err(ImputationError::ConfigError(format!(
                "err must be in [0, 1]: {}",
                self.err_rate
            )));
        }
        if !(self.ne > 0.0) {
            return Err(ImputationError::ConfigError(format!(
                "ne must be positive: {}",
                self.ne
            )));
        }
        if self.overlap >= self.window_size {
            return Err(ImputationError::ConfigError(format!(
                "overlap ({}) must be less than window size ({})",
                self.overlap, self.window_size
            )));
        }
        if let Some(cm) = self.window_cm {
            if !(cm > 0.0) {
                return Err(ImputationError::ConfigError(format!(
                    "window cM length must be positive: {}",
                    cm
                )));
            }
        }
        if self.n_threads == 0 {
            return Err(ImputationError::ConfigError(String::from(
                "threads must be positive",
            )));
        }
        Ok(())
    }
}

/// Drives windows to completion: advances the marker window, builds the
/// per-window view and HMM inputs, fans the per-target-haplotype HMM work
/// out over the rayon pool, and threads the results through the window
/// writer. The writer is only touched from this driver.
pub struct ImputationEngine<'a, S: EmissionSource> {
    config: &'a ImputationConfig,
    map: &'a dyn GeneticMap,
    windows: MarkerWindowIterator<ExcludeSamplesSource<S>>,
    writer: WindowWriter,
    ibd_source: Option<&'a mut dyn IbdSegmentSource>,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a, S: EmissionSource> ImputationEngine<'a, S> {
    pub fn new(
        source: S,
        map: &'a dyn GeneticMap,
        config: &'a ImputationConfig,
        ibd_source: Option<&'a mut dyn IbdSegmentSource>,
    ) -> anyhow::Result<ImputationEngine<'a, S>> {
        config.validate()?;
        let source =
            ExcludeSamplesSource::new(source, &config.exclude_from_ref, &config.exclude_samples);
        if source.target_samples().n_samples() == 0 {
            return Err(ImputationError::ConfigError(String::from(
                "No target samples remain after exclusions",
            ))
            .into());
        }
        if source.ref_samples().n_samples() == 0 {
            return Err(ImputationError::ConfigError(String::from(
                "No reference samples remain after exclusions",
            ))
            .into());
        }
        let writer = WindowWriter::new(
            &config.out_prefix,
            &format!("petrel-impute {}", clap::crate_version!()),
            source.target_samples().clone(),
            config.gprobs,
        )
        .with_context(|| format!("Unable to create output files at {:?}", config.out_prefix))?;
        Ok(ImputationEngine {
            config,
            map,
            windows: MarkerWindowIterator::new(source),
            writer,
            ibd_source,
            cancel: None,
        })
    }

    /// Cooperative cancellation, checked at window boundaries only.
    pub fn set_cancel_token(&mut self, cancel: Arc<AtomicBool>) {
        self.cancel = Some(cancel);
    }

    pub fn run(mut self) -> anyhow::Result<()> {
        let start = Instant::now();
        let progress = ProgressBar::new_spinner();
        progress.set_style(
            ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")
                .expect("Progress bar template is valid"),
        );

        if !self.windows.can_advance_window() {
            return Err(
                ImputationError::ConfigError(String::from("Input contains no markers")).into(),
            );
        }
        let mut window_index = 0usize;
        while self.windows.can_advance_window() {
            if let Some(cancel) = &self.cancel {
                if cancel.load(Ordering::Relaxed) {
                    warn!("Imputation cancelled after {} windows", window_index);
                    break;
                }
            }
            match self.config.window_cm {
                Some(cm) => self.windows.advance_by_cm(self.config.overlap, cm, self.map),
                None => self
                    .windows
                    .advance_by_size(self.config.overlap, self.config.window_size),
            }
            let cd = CurrentData::new(
                window_index,
                self.windows.window(),
                self.windows.source().ref_samples(),
                self.windows.source().target_samples(),
                self.windows.overlap(),
                self.config.overlap,
                self.windows.last_window_on_chrom(),
            )?;
            self.check_window(&cd)?;
            progress.set_message(format!(
                "window {}: {} markers on {}",
                window_index,
                cd.n_markers(),
                cd.markers().marker(0).chrom()
            ));

            if self.config.impute {
                self.impute_window(&cd)?;
            } else {
                self.passthrough_window(&cd)?;
            }
            if let Some(source) = self.ibd_source.as_deref_mut() {
                let segments = source.find_segments(&cd);
                self.writer.print_ibd(&cd, segments)?;
            }
            progress.tick();
            window_index += 1;
        }
        self.writer.close()?;
        progress.finish_and_clear();
        info!(
            "Processed {} windows ({} markers) in {:.1}s",
            window_index,
            self.windows.cum_marker_cnt(),
            start.elapsed().as_secs_f64()
        );
        Ok(())
    }

    // Cross-component consistency is re-checked at window entry; a
    // failure here indicates a bug in an upstream component.
    fn check_window(&self, cd: &CurrentData) -> Result<(), ImputationError> {
        if cd.markers().indices_of(cd.target_markers()).is_none() {
            return Err(ImputationError::ConsistencyError(format!(
                "Window {}: target markers are not a subsequence of reference markers",
                cd.window_index()
            )));
        }
        if cd.target_samples() != self.writer.samples() {
            return Err(ImputationError::ConsistencyError(format!(
                "Window {}: target sample set changed between windows",
                cd.window_index()
            )));
        }
        Ok(())
    }

    fn impute_window(&mut self, cd: &CurrentData) -> anyhow::Result<()> {
        if cd.n_target_markers() == 0 {
            return Err(ImputationError::ConsistencyError(format!(
                "Window {} contains no target markers",
                cd.window_index()
            ))
            .into());
        }
        let data = ImputationData::new(
            cd,
            self.map,
            self.config.cluster_cm,
            self.config.err_rate,
            self.config.ne,
        );
        debug!(
            "Window {}: {} clusters over {} target markers",
            cd.window_index(),
            data.n_clusters(),
            cd.n_target_markers()
        );
        let low_mem = self.config.low_mem;
        // one engine per worker; results collect in haplotype order so
        // output bytes do not depend on scheduling
        let allele_probs: Vec<Vec<f32>> = (0..data.n_target_haps())
            .into_par_iter()
            .map_init(
                || LiStephensHmm::new(&data, low_mem),
                |hmm, hap| hmm.impute(hap),
            )
            .collect();
        self.writer
            .print(cd, &allele_probs, true, self.config.gprobs)?;
        Ok(())
    }

    // Without imputation the observed phased genotypes pass through as
    // point-mass genotype probabilities at the target markers.
    fn passthrough_window(&mut self, cd: &CurrentData) -> anyhow::Result<()> {
        let target_haps = cd.target_sample_hap_pairs();
        let gv = GenotypeValues::from_phased_alleles(
            cd.target_markers().clone(),
            cd.target_samples().clone(),
            &|marker, sample| {
                (
                    target_haps.allele1(marker, sample),
                    target_haps.allele2(marker, sample),
                )
            },
        );
        self.writer.print_gv(cd, &gv)?;
        Ok(())
    }
}

/// Run the engine over the emission stream to completion. The
/// per-haplotype HMM fan-out uses the ambient rayon pool.
pub fn start_imputation_engine<'a, S: EmissionSource>(
    source: S,
    map: &'a dyn GeneticMap,
    config: &'a ImputationConfig,
    ibd_source: Option<&'a mut dyn IbdSegmentSource>,
) -> anyhow::Result<()> {
    let engine = ImputationEngine::new(source, map, config, ibd_source)?;
    engine.run()
}
