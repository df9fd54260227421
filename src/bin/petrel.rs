extern crate petrel_impute;
use petrel_impute::cli::{build_cli, set_log_level};
use petrel_impute::model::genetic_map::{
    GeneticMap, InterpolatedGeneticMap, UniformGeneticMap,
};
use petrel_impute::model::marker::Marker;
use petrel_impute::model::samples::Samples;
use petrel_impute::processing::imputation_engine::{start_imputation_engine, ImputationConfig};
use petrel_impute::utils::errors::ImputationError;
use petrel_impute::window::emission::{MarkerEmission, TargetEmission, VecEmissionSource};

#[macro_use]
extern crate log;

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process;
use std::sync::Arc;

fn main() {
    let mut app = build_cli();
    let matches = app.clone().get_matches();

    match matches.subcommand_name() {
        Some("impute") => {
            let m = matches.subcommand_matches("impute").unwrap();
            set_log_level(m, true);
            match run_impute(m) {
                Ok(_) => info!("Imputation complete."),
                Err(e) => {
                    eprintln!("{}", e);
                    process::exit(1);
                }
            }
        }
        _ => {
            app.print_help().unwrap();
            println!();
        }
    }
}

fn run_impute(m: &clap::ArgMatches) -> anyhow::Result<()> {
    let config = ImputationConfig::generate_from_clap(m)?;
    rayon::ThreadPoolBuilder::new()
        .num_threads(config.n_threads)
        .build_global()
        .expect("Unable to configure the global thread pool");

    let sites_path = m.get_one::<String>("sites").unwrap();
    let (source, chrom_indices) = read_site_table(Path::new(sites_path))?;

    let map: Box<dyn GeneticMap> = match m.get_one::<String>("map") {
        Some(path) => Box::new(read_map_anchors(Path::new(path), &chrom_indices)?),
        None => Box::new(UniformGeneticMap::new(*m.get_one::<f64>("cm-per-mb").unwrap())),
    };

    start_imputation_engine(source, map.as_ref(), &config, None)
}

/// Read a pre-tokenized site table. Two directive lines name the samples:
///
/// ```text
/// ##ref-samples=r1,r2
/// ##target-samples=t1
/// chr20  100  rs1  A,G  0110  01
/// chr20  150  .    C,T  0011  -
/// ```
///
/// Data columns are chromosome, position, id, comma-separated alleles, one
/// allele digit per reference haplotype, and one per target haplotype, with
/// `-` in the target column marking a marker not genotyped in the target.
/// VCF input is converted to this form by an external tokenizer.
/// Also returns the chromosome-name index assignment so the genetic map
/// can share it.
fn read_site_table(
    path: &Path,
) -> anyhow::Result<(VecEmissionSource, HashMap<String, usize>)> {
    let reader = BufReader::new(File::open(path).map_err(|e| {
        ImputationError::ConfigError(format!("Unable to open {}: {}", path.display(), e))
    })?);
    let mut ref_samples: Option<Samples> = None;
    let mut target_samples: Option<Samples> = None;
    let mut chrom_indices: HashMap<String, usize> = HashMap::new();
    let mut chrom_names: Vec<Arc<String>> = Vec::new();
    let mut emissions = Vec::new();

    for (line_number, line) in reader.lines().enumerate() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let format_err = |msg: String| {
            ImputationError::FormatError(format!(
                "{}:{}: {}",
                path.display(),
                line_number + 1,
                msg
            ))
        };
        if let Some(ids) = line.strip_prefix("##ref-samples=") {
            ref_samples = Some(Samples::new(ids.split(',').map(String::from).collect()));
            continue;
        }
        if let Some(ids) = line.strip_prefix("##target-samples=") {
            target_samples = Some(Samples::new(ids.split(',').map(String::from).collect()));
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(format_err(format!("Expected 6 columns, found {}", fields.len())).into());
        }
        let ref_samples = ref_samples
            .as_ref()
            .ok_or_else(|| format_err(String::from("Missing ##ref-samples directive")))?;
        let target_samples = target_samples
            .as_ref()
            .ok_or_else(|| format_err(String::from("Missing ##target-samples directive")))?;

        let chrom_index = match chrom_indices.get(fields[0]) {
            Some(&index) => index,
            None => {
                let index = chrom_names.len();
                chrom_indices.insert(fields[0].to_string(), index);
                chrom_names.push(Arc::new(fields[0].to_string()));
                index
            }
        };
        let pos: u64 = fields[1]
            .parse()
            .map_err(|_| format_err(format!("Invalid position {}", fields[1])))?;
        let id = match fields[2] {
            "." => None,
            id => Some(id.to_string()),
        };
        let alleles: Vec<String> = fields[3].split(',').map(String::from).collect();
        let marker = Marker::new(
            chrom_index,
            chrom_names[chrom_index].clone(),
            pos,
            id,
            alleles,
        );

        let parse_haps = |column: &str, expected: usize| -> Result<Vec<u8>, ImputationError> {
            let alleles: Option<Vec<u8>> = column
                .chars()
                .map(|c| c.to_digit(10).map(|d| d as u8))
                .collect();
            match alleles {
                Some(alleles) if alleles.len() == expected => Ok(alleles),
                _ => Err(format_err(format!(
                    "Expected {} haplotype alleles, found '{}'",
                    expected, column
                ))),
            }
        };
        let check_range = |alleles: &[u8]| -> Result<(), ImputationError> {
            match alleles.iter().find(|&&a| a as usize >= marker.n_alleles()) {
                Some(a) => Err(format_err(format!(
                    "Allele index {} out of range for {} alleles",
                    a,
                    marker.n_alleles()
                ))),
                None => Ok(()),
            }
        };
        let ref_alleles = parse_haps(fields[4], 2 * ref_samples.n_samples())?;
        check_range(&ref_alleles)?;
        let target = match fields[5] {
            "-" | "." => None,
            column => {
                let alleles = parse_haps(column, 2 * target_samples.n_samples())?;
                check_range(&alleles)?;
                Some(TargetEmission::PhasedGenotypes(alleles))
            }
        };
        emissions.push(MarkerEmission::new(marker, ref_alleles, target));
    }

    match (ref_samples, target_samples) {
        (Some(ref_samples), Some(target_samples)) => {
            if emissions.is_empty() {
                return Err(ImputationError::ConfigError(format!(
                    "{} contains no markers",
                    path.display()
                ))
                .into());
            }
            Ok((
                VecEmissionSource::new(ref_samples, target_samples, emissions),
                chrom_indices,
            ))
        }
        _ => Err(ImputationError::FormatError(format!(
            "{} is missing its sample directives",
            path.display()
        ))
        .into()),
    }
}

// Anchor rows are whitespace-separated: chromosome, bp position, cM.
// Chromosome names resolve through the site table's index assignment;
// chromosomes with no markers are skipped.
fn read_map_anchors(
    path: &Path,
    chrom_indices: &HashMap<String, usize>,
) -> anyhow::Result<InterpolatedGeneticMap> {
    let reader = BufReader::new(File::open(path).map_err(|e| {
        ImputationError::ConfigError(format!("Unable to open {}: {}", path.display(), e))
    })?);
    let mut map = InterpolatedGeneticMap::new();
    for line in reader.lines() {
        let line = line?;
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 3 {
            return Err(ImputationError::FormatError(format!(
                "Map row must have 3 columns: '{}'",
                line
            ))
            .into());
        }
        let chrom = match chrom_indices.get(fields[0]) {
            Some(&index) => index,
            None => {
                debug!("Skipping map anchors for unused chromosome {}", fields[0]);
                continue;
            }
        };
        let bp: u64 = fields[1].parse().map_err(|_| {
            ImputationError::FormatError(format!("Invalid map position {}", fields[1]))
        })?;
        let cm: f64 = fields[2].parse().map_err(|_| {
            ImputationError::FormatError(format!("Invalid map cM value {}", fields[2]))
        })?;
        map.add_anchor(chrom, bp, cm);
    }
    Ok(map)
}
