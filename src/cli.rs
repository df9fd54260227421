use clap::{crate_version, Arg, ArgAction, Command};
use env_logger::Builder;
use log::LevelFilter;

pub fn build_cli() -> Command {
    Command::new("petrel")
        .version(crate_version!())
        .about("Reference-panel genotype imputation using a windowed Li-Stephens haplotype model")
        .arg_required_else_help(true)
        .subcommand(impute_command())
}

fn impute_command() -> Command {
    Command::new("impute")
        .about("Impute ungenotyped markers in phased target haplotypes from a phased reference panel")
        .arg(
            Arg::new("sites")
                .long("sites")
                .help("Pre-tokenized site table with reference and target haplotype alleles")
                .required(true),
        )
        .arg(
            Arg::new("map")
                .long("map")
                .help("Genetic map anchor file (chrom, bp, cM per line); a uniform rate is used when absent"),
        )
        .arg(
            Arg::new("cm-per-mb")
                .long("cm-per-mb")
                .help("Uniform recombination rate used without a genetic map")
                .value_parser(clap::value_parser!(f64))
                .default_value("1.0"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .help("Output file prefix")
                .default_value("petrel"),
        )
        .arg(
            Arg::new("window")
                .long("window")
                .help("Window length in markers")
                .value_parser(clap::value_parser!(usize))
                .default_value("50000"),
        )
        .arg(
            Arg::new("window-cm")
                .long("window-cm")
                .help("Window length in cM; overrides the marker-count window")
                .value_parser(clap::value_parser!(f64)),
        )
        .arg(
            Arg::new("overlap")
                .long("overlap")
                .help("Marker overlap between consecutive windows")
                .value_parser(clap::value_parser!(usize))
                .default_value("3000"),
        )
        .arg(
            Arg::new("cluster")
                .long("cluster")
                .help("Maximum cM span of a target-marker cluster")
                .value_parser(clap::value_parser!(f64))
                .default_value("0.005"),
        )
        .arg(
            Arg::new("err")
                .long("err")
                .help("Per-marker allele error rate")
                .value_parser(clap::value_parser!(f64))
                .default_value("0.0001"),
        )
        .arg(
            Arg::new("ne")
                .long("ne")
                .help("Effective population size")
                .value_parser(clap::value_parser!(f64))
                .default_value("1000000"),
        )
        .arg(
            Arg::new("threads")
                .long("threads")
                .short('t')
                .help("Number of worker threads for the per-haplotype HMM fan-out")
                .value_parser(clap::value_parser!(usize))
                .default_value("1"),
        )
        .arg(
            Arg::new("low-mem")
                .long("low-mem")
                .help("Bound forward storage with the checkpointed buffer")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("gprobs")
                .long("gprobs")
                .help("Emit the GP field")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-impute")
                .long("no-impute")
                .help("Pass observed genotypes through instead of imputing ungenotyped markers")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("exclude-samples")
                .long("exclude-samples")
                .help("Target sample identifiers to drop")
                .num_args(1..)
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("exclude-from-ref")
                .long("exclude-from-ref")
                .help("Reference sample identifiers to drop")
                .num_args(1..)
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Print debug logging information")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .help("Unless there is an error, do not print log messages")
                .action(ArgAction::SetTrue),
        )
}

pub fn set_log_level(matches: &clap::ArgMatches, is_last: bool) {
    let mut log_level = LevelFilter::Info;
    let mut specified = false;
    if matches.get_flag("verbose") {
        specified = true;
        log_level = LevelFilter::Debug;
    }
    if matches.get_flag("quiet") {
        specified = true;
        log_level = LevelFilter::Error;
    }
    if specified || is_last {
        let mut builder = Builder::new();
        builder.filter_level(log_level);
        if let Ok(env_filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&env_filter);
        }
        if builder.try_init().is_err() {
            panic!("Failed to set log level - has it been specified multiple times?")
        }
    }
    if is_last {
        info!("petrel version {}", crate_version!());
    }
}
