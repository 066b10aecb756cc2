use super::VERSION;
use crate::error::BenchPlotError;
use crate::loader::load;
use crate::plot::{plot_file_results_as, PlotOptions, PlotOutcome};
use crate::utils::unique_file_stems;
use crate::MeasurementTable;
use clap::{value_parser, Arg, ArgAction, Command};
use log::{debug, error, info};
use std::env;
use std::path::{Path, PathBuf};

/// Settings of one run, resolved once from the CLI.
#[derive(Debug, Clone)]
pub struct Config {
    pub csv: PathBuf,
    pub outdir: PathBuf,
    pub sort_runs: bool,
    pub verbose: u8,
}

/// The results file next to the release build of the benchmark,
/// relative to the directory of the running program.
pub fn default_csv_path() -> PathBuf {
    let program_dir = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));
    program_dir.join("build").join("Release").join("results.csv")
}

fn cli() -> Command {
    let arg_csv = Arg::new("csv")
        .help("path to the csv file with the results (default: build/Release/results.csv next to the program)")
        .short('c')
        .long("csv")
        .num_args(1)
        .value_parser(value_parser!(PathBuf));
    let arg_outdir = Arg::new("outdir")
        .help("directory for the svg charts (default: the directory of the csv file)")
        .short('o')
        .long("outdir")
        .num_args(1)
        .value_parser(value_parser!(PathBuf));
    let arg_sort_runs = Arg::new("sort_runs")
        .help("sort each line by run before plotting")
        .long("sort-runs")
        .action(ArgAction::SetTrue);
    let arg_verbose = Arg::new("verbose")
        .help("more logging, repeat for debug")
        .short('v')
        .long("verbose")
        .action(ArgAction::Count);
    Command::new("bench_plot")
        .version(VERSION.unwrap_or("unknown"))
        .about("Visualizer for XML library benchmark results")
        .arg(arg_csv)
        .arg(arg_outdir)
        .arg(arg_sort_runs)
        .arg(arg_verbose)
}

/// Takes the CLI arguments that control the plotting of the benchmark results.
pub fn parse_cli() -> Config {
    config_from(cli().get_matches(), default_csv_path())
}

fn config_from(cli_args: clap::ArgMatches, default_csv: PathBuf) -> Config {
    let csv: PathBuf = match cli_args.get_one::<PathBuf>("csv") {
        Some(p) => p.to_owned(),
        None => default_csv,
    };
    // the charts go next to the csv unless a directory is given
    let outdir = match cli_args.get_one::<PathBuf>("outdir") {
        Some(p) => p.to_owned(),
        None => match csv.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        },
    };
    return Config {
        csv,
        outdir,
        sort_runs: cli_args.get_flag("sort_runs"),
        verbose: cli_args.get_count("verbose"),
    };
}

/// What happened to each file of the table, in plotting order.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub outcomes: Vec<(String, Result<PlotOutcome, String>)>,
}

impl RunSummary {
    pub fn rendered(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, Ok(PlotOutcome::Rendered { .. })))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_err()).count()
    }
}

/// Load and validate the results, then plot every file once.
/// Load and validation errors are returned,
/// a file that fails to render is logged and the others are still plotted.
pub fn run(config: &Config) -> Result<RunSummary, BenchPlotError> {
    info!("read results from {:?}", config.csv);
    let raw = load(&config.csv)?;
    let table = MeasurementTable::from_raw(&raw)?;
    debug!("loaded table:\n{}", table);
    let options = PlotOptions {
        outdir: config.outdir.clone(),
        sort_runs: config.sort_runs,
    };
    let files = table.files();
    let stems = unique_file_stems(&files);
    let mut summary = RunSummary::default();
    for (file, stem) in files.iter().zip(stems.iter()) {
        let outcome = match plot_file_results_as(&table, file, stem, &options) {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                error!("could not plot {}: {}", file, e);
                Err(e.to_string())
            }
        };
        summary.outcomes.push((file.to_string(), outcome));
    }
    info!(
        "plotted {} of {} files to {:?}",
        summary.rendered(),
        summary.outcomes.len(),
        config.outdir
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_for(args: &[&str]) -> Config {
        let matches = cli().try_get_matches_from(args.iter().copied()).unwrap();
        config_from(matches, PathBuf::from("/opt/bench/build/Release/results.csv"))
    }

    #[test]
    fn default_path_is_under_build_release() {
        let p = default_csv_path();
        assert!(p.ends_with("build/Release/results.csv"));
    }

    #[test]
    fn defaults() {
        let config = config_for(&["bench_plot"]);
        assert_eq!(config.csv, PathBuf::from("/opt/bench/build/Release/results.csv"));
        assert_eq!(config.outdir, PathBuf::from("/opt/bench/build/Release"));
        assert!(!config.sort_runs);
        assert_eq!(config.verbose, 0);
    }

    #[test]
    fn explicit_options() {
        let config = config_for(&["bench_plot", "-c", "results.csv", "--sort-runs", "-vv"]);
        assert_eq!(config.csv, PathBuf::from("results.csv"));
        assert_eq!(config.outdir, PathBuf::from("."));
        assert!(config.sort_runs);
        assert_eq!(config.verbose, 2);
        let config = config_for(&["bench_plot", "--csv", "a/b.csv", "--outdir", "charts"]);
        assert_eq!(config.csv, PathBuf::from("a/b.csv"));
        assert_eq!(config.outdir, PathBuf::from("charts"));
    }

    #[test]
    fn colliding_file_names_keep_both_charts() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("results.csv");
        std::fs::write(
            &csv,
            "Библиотека,Файл,Запуск,Чтение(мс),Запись(мс)\n\
             LibA,a b.xml,1,10,20\n\
             LibB,a_b.xml,1,15,25\n",
        )
        .unwrap();
        let config = Config {
            csv,
            outdir: dir.path().join("charts"),
            sort_runs: false,
            verbose: 0,
        };
        let summary = run(&config).unwrap();
        assert_eq!(summary.rendered(), 2);
        let reads: Vec<PathBuf> = summary
            .outcomes
            .iter()
            .map(|(_, o)| match o {
                Ok(PlotOutcome::Rendered { read, .. }) => read.clone(),
                other => panic!("expected rendered charts, got {:?}", other),
            })
            .collect();
        assert_eq!(reads[0], config.outdir.join("a_b.xml_read.svg"));
        assert_eq!(reads[1], config.outdir.join("a_b.xml-2_read.svg"));
        let svg = std::fs::read_to_string(&reads[0]).unwrap();
        assert!(svg.contains("Read time for a b.xml"));
        let svg = std::fs::read_to_string(&reads[1]).unwrap();
        assert!(svg.contains("Read time for a_b.xml"));
        assert_eq!(std::fs::read_dir(&config.outdir).unwrap().count(), 4);
    }

    #[test]
    fn unknown_flag_is_rejected() {
        assert!(cli().try_get_matches_from(["bench_plot", "--json"]).is_err());
    }
}
