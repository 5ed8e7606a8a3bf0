mod content;
mod logic;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use flychess_game::GameMode;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use content::DirTaskSource;
use logic::{
    GameTester, LogicTester, PlayabilityAggregate, PlayabilityRecord, ScenarioResult,
    aggregate_playability, get_scenario, list_scenarios, resolve_seed_inputs,
    run_playability_analysis, validate_playability_targets,
};

#[derive(Debug, Parser)]
#[command(name = "flychess-tester", version)]
#[command(about = "Automated QA for the Flying Chess engine - logic scenarios and playability sweeps")]
struct Args {
    /// Scenarios to run (comma-separated, or `all`)
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run (comma-separated integers, or `now`)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per scenario and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Task mode used by the playability sweep
    #[arg(long, default_value = "love")]
    mode: String,

    /// Skip the playability sweep
    #[arg(long)]
    skip_playability: bool,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console", "csv"])]
    report: String,

    /// Directory holding `<lang>/<mode>.json` task lists. Defaults to
    /// `flychess-web/static/assets/tasks` under the current directory, then
    /// to the workspace this binary was built from.
    #[arg(long)]
    tasks_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let scenarios = expand_scenarios(&args.scenarios);
    let seeds = resolve_seed_inputs(&split_csv(&args.seeds))?;
    let tasks = match args.tasks_dir.clone() {
        Some(dir) => DirTaskSource::new(dir),
        None => DirTaskSource::locate(&std::env::current_dir()?),
    };
    log::info!("reading tasks from {}", tasks.root().display());
    let game_tester = GameTester::new(tasks, args.verbose);

    let results = run_logic_scenarios(&args, &scenarios, &seeds, &game_tester);
    let (records, aggregates) = gather_playability(&args, &game_tester, &seeds)?;

    write_reports(&args, &results, &records, &aggregates, start_time)?;

    validate_playability_targets(&aggregates)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:25} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🎲 Flying Chess Automated Tester".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.iter().any(|s| s == "all") {
        scenarios.retain(|s| s != "all");
        for (key, _) in list_scenarios() {
            if !scenarios.iter().any(|s| s == key) {
                scenarios.push(key.to_string());
            }
        }
    }
    scenarios
}

fn run_logic_scenarios(
    args: &Args,
    scenarios: &[String],
    seeds: &[u64],
    game_tester: &GameTester,
) -> Vec<ScenarioResult> {
    println!("{}", "🧠 Running Logic Tests".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let logic_tester = LogicTester::new(game_tester.clone());
    let mut results = Vec::new();

    for scenario_name in scenarios {
        if let Some(scenario) = get_scenario(scenario_name) {
            results.extend(logic_tester.run_scenario(&scenario, seeds, args.iterations));
        } else {
            eprintln!("⚠️  Unknown scenario: {}", scenario_name.yellow());
            results.push(ScenarioResult {
                scenario_name: scenario_name.clone(),
                seed: 0,
                passed: false,
                iterations_run: 0,
                successful_iterations: 0,
                failures: vec![format!("unknown scenario {scenario_name}")],
                average_duration: std::time::Duration::ZERO,
                performance_data: Vec::new(),
            });
        }
    }

    results
}

fn gather_playability(
    args: &Args,
    game_tester: &GameTester,
    seeds: &[u64],
) -> Result<(Vec<PlayabilityRecord>, Vec<PlayabilityAggregate>)> {
    if args.skip_playability {
        return Ok((Vec::new(), Vec::new()));
    }
    let mode: GameMode = args
        .mode
        .parse()
        .map_err(|()| anyhow::anyhow!("unknown mode {}", args.mode))?;
    let records = run_playability_analysis(game_tester, mode, seeds, args.iterations)
        .context("running playability sweep")?;
    let aggregates = aggregate_playability(&records);
    Ok((records, aggregates))
}

fn write_reports(
    args: &Args,
    results: &[ScenarioResult],
    records: &[PlayabilityRecord],
    aggregates: &[PlayabilityAggregate],
    start_time: Instant,
) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => logic::reports::generate_json_report(&mut output_target, results, aggregates)?,
        "markdown" => {
            logic::reports::generate_markdown_report(&mut output_target, results, aggregates)?;
        }
        "csv" => logic::reports::generate_csv_report(&mut output_target, records)?,
        _ => {
            logic::reports::generate_console_report(
                &mut output_target,
                results,
                aggregates,
                start_time.elapsed(),
            )?;
            writeln!(&mut output_target)?;
            writeln!(&mut output_target, "🏁 Total time: {:?}", start_time.elapsed())?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args {
            scenarios: "smoke".to_string(),
            list_scenarios: false,
            seeds: "1337".to_string(),
            iterations: 1,
            mode: "love".to_string(),
            skip_playability: false,
            report: "json".to_string(),
            tasks_dir: None,
            verbose: false,
            output: None,
        }
    }

    fn tester() -> GameTester {
        GameTester::new(DirTaskSource::bundled(), false)
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("flychess-{}-{name}", std::process::id()))
    }

    #[test]
    fn expands_all_scenarios_keyword() {
        let expanded = expand_scenarios("smoke,all");
        assert_eq!(expanded[0], "smoke");
        assert_eq!(expanded.len(), list_scenarios().len());
        assert!(expanded.contains(&"wheel-turn-order".to_string()));
    }

    #[test]
    fn expand_scenarios_without_all_preserves_order() {
        let expanded = expand_scenarios("save-expiry, smoke");
        assert_eq!(expanded, vec!["save-expiry".to_string(), "smoke".to_string()]);
    }

    #[test]
    fn unknown_scenarios_fail() {
        let results = run_logic_scenarios(&base_args(), &["bogus".to_string()], &[1], &tester());
        assert_eq!(results.len(), 1);
        assert!(!results[0].passed);
    }

    #[test]
    fn gather_playability_honours_skip_flag() {
        let args = Args {
            skip_playability: true,
            ..base_args()
        };
        let (records, aggregates) = gather_playability(&args, &tester(), &[1]).unwrap();
        assert!(records.is_empty());
        assert!(aggregates.is_empty());
    }

    #[test]
    fn gather_playability_rejects_unknown_modes() {
        let args = Args {
            mode: "chess".to_string(),
            ..base_args()
        };
        assert!(gather_playability(&args, &tester(), &[1]).is_err());
    }

    #[test]
    fn maybe_list_scenarios_writes_output() {
        let path = temp_path("scenarios.txt");
        let args = Args {
            list_scenarios: true,
            output: Some(path.clone()),
            ..base_args()
        };
        assert!(maybe_list_scenarios(&args).unwrap());
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("Available scenarios"));
        assert!(content.contains("overshoot-bounce"));
        assert!(!maybe_list_scenarios(&base_args()).unwrap());
    }

    #[test]
    fn write_reports_emits_each_format() {
        let results = run_logic_scenarios(&base_args(), &["smoke".to_string()], &[3], &tester());
        let (records, aggregates) = gather_playability(&base_args(), &tester(), &[3]).unwrap();

        for (format, needle) in [
            ("json", "\"scenario_name\""),
            ("markdown", "# Flying Chess Logic Test Results"),
            ("csv", "mode,strategy,seed"),
            ("console", "Playability Summary"),
        ] {
            let path = temp_path(&format!("report.{format}"));
            let args = Args {
                report: format.to_string(),
                output: Some(path.clone()),
                ..base_args()
            };
            write_reports(&args, &results, &records, &aggregates, Instant::now()).unwrap();
            let content = std::fs::read_to_string(&path).unwrap();
            assert!(content.contains(needle), "{format} report missing {needle}");
        }
    }

    #[test]
    fn output_target_stdout_writes() {
        let mut target = OutputTarget::new(None).unwrap();
        target.write_all(b"ok").unwrap();
        target.flush().unwrap();
    }
}
