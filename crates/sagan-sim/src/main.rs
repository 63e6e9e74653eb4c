use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use sagan_patterns::{Detector, Language, PatternLibrary, Remediator, SourceFile};
use sagan_sim::{Simulation, SimulationConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("sagan")
        .version(sagan_sim::VERSION)
        .about("Security review pipeline: detect, remediate, re-verify, merge")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("simulate")
                .about("Open a generated change and run one mission over it")
                .arg(
                    Arg::new("language")
                        .long("language")
                        .short('l')
                        .help("Language of the generated change (default: python)"),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .value_parser(value_parser!(u64))
                        .help("Random seed for reproducible fixtures"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .short('c')
                        .value_parser(value_parser!(PathBuf))
                        .help("TOML simulation config"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("scan")
                .about("Detect vulnerability labels in a single file")
                .arg(
                    Arg::new("language")
                        .long("language")
                        .short('l')
                        .required(true)
                        .help("Language tag selecting the rule list"),
                )
                .arg(
                    Arg::new("fix")
                        .long("fix")
                        .action(ArgAction::SetTrue)
                        .help("Print remediated content"),
                )
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("File to scan"),
                ),
        )
        .subcommand(Command::new("languages").about("List languages and their labels"))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let matches = cli().get_matches();
    match matches.subcommand() {
        Some(("simulate", args)) => simulate(args).await,
        Some(("scan", args)) => scan(args),
        Some(("languages", _)) => languages(),
        _ => Ok(()),
    }
}

async fn simulate(args: &ArgMatches) -> Result<()> {
    let mut config = match args.get_one::<PathBuf>("config") {
        Some(path) => SimulationConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SimulationConfig::new(),
    };
    if let Some(language) = args.get_one::<String>("language") {
        config = config.with_language(language.as_str());
    }
    if let Some(seed) = args.get_one::<u64>("seed") {
        config = config.with_seed(*seed);
    }

    let simulation = Simulation::new(config)?;
    let report = simulation.run().await?;

    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.generate_text());
    }

    std::process::exit(if report.passed() { 0 } else { 1 });
}

fn scan(args: &ArgMatches) -> Result<()> {
    let language = args
        .get_one::<String>("language")
        .map(|l| Language::new(l))
        .context("--language is required")?;
    let path = args.get_one::<PathBuf>("file").context("file is required")?;
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;

    let library = Arc::new(PatternLibrary::builtin()?);
    let detector = Detector::new(Arc::clone(&library));
    let file = SourceFile::new(path.display().to_string(), content, language);
    let labels = detector.detect(&file);

    if labels.is_empty() {
        println!("{}: no exploits found", file.name());
        return Ok(());
    }

    for label in &labels {
        println!("{}: {label}", file.name());
    }
    if args.get_flag("fix") {
        let fixed = Remediator::new(library).remediate_all(&file, &labels);
        println!();
        println!("{fixed}");
    }

    std::process::exit(1);
}

fn languages() -> Result<()> {
    let library = PatternLibrary::builtin()?;
    for language in library.languages() {
        println!("{language}");
        for label in library.labels(language) {
            println!("  - {label}");
        }
    }
    Ok(())
}
