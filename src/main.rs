use multilateration::algorithms::disambiguation::DisambiguationPolicy;
use multilateration::api::formatting::{render_report, ReportBuilder, TextFormatter};
use multilateration::api::types::OutputFormat;
use multilateration::processing::parser::{split_sections, ParsedSection, RecordParser};
use multilateration::utils::config::{ConfigurationManager, ResolverConfig};
use multilateration::ResolutionEngine;
use std::io::{self, BufRead, Write};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Command line options layered over the configuration file
#[derive(Debug, Default)]
struct CliOptions {
    config_path: Option<String>,
    input_path: Option<String>,
    known_count: Option<usize>,
    format: Option<OutputFormat>,
    policy: Option<DisambiguationPolicy>,
    quiet: bool,
}

fn usage(program: &str) -> String {
    format!(
        "Usage: {} [--input <file>] [--config <file>] [--known-count <n>] \
         [--format <text|json|csv>] [--policy <lower-y|hint|third-anchor>] [--quiet]\n\
         Without --input, tree lines and distance lines are read from stdin, \
         each section terminated by an empty line.",
        program
    )
}

fn parse_args(args: &[String]) -> Result<Option<CliOptions>, Box<dyn std::error::Error>> {
    let mut options = CliOptions::default();
    let mut iter = args.iter().skip(1);

    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| -> Result<String, Box<dyn std::error::Error>> {
            iter.next()
                .cloned()
                .ok_or_else(|| format!("Missing value for {}", flag).into())
        };

        match arg.as_str() {
            "--help" | "-h" => return Ok(None),
            "--config" => options.config_path = Some(value("--config")?),
            "--input" => options.input_path = Some(value("--input")?),
            "--known-count" => options.known_count = Some(value("--known-count")?.parse()?),
            "--format" => options.format = Some(value("--format")?.parse()?),
            "--policy" => options.policy = Some(value("--policy")?.parse()?),
            "--quiet" | "-q" => options.quiet = true,
            other => return Err(format!("Unknown argument: {}", other).into()),
        }
    }

    Ok(Some(options))
}

fn load_config(options: &CliOptions) -> Result<ResolverConfig, Box<dyn std::error::Error>> {
    let mut manager = match &options.config_path {
        Some(path) => ConfigurationManager::from_file(path)?,
        None => ConfigurationManager::new(),
    };

    if let Some(count) = options.known_count {
        manager.set_known_count(Some(count));
    }
    if let Some(format) = options.format {
        manager.set_output_format(format);
    }
    if let Some(policy) = options.policy {
        manager.set_disambiguation(policy);
    }

    Ok(manager.config().clone())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/// Read lines until an empty line or end of input
fn read_section<R: BufRead>(reader: &mut R) -> io::Result<Vec<String>> {
    let mut lines = Vec::new();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim_end_matches(['\r', '\n']).to_string();
        if line.trim().is_empty() {
            break;
        }
        lines.push(line);
    }
    Ok(lines)
}

fn report_rejected<T>(section: &str, parsed: &ParsedSection<T>) {
    for rejected in &parsed.rejected {
        eprintln!("Error parsing {} {}", section, rejected);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map_or("multilateration", |s| s.as_str());

    let options = match parse_args(&args) {
        Ok(Some(options)) => options,
        Ok(None) => {
            println!("{}", usage(program));
            return Ok(());
        }
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("{}", usage(program));
            return Err(e);
        }
    };

    let config = load_config(&options)?;
    init_logging(&config.log_level);
    let interactive = options.input_path.is_none() && !options.quiet;

    let (tree_lines, distance_lines) = match &options.input_path {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            let (trees, distances) = split_sections(&text);
            (
                trees.into_iter().map(str::to_string).collect::<Vec<_>>(),
                distances.into_iter().map(str::to_string).collect::<Vec<_>>(),
            )
        }
        None => {
            let stdin = io::stdin();
            let mut reader = stdin.lock();
            if interactive {
                println!("Enter tree data (Press Enter on an empty line to finish):");
                io::stdout().flush()?;
            }
            let trees = read_section(&mut reader)?;
            if interactive {
                println!("\nEnter distance data (Press Enter on an empty line to finish):");
                io::stdout().flush()?;
            }
            let distances = read_section(&mut reader)?;
            (trees, distances)
        }
    };

    let parser = RecordParser::lenient();
    let trees = parser.parse_trees(tree_lines.iter().map(String::as_str))?;
    let distances = parser.parse_distances(distance_lines.iter().map(String::as_str))?;
    report_rejected("tree line", &trees);
    report_rejected("distance line", &distances);
    info!(
        trees = trees.records.len(),
        distances = distances.records.len(),
        "input parsed"
    );

    if config.output_format == OutputFormat::Text && !options.quiet {
        let text = TextFormatter::new();
        println!("\n--- Trees ---");
        print!("{}", text.format_trees(&trees.records));
        println!("\n--- Distances ---");
        print!("{}", text.format_distances(&distances.records));
        println!();
    }

    let mut engine = match ResolutionEngine::with_config(trees.records, distances.records, &config) {
        Ok(engine) => engine,
        Err(e) => {
            error!(error = %e, "cannot start resolution");
            return Err(e.to_string().into());
        }
    };

    let result = engine.run();
    let builder = ReportBuilder::new().with_precision(config.precision);
    if let Some(report) = builder.build(&result, engine.history()) {
        print!("{}", render_report(&report, config.output_format, config.precision as usize)?);
    }

    match result {
        Ok(layout) => {
            info!(
                resolved = layout.resolved_count,
                evaluations = layout.evaluations,
                "resolution complete"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "resolution incomplete");
            Err(e.to_string().into())
        }
    }
}
