//! `scrape`: runs a scraper script and prints what its actions extracted.
mod cli;
mod config;
mod report;

use std::process::ExitCode;

use anyhow::Context;

use engine_logging::{engine_error, engine_info, engine_warn, LevelFilter, LogDestination};
use scraper_core::ACTION_SCOPE;
use scraper_engine::{load_script, HttpRetriever, Runner, ScriptRun};

fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("scrape: {msg}\n\n{}", cli::USAGE);
            return ExitCode::from(2);
        }
    };
    if args.help {
        println!("{}", cli::USAGE);
        return ExitCode::SUCCESS;
    }

    let destination = match &args.log_file {
        Some(path) => LogDestination::Both(path.clone()),
        None => LogDestination::Terminal,
    };
    let level = if args.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    engine_logging::initialize(destination, level);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            engine_error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &cli::CliArgs) -> anyhow::Result<()> {
    let settings = config::load_settings(args.config.as_deref());

    let mut script = load_script(&args.script)
        .with_context(|| format!("loading script {:?}", args.script))?;
    if args.debug || settings.debug {
        script.set_debug(true);
    }
    engine_info!(
        "Script: {} {} ({}) by {}",
        script.name(),
        script.version,
        script.kind(),
        script.author
    );

    let retriever = HttpRetriever::new(settings.fetch.clone()).context("starting http client")?;
    let mut run = ScriptRun::new(&script);
    for (name, value) in &args.variables {
        run.set_global(name, value.as_str());
    }

    let sections = Runner::new(&retriever)
        .run_sections(&mut run, ACTION_SCOPE, &args.action)
        .context("running script")?;
    if sections.is_empty() {
        engine_warn!("No action matched {:?}", args.action);
    }

    let report = report::sections_report(&run, &sections);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
