//! `renamer` command-line entry point

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use renamer_batch::{init_logging, BatchDriver, GeneratorFactory, PipelineConfig};
use renamer_llm::{build_generator, CodeReaderClient};
use std::path::PathBuf;
use std::sync::Arc;

fn cli() -> Command {
    Command::new("renamer")
        .version(renamer_batch::VERSION)
        .about("Give generated Java unit tests meaningful identifier names")
        .arg(
            Arg::new("mode")
                .long("mode")
                .required(true)
                .value_parser(["single", "dir", "eval"])
                .help("single: one file, dir: every .java file, eval: score .jsonl oracle records"),
        )
        .arg(
            Arg::new("file")
                .long("file")
                .value_parser(value_parser!(PathBuf))
                .help("Java file to process (single mode)"),
        )
        .arg(
            Arg::new("dir")
                .long("dir")
                .value_parser(value_parser!(PathBuf))
                .help("Directory of .java files (dir mode) or .jsonl files (eval mode)"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .default_value("out")
                .value_parser(value_parser!(PathBuf))
                .help("Directory for processed files, reports and logs"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_parser(value_parser!(PathBuf))
                .help("YAML configuration file"),
        )
        .arg(
            Arg::new("force")
                .long("force")
                .action(ArgAction::SetTrue)
                .help("Overwrite existing output files"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .action(ArgAction::Count)
                .help("More log output (-v debug, -vv trace)"),
        )
}

fn required_path<'m>(matches: &'m ArgMatches, name: &str, mode: &str) -> anyhow::Result<&'m PathBuf> {
    matches
        .get_one::<PathBuf>(name)
        .with_context(|| format!("--{name} is required in {mode} mode"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    let mode = matches
        .get_one::<String>("mode")
        .map(String::as_str)
        .unwrap_or("single");
    let output = matches
        .get_one::<PathBuf>("output")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("out"));

    init_logging(matches.get_count("verbose"), Some(&output.join("logs")))?;

    let config = PipelineConfig::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))
        .context("loading configuration")?;

    let settings = config.generator_settings();
    let factory: GeneratorFactory = Arc::new(move || build_generator(&settings));
    let mut driver =
        BatchDriver::new(&config, factory, &output).with_overwrite(matches.get_flag("force"));
    if let Some(url) = &config.readability_url {
        let scorer = CodeReaderClient::new(url, config.request_timeout())
            .context("building readability client")?;
        driver = driver.with_scorer(Arc::new(scorer));
    }

    tracing::info!(mode, output = %output.display(), workers = config.worker_count(), "starting");
    match mode {
        "single" => {
            let file = required_path(&matches, "file", mode)?;
            let report = driver.run_single(file).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        "dir" => {
            let dir = required_path(&matches, "dir", mode)?;
            let report = driver.run_dir(dir).await?;
            println!(
                "processed {} files, renamed {} of {} tests, {} failures",
                report.processed,
                report.renamed(),
                report.tests_found(),
                report.failed
            );
        }
        "eval" => {
            let dir = required_path(&matches, "dir", mode)?;
            let metrics = driver.run_eval(dir).await?;
            println!("{}", serde_json::to_string_pretty(&metrics)?);
        }
        other => anyhow::bail!("unknown mode: {other}"),
    }
    Ok(())
}
