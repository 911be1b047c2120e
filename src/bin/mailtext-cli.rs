use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::io::Read;
use std::path::{Path, PathBuf};

use mailtext::batch;
use mailtext::config::Settings;
use mailtext::converter::{self, TableFormat};
use mailtext::logging::init_tracing;
use mailtext::normalizer;

fn main() -> anyhow::Result<()> {
    let matches = Command::new("mailtext")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Turns HTML email bodies into readable text and markdown")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .global(true)
                .help("Configuration file"),
        )
        .subcommand(
            Command::new("clean")
                .about("Clean one HTML document from a file or stdin")
                .arg(
                    Arg::new("input")
                        .help("Input file path, stdin when omitted")
                        .index(1),
                )
                .arg(
                    Arg::new("html")
                        .long("html")
                        .action(ArgAction::SetTrue)
                        .help("Print the rendered HTML instead of the cleaned text"),
                ),
        )
        .subcommand(
            Command::new("batch")
                .about("Add a cleaned column to a CSV or XLSX file")
                .arg(
                    Arg::new("input")
                        .help("Input .csv or .xlsx file")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("column")
                        .short('c')
                        .long("column")
                        .value_name("NAME")
                        .help("Column holding the HTML (defaults to the configured column)"),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("PATH")
                        .help("Output file path"),
                ),
        )
        .get_matches();

    let settings = match matches.get_one::<String>("config") {
        Some(path) => Settings::with_file(Path::new(path)),
        None => Settings::new(),
    }
    .context("Failed to load configuration")?;
    init_tracing(&settings.logging);

    match matches.subcommand() {
        Some(("clean", sub)) => run_clean(sub),
        Some(("batch", sub)) => run_batch(sub, &settings),
        _ => unreachable!("subcommand_required"),
    }
}

fn run_clean(matches: &ArgMatches) -> anyhow::Result<()> {
    let bytes = match matches.get_one::<String>("input") {
        Some(path) => std::fs::read(path).with_context(|| format!("Failed to read {}", path))?,
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };

    let html = String::from_utf8_lossy(&bytes);
    let result = normalizer::normalize_str(&html);

    if matches.get_flag("html") {
        println!("{}", result.rendered_html);
    } else {
        println!("{}", result.cleaned_text);
    }
    Ok(())
}

fn run_batch(matches: &ArgMatches, settings: &Settings) -> anyhow::Result<()> {
    let input = matches
        .get_one::<String>("input")
        .map(PathBuf::from)
        .context("input is required")?;
    let column = matches
        .get_one::<String>("column")
        .cloned()
        .unwrap_or_else(|| settings.batch.default_column.clone());

    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let format = TableFormat::from_file_name(&file_name)?;

    let output = match matches.get_one::<String>("output") {
        Some(path) => PathBuf::from(path),
        None => input.with_file_name(converter::processed_file_name(&file_name)),
    };

    let bytes =
        std::fs::read(&input).with_context(|| format!("Failed to read {}", input.display()))?;
    let (encoded, summary) = batch::process_file(&bytes, format, &column)?;
    std::fs::write(&output, encoded)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "{} rows written to {} ({} degraded)",
        summary.rows,
        output.display(),
        summary.degraded
    );
    Ok(())
}
