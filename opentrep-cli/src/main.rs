use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use opentrep_core::{build_index, resolve_query, Describe, PorLookup};

/// Thin command-line front end over the opentrep query resolution pipeline.
///
/// Deliberately minimal: no interactive shell, no relational mirror of POR
/// records, no elaborate display format beyond what the two subcommands
/// below print — all out of the core crate's scope.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a persistent index from a POR reference file.
    Index {
        /// Path to the caret-separated POR reference file.
        #[arg(long)]
        por: PathBuf,

        /// Directory the index is (re)built into. Removed and recreated.
        #[arg(long)]
        index: PathBuf,
    },

    /// Resolve a free-text travel query against a previously built index.
    Resolve {
        /// Directory of a previously built index.
        #[arg(long)]
        index: PathBuf,

        /// Print the resolved places as a JSON array instead of plain text.
        #[arg(long)]
        json: bool,

        /// The raw query, e.g. "san francicso rio de janero".
        query: String,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Index { por, index } => {
            let report = build_index(&por, &index)?;
            println!("indexed {} entries ({} skipped)", report.entries, report.skipped);
            Ok(())
        }
        Command::Resolve { index, json, query } => {
            let combination = resolve_query(&index, &query)?;
            if json {
                print_combination_json(&index, &combination)
            } else {
                print_combination(&index, &combination)
            }
        }
    }
}

/// One resolved slice, the shape serialized by `--json`: a plain reading
/// of the `Place` fields for machine consumers, no richer display format.
#[derive(serde::Serialize)]
struct ResolvedSlice {
    phrase: String,
    percentage: u8,
    place: Option<opentrep_core::Place>,
}

fn resolved_slices(
    index: &opentrep_core::Index,
    combination: &opentrep_core::ResultCombination,
) -> Vec<ResolvedSlice> {
    let Some(holder) = combination.best_holder() else { return Vec::new() };
    holder
        .matches
        .iter()
        .map(|matching| ResolvedSlice {
            phrase: matching.original_phrase.clone(),
            percentage: matching.best_percentage(),
            place: matching.best_doc_id.and_then(|id| index.by_doc_id(id)),
        })
        .collect()
}

fn print_combination(
    index_path: &std::path::Path,
    combination: &opentrep_core::ResultCombination,
) -> anyhow::Result<()> {
    let Some(holder) = combination.best_holder() else {
        println!("no match");
        return Ok(());
    };
    println!("{}", holder.describe_key());

    let index = opentrep_core::Index::open(index_path)?;
    for slice in resolved_slices(&index, combination) {
        print!("  \"{}\" -> ", slice.phrase);
        match slice.place {
            Some(place) => println!("{} ({}%)", place.common_name, slice.percentage),
            None => println!("<no match>"),
        }
    }

    Ok(())
}

fn print_combination_json(
    index_path: &std::path::Path,
    combination: &opentrep_core::ResultCombination,
) -> anyhow::Result<()> {
    let index = opentrep_core::Index::open(index_path)?;
    let slices = resolved_slices(&index, combination);
    println!("{}", serde_json::to_string_pretty(&slices)?);
    Ok(())
}
