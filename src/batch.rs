//! Batch mode: compute a table's records from JSON files.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::de::DeserializeOwned;

use gridbase_core::{ComputeOptions, Field, FieldComputer, MemoryStore, Record};

use crate::error::CliError;

pub(crate) struct BatchArgs {
    pub fields: PathBuf,
    pub records: PathBuf,
    pub linked: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let content = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Compute the records and return them as pretty JSON.
pub(crate) fn compute(args: &BatchArgs, options: ComputeOptions) -> anyhow::Result<String> {
    let fields: Vec<Field> = read_json(&args.fields)?;
    let records: Vec<Record> = read_json(&args.records)?;
    let store = match &args.linked {
        Some(path) => read_json::<Vec<Record>>(path)?.into_iter().collect(),
        None => MemoryStore::new(),
    };
    log::info!(
        "computing {} records against {} fields ({} linked records)",
        records.len(),
        fields.len(),
        store.len()
    );

    let computed = FieldComputer::new(&fields, &store)
        .with_options(options)
        .compute(&records)?;
    serde_json::to_string_pretty(&computed).context("failed to serialize records")
}

/// Compute and print the records, or write them to `args.output`.
pub(crate) fn run(args: &BatchArgs, options: ComputeOptions) -> anyhow::Result<()> {
    let json = compute(args, options)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, json + "\n")
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Records written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
