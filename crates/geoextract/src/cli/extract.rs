use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};

use super::load_pipeline;

pub fn run(
    input: Option<&Path>,
    locations: &Path,
    config: Option<&Path>,
    pretty: bool,
) -> Result<()> {
    let pipeline = load_pipeline(locations, config)?;
    let text = read_input(input)?;

    let records = pipeline.extract(&text);
    tracing::info!(records = records.len(), "Extraction finished");

    let json = if pretty {
        serde_json::to_string_pretty(&records)?
    } else {
        serde_json::to_string(&records)?
    };
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{json}")?;
    Ok(())
}

fn read_input(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        _ => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            Ok(text)
        }
    }
}
