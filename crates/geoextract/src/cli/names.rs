use std::io::{self, Write};
use std::path::Path;

use anyhow::Result;

use super::load_pipeline;

/// Prints `normalized<TAB>canonical` for every target name of `field`.
pub fn run(locations: &Path, config: Option<&Path>, field: &str) -> Result<()> {
    let pipeline = load_pipeline(locations, config)?;
    let names = pipeline.target_names();

    let mut stdout = io::stdout().lock();
    for normalized in names.normalized(field) {
        let canonical = names.canonical(field, normalized).unwrap_or(normalized);
        writeln!(stdout, "{normalized}\t{canonical}")?;
    }
    Ok(())
}
