//! Tabular export to Turtle.

use std::path::Path;

use anyhow::{Context, Result};

use crate::etl::{convert_file, ConversionStats};

pub fn render_stats(stats: &ConversionStats) -> String {
    format!(
        "Filas leídas: {}\nDocumentos: {}\nFilas omitidas: {}\nFechas inválidas: {}",
        stats.rows_read, stats.documents, stats.skipped_rows, stats.invalid_dates
    )
}

pub fn run(input: &Path, output: &Path) -> Result<ConversionStats> {
    let stats = convert_file(input, output)
        .with_context(|| format!("failed to convert {}", input.display()))?;
    println!("{}", render_stats(&stats));
    println!("RDF guardado en: {}", output.display());
    Ok(stats)
}
