use std::{
    fs,
    io::{self, BufWriter, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use geoextent_core::{
    envelope::Envelope,
    input::xml::split_element_ranges,
    output::{gml::write_envelope_as_gml, kvp::envelope_as_kvp},
};

use crate::config::OutputFormat;

pub mod coalesce;
pub mod element_error;
pub mod envelope;

/// An element extracted from an input file
#[derive(Debug)]
pub struct InputElement {
    /// The file the element was read from
    pub file: PathBuf,

    /// The line on which the element starts (one-based)
    pub line: usize,

    /// The element's XML text
    pub xml: String,
}

/// Reads all files in the given order and extracts the outermost elements
/// whose local name matches `matches`
pub fn read_elements<F>(files: &[PathBuf], matches: F) -> Result<Vec<InputElement>>
where
    F: Fn(&[u8]) -> bool + Copy,
{
    let mut result = Vec::new();
    for file in files {
        let xml = fs::read_to_string(file)
            .with_context(|| format!("unable to read input file {:?}", file))?;
        let ranges = split_element_ranges(&xml, matches)
            .with_context(|| format!("unable to parse input file {:?}", file))?;
        for r in ranges {
            result.push(InputElement {
                file: file.clone(),
                line: xml[..r.start].matches('\n').count() + 1,
                xml: xml[r].to_string(),
            });
        }
    }
    Ok(result)
}

/// Writes the envelope to stdout in the given format
pub fn print_envelope(envelope: &Envelope, format: OutputFormat) -> Result<()> {
    let stdout = io::stdout().lock();
    let mut writer = BufWriter::new(stdout);
    match format {
        OutputFormat::Gml => write_envelope_as_gml(envelope, &mut writer)?,
        OutputFormat::Kvp => write!(writer, "{}", envelope_as_kvp(envelope))?,
    }
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
