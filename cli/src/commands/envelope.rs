use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::Result;
use clap::Args;
use geoextent_core::{
    calculate::EnvelopeCalculator,
    crs::ProjProvider,
    input::xml::{is_gml_geometry, GmlGeometryParser},
};
use humantime::format_duration;
use tracing::info;

use crate::config::Config;

use super::{element_error::IntoInputError, print_envelope, read_elements};

/// Calculate the envelope of all GML geometries found in the given files.
/// Coordinates are not transformed.
#[derive(Args, Debug)]
pub struct EnvelopeArgs {
    /// XML files containing GML geometries
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

/// Run the `envelope` command
pub fn run_envelope(args: EnvelopeArgs, config: &Config) -> Result<()> {
    let start = Instant::now();

    let elements = read_elements(&args.files, is_gml_geometry)?;
    info!(count = elements.len(), "found geometries");

    let calculator = EnvelopeCalculator::new(GmlGeometryParser, ProjProvider::new());
    let envelope = calculator
        .calculate(elements.iter().map(|e| e.xml.as_str()))
        .map_err(|err| err.into_input_error(&elements))?;

    print_envelope(&envelope, config.format)?;

    info!(
        "Calculated envelope of {} geometries in {}",
        elements.len(),
        format_duration(Duration::from_millis(start.elapsed().as_millis() as u64))
    );

    Ok(())
}
