use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::Result;
use clap::Args;
use geoextent_core::{coalesce::Coalescer, crs::ProjProvider, input::xml::is_bounding_box};
use humantime::format_duration;
use tracing::info;

use crate::config::Config;

use super::{element_error::IntoInputError, print_envelope, read_elements};

/// Merge the bounding boxes found in the given files into one envelope. The
/// envelope uses the CRS of the first bounding box.
#[derive(Args, Debug)]
pub struct CoalesceArgs {
    /// XML files containing `BoundingBox` or `WGS84BoundingBox` elements
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

/// Run the `coalesce` command
pub fn run_coalesce(args: CoalesceArgs, config: &Config) -> Result<()> {
    let start = Instant::now();

    let elements = read_elements(&args.files, is_bounding_box)?;
    info!(count = elements.len(), "found bounding boxes");

    let provider = ProjProvider::new();
    let coalescer = Coalescer::new(&provider, &provider);
    let envelope = coalescer
        .coalesce_elements(elements.iter().map(|e| e.xml.as_str()))
        .map_err(|err| err.into_input_error(&elements))?;

    print_envelope(&envelope, config.format)?;

    info!(
        "Coalesced {} bounding boxes in {}",
        elements.len(),
        format_duration(Duration::from_millis(start.elapsed().as_millis() as u64))
    );

    Ok(())
}
