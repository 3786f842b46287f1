//! Computes the spatial extent of geospatial documents.
//!
//! [`coalesce::Coalescer`] merges bounding boxes given in different
//! coordinate reference systems into one envelope.
//! [`calculate::EnvelopeCalculator`] computes the envelope of GML
//! geometries. The resulting [`envelope::Envelope`] can be serialized with
//! the functions in [`output`].

pub mod calculate;
pub mod coalesce;
pub mod crs;
pub mod envelope;
pub mod error;
pub mod input;
pub mod output;
pub mod util;
