use itertools::Itertools;

use crate::{crs::crs_identifier, envelope::Envelope};

/// Serializes the envelope into a comma-separated list that can be used as
/// a query parameter value: lower ordinates, upper ordinates and the CRS
/// identifier. Ordinates keep their full precision.
pub fn envelope_as_kvp(envelope: &Envelope) -> String {
    envelope
        .lower()
        .iter()
        .chain(envelope.upper())
        .map(|o| o.to_string())
        .chain(std::iter::once(crs_identifier(envelope.crs())))
        .join(",")
}
