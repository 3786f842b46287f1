use geo::{LineString, Polygon};

use crate::{crs::Crs, error::FormatError};

use super::Envelope;

/// A polygon together with the CRS its coordinates refer to. The CRS is
/// metadata only and is not part of the geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct CrsPolygon {
    pub polygon: Polygon,
    pub crs: Crs,
}

impl Envelope {
    /// Creates a rectangular polygon with the same extent as this envelope.
    /// The exterior ring starts at the lower left corner and runs
    /// counter-clockwise: (minX,minY), (maxX,minY), (maxX,maxY), (minX,maxY),
    /// (minX,minY).
    ///
    /// # Errors
    /// Fails if the envelope is not 2-dimensional
    pub fn as_polygon(&self) -> Result<CrsPolygon, FormatError> {
        if self.dimension() != 2 {
            return Err(FormatError::NotTwoDimensional(self.dimension()));
        }
        let (min_x, min_y) = (self.minimum(0), self.minimum(1));
        let (max_x, max_y) = (self.maximum(0), self.maximum(1));
        let ring = LineString::from(vec![
            (min_x, min_y),
            (max_x, min_y),
            (max_x, max_y),
            (min_x, max_y),
            (min_x, min_y),
        ]);
        Ok(CrsPolygon {
            polygon: Polygon::new(ring, vec![]),
            crs: self.crs().clone(),
        })
    }
}
