use geo::{coord, Rect};

use crate::{crs::Crs, error::FormatError};

pub use self::polygon::CrsPolygon;

pub mod polygon;

/// An axis-aligned bounding region in a coordinate reference system. The
/// lower and upper corners always have the same number of ordinates and
/// `lower[i] <= upper[i]` holds for every axis.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    crs: Crs,
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl Envelope {
    /// Creates a new envelope from its corners
    ///
    /// # Errors
    /// Fails if the corners are empty, have a different number of
    /// ordinates, or if a lower ordinate is greater than the upper one.
    pub fn new(crs: Crs, lower: Vec<f64>, upper: Vec<f64>) -> Result<Self, FormatError> {
        check_corners(&lower, &upper)?;
        Ok(Self { crs, lower, upper })
    }

    /// Creates a 2-dimensional envelope from a rectangle
    pub fn from_rect(crs: Crs, rect: Rect) -> Self {
        Self {
            crs,
            lower: vec![rect.min().x, rect.min().y],
            upper: vec![rect.max().x, rect.max().y],
        }
    }

    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// The number of ordinates per corner
    pub fn dimension(&self) -> usize {
        self.lower.len()
    }

    /// The lower ordinate along axis `i`
    ///
    /// # Panics
    /// Panics if `i` is not smaller than [`Self::dimension()`]
    pub fn minimum(&self, i: usize) -> f64 {
        self.lower[i]
    }

    /// The upper ordinate along axis `i`
    ///
    /// # Panics
    /// Panics if `i` is not smaller than [`Self::dimension()`]
    pub fn maximum(&self, i: usize) -> f64 {
        self.upper[i]
    }

    /// Extends this envelope so it covers `other`. The CRS of `other` is
    /// not checked. Callers have to transform it first.
    ///
    /// # Errors
    /// Fails if both envelopes have a different number of dimensions. The
    /// envelope is not modified in this case.
    pub fn expand_to_include(&mut self, other: &Envelope) -> Result<(), FormatError> {
        if other.dimension() != self.dimension() {
            return Err(FormatError::DimensionMismatch {
                expected: self.dimension(),
                found: other.dimension(),
            });
        }
        for (min, o) in self.lower.iter_mut().zip(&other.lower) {
            *min = min.min(*o);
        }
        for (max, o) in self.upper.iter_mut().zip(&other.upper) {
            *max = max.max(*o);
        }
        Ok(())
    }

    /// Returns the 2-dimensional footprint of this envelope
    ///
    /// # Errors
    /// Fails if the envelope is not 2-dimensional
    pub fn to_rect(&self) -> Result<Rect, FormatError> {
        if self.dimension() != 2 {
            return Err(FormatError::NotTwoDimensional(self.dimension()));
        }
        Ok(Rect::new(
            coord! { x: self.lower[0], y: self.lower[1] },
            coord! { x: self.upper[0], y: self.upper[1] },
        ))
    }
}

/// Checks that two corners span a valid envelope
pub(crate) fn check_corners(lower: &[f64], upper: &[f64]) -> Result<(), FormatError> {
    if lower.is_empty() || upper.is_empty() {
        return Err(FormatError::EmptyCorner);
    }
    if lower.len() != upper.len() {
        return Err(FormatError::CornerDimensionMismatch {
            lower: lower.len(),
            upper: upper.len(),
        });
    }
    if let Some(axis) = lower.iter().zip(upper).position(|(l, u)| l > u) {
        return Err(FormatError::InvertedCorner {
            axis,
            lower: lower[axis],
            upper: upper[axis],
        });
    }
    Ok(())
}
