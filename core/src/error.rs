use thiserror::Error;

use crate::crs::Crs;

/// Errors caused by malformed bounding box content
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("invalid number `{0}' in coordinate list")]
    InvalidNumber(String),

    #[error("coordinate list is empty")]
    EmptyCorner,

    #[error("lower corner has {lower} ordinates but upper corner has {upper}")]
    CornerDimensionMismatch { lower: usize, upper: usize },

    #[error("lower corner exceeds upper corner on axis {axis} ({lower} > {upper})")]
    InvertedCorner { axis: usize, lower: f64, upper: f64 },

    #[error("`dimensions' attribute declares {declared} ordinates but corners have {found}")]
    DeclaredDimensionMismatch { declared: usize, found: usize },

    #[error("cannot merge a {found}-dimensional envelope into a {expected}-dimensional one")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("a 2-dimensional envelope is required (found {0} dimensions)")]
    NotTwoDimensional(usize),

    #[error("missing `{0}' element")]
    MissingElement(&'static str),

    #[error("invalid `dimensions' attribute `{0}'")]
    InvalidDimensions(String),

    #[error("element contains invalid UTF-8")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("unable to parse element")]
    Xml(#[from] quick_xml::Error),
}

/// Errors that occur while mapping a CRS identifier to a [`Crs`]
#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error("malformed CRS identifier `{0}'")]
    MalformedIdentifier(String),

    #[error("unknown CRS `{id}': {reason}")]
    UnknownCrs { id: String, reason: String },
}

/// Errors that occur while transforming coordinates between two CRSs
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("no transformation from `{from}' to `{to}': {reason}")]
    NoPath { from: Crs, to: Crs, reason: String },

    #[error("coordinates cannot be transformed from `{from}' to `{to}': {reason}")]
    InvalidCoordinates { from: Crs, to: Crs, reason: String },
}

/// Errors that occur while decoding a geometry element into coordinates
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("invalid `srsDimension' attribute `{0}'. Value must be at least 2.")]
    InvalidSrsDimension(String),

    #[error("the number of ordinates ({count}) is not a multiple of the SRS dimension {dimension}")]
    IncompletePosition { count: usize, dimension: usize },

    #[error("coordinate tuples must have at least 2 ordinates (found {0})")]
    InvalidTupleSize(usize),

    #[error("invalid coordinates")]
    Coordinates(#[from] FormatError),

    #[error("element contains invalid UTF-8")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("unable to parse geometry element")]
    Xml(#[from] quick_xml::Error),
}

/// The error that made processing a single input element fail
#[derive(Error, Debug)]
pub enum ElementError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Errors returned by the coalescer and the envelope calculator. Any error
/// aborts the whole operation.
#[derive(Error, Debug)]
pub enum ExtentError {
    #[error("no input elements given. The extent of an empty sequence is undefined.")]
    EmptyInput,

    #[error("unable to process element {index}")]
    Element {
        index: usize,
        #[source]
        source: ElementError,
    },
}

impl ExtentError {
    /// Wraps an error that occurred while processing the element at the
    /// given zero-based `index`
    pub fn element(index: usize, source: impl Into<ElementError>) -> Self {
        Self::Element {
            index,
            source: source.into(),
        }
    }

    /// Returns the index of the offending element, if any
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::EmptyInput => None,
            Self::Element { index, .. } => Some(*index),
        }
    }
}
