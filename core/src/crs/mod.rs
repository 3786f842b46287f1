use std::fmt::{Display, Formatter};

use crate::{
    envelope::Envelope,
    error::{ResolutionError, TransformError},
};

pub use self::identifier::{abbreviate_crs_identifier, crs_identifier, is_crs84_identifier};
pub use self::proj_provider::ProjProvider;

pub mod identifier;
pub mod proj_provider;

/// A handle to a coordinate reference system. Two handles are equal if they
/// denote the same authority and code.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Crs {
    authority: String,
    code: String,
}

impl Crs {
    /// Creates a handle from an authority (e.g. `EPSG`) and a code. The
    /// authority is case-insensitive and will be stored in upper case.
    pub fn new(authority: impl AsRef<str>, code: impl Into<String>) -> Self {
        Self {
            authority: authority.as_ref().to_uppercase(),
            code: code.into(),
        }
    }

    /// The default geographic CRS with longitude before latitude
    pub fn crs84() -> Self {
        Self::new("OGC", "CRS84")
    }

    /// Returns `true` if this is the default lon/lat CRS
    pub fn is_crs84(&self) -> bool {
        self.authority == "OGC" && self.code == "CRS84"
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn code(&self) -> &str {
        &self.code
    }
}

/// Renders the abbreviated `AUTHORITY:CODE` form
impl Display for Crs {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.authority, self.code)
    }
}

/// Maps abbreviated `AUTHORITY:CODE` identifiers to CRS handles
pub trait CrsResolver {
    /// Resolves the given identifier or fails if the CRS is unknown
    fn resolve(&self, id: &str) -> Result<Crs, ResolutionError>;
}

/// Transforms envelopes between two coordinate reference systems
pub trait CoordinateTransformer {
    /// Returns the smallest envelope in `target` that covers `envelope`
    fn transform(&self, envelope: &Envelope, target: &Crs) -> Result<Envelope, TransformError>;
}

/// Maps a CRS reference found in a document to a CRS handle. An empty
/// reference or a CRS84 token means the default lon/lat CRS. Everything else
/// is abbreviated to `AUTHORITY:CODE` and passed to the resolver.
pub fn resolve_crs_reference<R>(resolver: &R, crs_ref: &str) -> Result<Crs, ResolutionError>
where
    R: CrsResolver + ?Sized,
{
    if is_crs84_identifier(crs_ref) {
        return Ok(Crs::crs84());
    }
    let id = abbreviate_crs_identifier(crs_ref)?;
    resolver.resolve(&id)
}

impl<R: CrsResolver + ?Sized> CrsResolver for &R {
    fn resolve(&self, id: &str) -> Result<Crs, ResolutionError> {
        (**self).resolve(id)
    }
}

impl<T: CoordinateTransformer + ?Sized> CoordinateTransformer for &T {
    fn transform(&self, envelope: &Envelope, target: &Crs) -> Result<Envelope, TransformError> {
        (**self).transform(envelope, target)
    }
}
