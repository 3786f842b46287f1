use std::str::{from_utf8, FromStr};

use quick_xml::{
    events::{BytesStart, Event},
    Reader,
};

use crate::{envelope::check_corners, error::FormatError, input::coordinates::parse_ordinates};

/// The content of one bounding box element. An empty `crs` means the
/// default lon/lat CRS.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundingBoxRecord {
    pub crs: String,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl BoundingBoxRecord {
    /// Creates a new record and checks that both corners have the same
    /// number of ordinates and that the lower corner does not exceed the
    /// upper one
    pub fn new(crs: impl Into<String>, lower: Vec<f64>, upper: Vec<f64>) -> Result<Self, FormatError> {
        check_corners(&lower, &upper)?;
        Ok(Self {
            crs: crs.into(),
            lower,
            upper,
        })
    }

    /// The number of ordinates per corner
    pub fn dimension(&self) -> usize {
        self.lower.len()
    }
}

/// The corner element the parser is currently in
#[derive(Clone, Copy)]
enum Corner {
    Lower,
    Upper,
}

impl Corner {
    fn from_local_name(name: &[u8]) -> Option<Self> {
        match name {
            b"LowerCorner" | b"lowerCorner" => Some(Self::Lower),
            b"UpperCorner" | b"upperCorner" => Some(Self::Upper),
            _ => None,
        }
    }
}

/// Reads the CRS reference and the declared dimension from the root
/// element. OWS bounding boxes use `crs`, GML envelopes use `srsName`.
fn read_root_attributes(root: &BytesStart) -> Result<(String, Option<usize>), FormatError> {
    let crs = match root.try_get_attribute("crs")? {
        Some(a) => Some(a.unescape_value()?.trim().to_string()),
        None => None,
    };
    let crs = match crs {
        Some(crs) => crs,
        None => match root.try_get_attribute("srsName")? {
            Some(a) => a.unescape_value()?.trim().to_string(),
            None => String::new(),
        },
    };

    let dimensions = root
        .try_get_attribute("dimensions")?
        .map(|a| -> Result<usize, FormatError> {
            let v = a.unescape_value()?;
            v.trim()
                .parse::<usize>()
                .map_err(|_| FormatError::InvalidDimensions(v.to_string()))
        })
        .transpose()?;

    Ok((crs, dimensions))
}

/// Parses an `ows:BoundingBox`, `ows:WGS84BoundingBox` or `gml:Envelope`
/// element. Only the first lower and upper corner are considered.
///
/// # Errors
/// Fails if the element cannot be parsed, a corner is missing or empty,
/// contains an invalid number, or if the corners (or the `dimensions`
/// attribute) disagree about the number of ordinates.
pub fn parse_bounding_box(xml: &str) -> Result<BoundingBoxRecord, FormatError> {
    let mut reader = Reader::from_str(xml);

    let mut root: Option<(String, Option<usize>)> = None;
    let mut current: Option<Corner> = None;
    let mut text = String::new();
    let mut lower: Option<Vec<f64>> = None;
    let mut upper: Option<Vec<f64>> = None;

    loop {
        match reader.read_event()? {
            Event::Start(s) => {
                if root.is_none() {
                    root = Some(read_root_attributes(&s)?);
                } else if let Some(c) = Corner::from_local_name(s.local_name().as_ref()) {
                    current = Some(c);
                    text.clear();
                }
            }

            Event::Empty(s) => {
                if root.is_none() {
                    // an empty root element cannot contain corners
                    read_root_attributes(&s)?;
                    return Err(FormatError::MissingElement("LowerCorner"));
                }
                match Corner::from_local_name(s.local_name().as_ref()) {
                    Some(Corner::Lower) if lower.is_none() => return Err(FormatError::EmptyCorner),
                    Some(Corner::Upper) if upper.is_none() => return Err(FormatError::EmptyCorner),
                    _ => {}
                }
            }

            Event::Text(t) => {
                if current.is_some() {
                    text.push_str(&t.unescape()?);
                }
            }

            Event::CData(d) => {
                if current.is_some() {
                    text.push_str(from_utf8(&d)?);
                }
            }

            Event::End(e) => {
                if let Some(c) = current {
                    if Corner::from_local_name(e.local_name().as_ref()).is_some() {
                        let slot = match c {
                            Corner::Lower => &mut lower,
                            Corner::Upper => &mut upper,
                        };
                        if slot.is_none() {
                            *slot = Some(parse_ordinates(&text)?);
                        }
                        current = None;
                    }
                }
            }

            Event::Eof => break,

            _ => {}
        }
    }

    let (crs, dimensions) = root.ok_or(FormatError::MissingElement("BoundingBox"))?;
    let lower = lower.ok_or(FormatError::MissingElement("LowerCorner"))?;
    let upper = upper.ok_or(FormatError::MissingElement("UpperCorner"))?;
    let record = BoundingBoxRecord::new(crs, lower, upper)?;

    if let Some(declared) = dimensions {
        if declared != record.dimension() {
            return Err(FormatError::DeclaredDimensionMismatch {
                declared,
                found: record.dimension(),
            });
        }
    }

    Ok(record)
}

impl FromStr for BoundingBoxRecord {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_bounding_box(s)
    }
}
