use std::sync::OnceLock;

use regex::Regex;

use crate::error::ResolutionError;

use super::Crs;

/// The URN of the default geographic CRS (WGS 84, longitude before latitude)
pub const OGC_CRS84: &str = "urn:ogc:def:crs:OGC:1.3:CRS84";

/// The abbreviated form of [`OGC_CRS84`]
const OGC_CRS84_ABBREVIATED: &str = "OGC:CRS84";

/// `urn:ogc:def:crs:AUTHORITY:[VERSION]:CODE`. Older documents use the
/// `x-ogc` namespace.
const URN_REGEX: &str = r"(?i)^urn:(?:x-)?ogc:def:crs:([a-z][\w.-]*):[^:]*:([\w.-]+)$";

/// `http://www.opengis.net/def/crs/AUTHORITY/VERSION/CODE`
const HTTP_REGEX: &str = r"(?i)^https?://www\.opengis\.net/def/crs/([a-z][\w.-]*)/[^/]+/([\w.-]+)$";

/// `http://www.opengis.net/gml/srs/epsg.xml#CODE`
const GML_EPSG_REGEX: &str = r"(?i)^https?://www\.opengis\.net/gml/srs/epsg\.xml#(\d+)$";

/// `AUTHORITY:CODE`
const ABBREVIATED_REGEX: &str = r"^([A-Za-z][\w.-]*):([\w.-]+)$";

struct IdentifierPatterns {
    urn: Regex,
    http: Regex,
    gml_epsg: Regex,
    abbreviated: Regex,
}

fn patterns() -> &'static IdentifierPatterns {
    static PATTERNS: OnceLock<IdentifierPatterns> = OnceLock::new();

    // # Panic Safety
    // All expressions are compiled in the unit test `patterns_are_valid`
    PATTERNS.get_or_init(|| IdentifierPatterns {
        urn: Regex::new(URN_REGEX).expect("the URN regex should be valid"),
        http: Regex::new(HTTP_REGEX).expect("the HTTP regex should be valid"),
        gml_epsg: Regex::new(GML_EPSG_REGEX).expect("the GML EPSG regex should be valid"),
        abbreviated: Regex::new(ABBREVIATED_REGEX).expect("the abbreviated regex should be valid"),
    })
}

/// Normalizes a CRS reference (URN, HTTP URI or abbreviated form) to the
/// abbreviated `AUTHORITY:CODE` form. The authority is returned in upper
/// case.
///
/// # Errors
/// Returns [`ResolutionError::MalformedIdentifier`] if the reference does not
/// follow any of the known forms.
pub fn abbreviate_crs_identifier(crs_ref: &str) -> Result<String, ResolutionError> {
    let crs_ref = crs_ref.trim();
    let p = patterns();

    if let Some(c) = p.gml_epsg.captures(crs_ref) {
        return Ok(format!("EPSG:{}", &c[1]));
    }

    let captures = p
        .urn
        .captures(crs_ref)
        .or_else(|| p.http.captures(crs_ref))
        .or_else(|| p.abbreviated.captures(crs_ref))
        .ok_or_else(|| ResolutionError::MalformedIdentifier(crs_ref.to_owned()))?;

    Ok(format!("{}:{}", captures[1].to_uppercase(), &captures[2]))
}

/// Returns `true` if the given CRS reference is absent (empty) or denotes
/// the default lon/lat CRS
pub fn is_crs84_identifier(crs_ref: &str) -> bool {
    let crs_ref = crs_ref.trim();
    if crs_ref.is_empty() || crs_ref.eq_ignore_ascii_case(OGC_CRS84) {
        return true;
    }
    match abbreviate_crs_identifier(crs_ref) {
        Ok(id) => id.eq_ignore_ascii_case(OGC_CRS84_ABBREVIATED) || id.eq_ignore_ascii_case("CRS:84"),
        Err(_) => false,
    }
}

/// Returns the URN that identifies the given CRS in serialized output
pub fn crs_identifier(crs: &Crs) -> String {
    if crs.is_crs84() {
        OGC_CRS84.to_string()
    } else {
        format!("urn:ogc:def:crs:{}::{}", crs.authority(), crs.code())
    }
}
