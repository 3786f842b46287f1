use std::ops::Range;

use quick_xml::{events::Event, Reader};

/// Local names of bounding box elements
const BOUNDING_BOX_NAMES: &[&[u8]] = &[b"BoundingBox", b"WGS84BoundingBox"];

/// Local names of GML geometry elements
const GEOMETRY_NAMES: &[&[u8]] = &[
    b"Point",
    b"LineString",
    b"LinearRing",
    b"Curve",
    b"OrientableCurve",
    b"CompositeCurve",
    b"Polygon",
    b"Surface",
    b"PolyhedralSurface",
    b"TriangulatedSurface",
    b"Tin",
    b"OrientableSurface",
    b"CompositeSurface",
    b"Solid",
    b"CompositeSolid",
    b"MultiPoint",
    b"MultiCurve",
    b"MultiLineString",
    b"MultiSurface",
    b"MultiPolygon",
    b"MultiSolid",
    b"MultiGeometry",
    b"GeometricComplex",
    b"Envelope",
    b"Box",
];

/// Returns `true` if the local name denotes an OWS bounding box
pub fn is_bounding_box(local_name: &[u8]) -> bool {
    BOUNDING_BOX_NAMES.contains(&local_name)
}

/// Returns `true` if the local name denotes a GML geometry
pub fn is_gml_geometry(local_name: &[u8]) -> bool {
    GEOMETRY_NAMES.contains(&local_name)
}

/// Finds the outermost elements whose local name matches a predicate.
/// Elements nested inside a match are part of that match and are not
/// reported separately.
pub struct ElementSplitter<F> {
    matches: F,

    /// The current depth in the XML DOM
    depth: usize,

    /// The depth and byte position of the opening tag of the element
    /// currently being collected
    mark: Option<(usize, usize)>,
}

impl<F> ElementSplitter<F>
where
    F: Fn(&[u8]) -> bool,
{
    pub fn new(matches: F) -> Self {
        Self {
            matches,
            depth: 0,
            mark: None,
        }
    }

    /// Will be called on every XML event. `pos` is the byte range of the
    /// event in the document. Returns the byte range of a complete matching
    /// element or [`None`].
    pub fn on_event(&mut self, e: &Event, pos: Range<usize>) -> Option<Range<usize>> {
        match e {
            Event::Start(s) => {
                self.depth += 1;
                if self.mark.is_none() && (self.matches)(s.local_name().as_ref()) {
                    self.mark = Some((self.depth, pos.start));
                }
                None
            }

            Event::Empty(s) => {
                if self.mark.is_none() && (self.matches)(s.local_name().as_ref()) {
                    Some(pos)
                } else {
                    None
                }
            }

            Event::End(_) => {
                let mut result = None;
                if let Some((depth, start)) = self.mark {
                    if depth == self.depth {
                        result = Some(start..pos.end);
                        self.mark = None;
                    }
                }
                self.depth -= 1;
                result
            }

            _ => None,
        }
    }
}

/// Returns the byte ranges of the outermost elements whose local name
/// matches `matches`, in document order
pub fn split_element_ranges<F>(xml: &str, matches: F) -> Result<Vec<Range<usize>>, quick_xml::Error>
where
    F: Fn(&[u8]) -> bool,
{
    let mut reader = Reader::from_str(xml);
    let mut splitter = ElementSplitter::new(matches);
    let mut result = Vec::new();
    loop {
        let start_pos = reader.buffer_position();
        let e = reader.read_event()?;
        let end_pos = reader.buffer_position();
        if e == Event::Eof {
            break;
        }
        if let Some(r) = splitter.on_event(&e, start_pos..end_pos) {
            result.push(r);
        }
    }
    Ok(result)
}

/// Extracts the outermost elements whose local name matches `matches` from
/// the given document, in document order
pub fn split_elements<F>(xml: &str, matches: F) -> Result<Vec<&str>, quick_xml::Error>
where
    F: Fn(&[u8]) -> bool,
{
    Ok(split_element_ranges(xml, matches)?
        .into_iter()
        .map(|r| &xml[r])
        .collect())
}
