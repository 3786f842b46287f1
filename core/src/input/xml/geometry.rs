use std::{mem, str::from_utf8};

use geo::Rect;
use quick_xml::{
    events::{BytesStart, Event},
    Reader,
};

use crate::{
    error::DecodeError,
    input::coordinates::{parse_coordinate_tuples, parse_ordinates},
    util::extend_rect::ExtendRect,
};

/// The 2-dimensional extent of a decoded geometry element
#[derive(Clone, Debug, PartialEq)]
pub struct GeometryExtent {
    /// The outermost `srsName` found in the element, if any
    pub srs_name: Option<String>,

    /// The extent of all positions. `None` if the geometry is empty.
    pub extent: Option<Rect>,
}

/// Decodes geometry elements into coordinates
pub trait GeometryParser {
    /// Decodes one geometry element
    fn parse(&self, xml: &str) -> Result<GeometryExtent, DecodeError>;
}

/// Decodes GML 2 and GML 3 geometry elements. Positions are read from
/// `pos`, `posList`, `lowerCorner`, `upperCorner` and `coordinates`
/// elements. Only the first two ordinates of each position are considered.
#[derive(Default, Clone, Copy, Debug)]
pub struct GmlGeometryParser;

impl GeometryParser for GmlGeometryParser {
    fn parse(&self, xml: &str) -> Result<GeometryExtent, DecodeError> {
        let mut reader = Reader::from_str(xml);
        let mut collector = ExtentCollector::default();
        loop {
            let e = reader.read_event()?;
            if e == Event::Eof {
                break;
            }
            collector.on_event(&e)?;
        }
        Ok(collector.finish())
    }
}

/// Keeps track of the `srsName` and `srsDimension` attributes that apply to
/// the current element and its children
#[derive(Default)]
struct SrsContext {
    /// The current parsing depth
    depth: usize,

    /// The outermost SRS name seen so far
    outermost_srs_name: Option<String>,

    /// A stack of SRS dimensions and the depth at which they were declared
    srs_dimension: Vec<(usize, usize)>,
}

impl SrsContext {
    fn current_srs_dimension(&self) -> Option<usize> {
        self.srs_dimension.last().map(|d| d.1)
    }

    fn on_start(&mut self, s: &BytesStart) -> Result<(), DecodeError> {
        self.depth += 1;

        if self.outermost_srs_name.is_none() {
            if let Some(srs_name) = s.try_get_attribute("srsName")? {
                let srs_name = srs_name.unescape_value()?;
                if !srs_name.trim().is_empty() {
                    self.outermost_srs_name = Some(srs_name.trim().to_string());
                }
            }
        }

        if let Some(srs_dimension) = s.try_get_attribute("srsDimension")? {
            let v = srs_dimension.unescape_value()?;
            let dim = v
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|d| *d >= 2)
                .ok_or_else(|| DecodeError::InvalidSrsDimension(v.to_string()))?;
            if self.current_srs_dimension() != Some(dim) {
                self.srs_dimension.push((self.depth, dim));
            }
        }

        Ok(())
    }

    fn on_end(&mut self) {
        if let Some(current) = self.srs_dimension.last() {
            if current.0 == self.depth {
                self.srs_dimension.pop();
            }
        }
        self.depth -= 1;
    }
}

/// The kind of element containing coordinates
#[derive(Clone, Copy, PartialEq, Eq)]
enum PositionElement {
    /// `pos`, `lowerCorner` or `upperCorner`: exactly one position
    Single,

    /// `posList`: any number of positions
    List,

    /// GML 2 `coordinates` with the given tuple separator
    Tuples(char),
}

impl PositionElement {
    fn from_start(s: &BytesStart) -> Result<Option<Self>, DecodeError> {
        Ok(match s.local_name().as_ref() {
            b"pos" | b"lowerCorner" | b"upperCorner" => Some(Self::Single),
            b"posList" => Some(Self::List),
            b"coordinates" => {
                let cs = match s.try_get_attribute("cs")? {
                    Some(a) => a.unescape_value()?.chars().next().unwrap_or(','),
                    None => ',',
                };
                Some(Self::Tuples(cs))
            }
            _ => None,
        })
    }
}

/// The state the [`ExtentCollector`] is currently in
#[derive(Default)]
enum State {
    #[default]
    Initial,

    /// Collecting the text of an element containing coordinates
    Parsing {
        element: PositionElement,
        text: String,
    },
}

/// Collects the extent of all positions in a geometry element
#[derive(Default)]
struct ExtentCollector {
    srs: SrsContext,
    state: State,
    extent: Option<Rect>,
}

impl ExtentCollector {
    fn on_event(&mut self, event: &Event) -> Result<(), DecodeError> {
        match event {
            Event::Start(s) => {
                self.srs.on_start(s)?;
                if let Some(element) = PositionElement::from_start(s)? {
                    self.state = State::Parsing {
                        element,
                        text: String::new(),
                    };
                }
            }

            Event::Empty(s) => {
                // an empty element has no positions but may still carry the
                // outermost SRS name
                self.srs.on_start(s)?;
                self.srs.on_end();
            }

            Event::Text(t) => {
                if let State::Parsing { ref mut text, .. } = self.state {
                    text.push_str(&t.unescape()?);
                }
            }

            Event::CData(d) => {
                if let State::Parsing { ref mut text, .. } = self.state {
                    text.push_str(from_utf8(d)?);
                }
            }

            Event::End(_) => {
                self.finish_parsing_state()?;
                self.srs.on_end();
            }

            _ => {}
        }

        Ok(())
    }

    /// If the collector is in the state [`State::Parsing`], this function
    /// resets it to [`State::Initial`] and adds the collected positions to
    /// the extent
    fn finish_parsing_state(&mut self) -> Result<(), DecodeError> {
        let State::Parsing { element, text } = mem::take(&mut self.state) else {
            return Ok(());
        };

        let (ordinates, dim) = match element {
            PositionElement::Single => {
                let ordinates = parse_ordinates(&text)?;
                let dim = self
                    .srs
                    .current_srs_dimension()
                    .unwrap_or(ordinates.len().max(2));
                (ordinates, dim)
            }

            PositionElement::List => {
                let ordinates = parse_ordinates(&text)?;
                let n = ordinates.len();
                let dim = self.srs.current_srs_dimension().unwrap_or(
                    // The dimension was not specified in the document.
                    // Prefer 2 and only fall back to 3 if the number of
                    // ordinates does not allow anything else.
                    if n % 2 != 0 && n % 3 == 0 { 3 } else { 2 },
                );
                (ordinates, dim)
            }

            PositionElement::Tuples(cs) => {
                let (ordinates, dim) = parse_coordinate_tuples(&text, &cs.to_string())?;
                if dim < 2 && !ordinates.is_empty() {
                    return Err(DecodeError::InvalidTupleSize(dim));
                }
                // an empty element has no tuples at all
                (ordinates, dim.max(2))
            }
        };

        if ordinates.len() % dim != 0 {
            return Err(DecodeError::IncompletePosition {
                count: ordinates.len(),
                dimension: dim,
            });
        }

        for position in ordinates.chunks_exact(dim) {
            self.extent.extend_point(position[0], position[1]);
        }

        Ok(())
    }

    fn finish(self) -> GeometryExtent {
        GeometryExtent {
            srs_name: self.srs.outermost_srs_name,
            extent: self.extent,
        }
    }
}
