use geo::Rect;
use tracing::{debug, warn};

use crate::{
    crs::{resolve_crs_reference, Crs, CrsResolver},
    envelope::Envelope,
    error::ExtentError,
    input::xml::GeometryParser,
    util::extend_rect::ExtendRect,
};

/// Computes the 2D envelope covering a sequence of GML geometries.
///
/// Geometries are not transformed. The envelope is reported in the CRS
/// declared by the last geometry that carries a `srsName`. If no geometry
/// declares a CRS, the default lon/lat CRS is used.
pub struct EnvelopeCalculator<P, R> {
    parser: P,
    resolver: R,
}

impl<P, R> EnvelopeCalculator<P, R>
where
    P: GeometryParser,
    R: CrsResolver,
{
    pub fn new(parser: P, resolver: R) -> Self {
        Self { parser, resolver }
    }

    /// Decodes every element and returns the union of their 2D extents.
    /// Geometries without coordinates are skipped.
    ///
    /// # Errors
    /// Fails with [`ExtentError::EmptyInput`] if no geometry contributed a
    /// coordinate. Fails with [`ExtentError::Element`] if an element cannot
    /// be decoded or if its CRS reference cannot be resolved.
    pub fn calculate<I, S>(&self, elements: I) -> Result<Envelope, ExtentError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut extent: Option<Rect> = None;
        let mut srs_name: Option<(usize, String)> = None;

        for (index, element) in elements.into_iter().enumerate() {
            let geometry = self
                .parser
                .parse(element.as_ref())
                .map_err(|err| ExtentError::element(index, err))?;

            if let Some(name) = geometry.srs_name {
                if let Some((_, previous)) = &srs_name {
                    if previous != &name {
                        warn!(
                            %previous,
                            current = %name,
                            index,
                            "geometries declare different CRSs. Coordinates will not be transformed."
                        );
                    }
                }
                srs_name = Some((index, name));
            }

            match geometry.extent {
                Some(r) => extent.extend_rect(&r),
                None => debug!(index, "skipping geometry without coordinates"),
            }
        }

        let extent = extent.ok_or(ExtentError::EmptyInput)?;

        let crs = match srs_name {
            Some((index, name)) => resolve_crs_reference(&self.resolver, &name)
                .map_err(|err| ExtentError::element(index, err))?,
            None => Crs::crs84(),
        };

        Ok(Envelope::from_rect(crs, extent))
    }
}

/// Computes the envelope of the given GML geometries. See
/// [`EnvelopeCalculator::calculate`].
pub fn calculate_envelope<P, R, I, S>(
    parser: P,
    resolver: R,
    elements: I,
) -> Result<Envelope, ExtentError>
where
    P: GeometryParser,
    R: CrsResolver,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    EnvelopeCalculator::new(parser, resolver).calculate(elements)
}

#[cfg(test)]
mod tests {
    use assertor::{assert_that, EqualityAssertion};
    use geo::{coord, Rect};
    use pretty_assertions::assert_eq;

    use crate::{
        crs::{Crs, CrsResolver},
        envelope::Envelope,
        error::{DecodeError, ElementError, ExtentError, ResolutionError},
        input::xml::{GeometryExtent, GeometryParser, GmlGeometryParser},
    };

    use super::{calculate_envelope, EnvelopeCalculator};

    struct EpsgResolver;

    impl CrsResolver for EpsgResolver {
        fn resolve(&self, id: &str) -> Result<Crs, ResolutionError> {
            match id.split_once(':') {
                Some(("EPSG", code)) => Ok(Crs::new("EPSG", code)),
                _ => Err(ResolutionError::UnknownCrs {
                    id: id.to_string(),
                    reason: "only EPSG codes are known".to_string(),
                }),
            }
        }
    }

    /// Returns a fixed extent for every element and interprets the element
    /// text as the srsName
    struct FixedParser(Option<Rect>);

    impl GeometryParser for FixedParser {
        fn parse(&self, xml: &str) -> Result<GeometryExtent, DecodeError> {
            Ok(GeometryExtent {
                srs_name: (!xml.is_empty()).then(|| xml.to_string()),
                extent: self.0,
            })
        }
    }

    fn envelope(crs: Crs, lower: [f64; 2], upper: [f64; 2]) -> Envelope {
        Envelope::new(crs, lower.to_vec(), upper.to_vec()).unwrap()
    }

    #[test]
    fn union_of_geometries() {
        let result = calculate_envelope(
            GmlGeometryParser,
            EpsgResolver,
            [
                r#"<gml:Point srsName="EPSG:25832"><gml:pos>5 6</gml:pos></gml:Point>"#,
                r#"<gml:LineString><gml:posList>1 8 3 -2</gml:posList></gml:LineString>"#,
            ],
        )
        .unwrap();
        assert_eq!(result, envelope(Crs::new("EPSG", "25832"), [1.0, -2.0], [5.0, 8.0]));
    }

    #[test]
    fn last_srs_name_wins() {
        let result = calculate_envelope(
            GmlGeometryParser,
            EpsgResolver,
            [
                r#"<gml:Point srsName="EPSG:4326"><gml:pos>1 2</gml:pos></gml:Point>"#,
                r#"<gml:Point srsName="urn:ogc:def:crs:EPSG::25832"><gml:pos>3 4</gml:pos></gml:Point>"#,
                r#"<gml:Point><gml:pos>0 0</gml:pos></gml:Point>"#,
            ],
        )
        .unwrap();
        assert_eq!(result, envelope(Crs::new("EPSG", "25832"), [0.0, 0.0], [3.0, 4.0]));
    }

    #[test]
    fn default_crs() {
        let rect = Rect::new(coord! { x: 1.0, y: 2.0 }, coord! { x: 3.0, y: 4.0 });
        let c = EnvelopeCalculator::new(FixedParser(Some(rect)), EpsgResolver);
        let result = c.calculate([""]).unwrap();
        assert_eq!(result, envelope(Crs::crs84(), [1.0, 2.0], [3.0, 4.0]));

        let result = c.calculate(["", "urn:ogc:def:crs:OGC:1.3:CRS84", ""]).unwrap();
        assert_that!(result.crs().clone()).is_equal_to(Crs::crs84());
    }

    #[test]
    fn empty_geometries_are_skipped() {
        let result = calculate_envelope(
            GmlGeometryParser,
            EpsgResolver,
            [
                r#"<gml:Polygon srsName="EPSG:25832"/>"#,
                r#"<gml:Point><gml:pos>-1 -2</gml:pos></gml:Point>"#,
            ],
        )
        .unwrap();
        assert_eq!(result, envelope(Crs::new("EPSG", "25832"), [-1.0, -2.0], [-1.0, -2.0]));
    }

    #[test]
    fn no_coordinates() {
        let err = calculate_envelope(GmlGeometryParser, EpsgResolver, Vec::<String>::new())
            .unwrap_err();
        assert!(matches!(err, ExtentError::EmptyInput));

        let c = EnvelopeCalculator::new(FixedParser(None), EpsgResolver);
        assert!(matches!(c.calculate(["EPSG:4326", ""]), Err(ExtentError::EmptyInput)));
    }

    #[test]
    fn decode_error_aborts() {
        let err = calculate_envelope(
            GmlGeometryParser,
            EpsgResolver,
            [
                r#"<gml:Point><gml:pos>1 2</gml:pos></gml:Point>"#,
                r#"<gml:Point><gml:pos>1 x</gml:pos></gml:Point>"#,
            ],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ExtentError::Element {
                index: 1,
                source: ElementError::Decode(_),
            }
        ));
    }

    #[test]
    fn unknown_crs_names_declaring_element() {
        let rect = Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 1.0, y: 1.0 });
        let c = EnvelopeCalculator::new(FixedParser(Some(rect)), EpsgResolver);
        let err = c.calculate(["EPSG:4326", "FOO:1", ""]).unwrap_err();
        assert_that!(err.index()).is_equal_to(Some(1));
        assert!(matches!(
            err,
            ExtentError::Element {
                source: ElementError::Resolution(ResolutionError::UnknownCrs { .. }),
                ..
            }
        ));
    }
}
