use tracing::{debug, trace};

use crate::{
    crs::{resolve_crs_reference, CoordinateTransformer, Crs, CrsResolver},
    envelope::Envelope,
    error::{ElementError, ExtentError, FormatError, ResolutionError},
    input::xml::{parse_bounding_box, BoundingBoxRecord},
};

/// Merges bounding boxes given in arbitrary CRSs into a single envelope.
///
/// The resulting envelope always uses the CRS of the first bounding box.
/// All other boxes are transformed into this CRS if necessary.
pub struct Coalescer<R, T> {
    resolver: R,
    transformer: T,
}

impl<R, T> Coalescer<R, T>
where
    R: CrsResolver,
    T: CoordinateTransformer,
{
    /// Creates a new coalescer that uses the given capabilities to resolve
    /// CRS identifiers and to transform envelopes
    pub fn new(resolver: R, transformer: T) -> Self {
        Self {
            resolver,
            transformer,
        }
    }

    /// Maps the CRS reference of a bounding box to a CRS handle. See
    /// [`resolve_crs_reference`].
    pub fn resolve_crs(&self, crs_ref: &str) -> Result<Crs, ResolutionError> {
        resolve_crs_reference(&self.resolver, crs_ref)
    }

    /// Parses each element as a bounding box (`ows:BoundingBox`,
    /// `ows:WGS84BoundingBox` or `gml:Envelope`) and coalesces them.
    ///
    /// # Errors
    /// See [`Self::coalesce_records`]. Elements that cannot be parsed fail
    /// with a [`FormatError`].
    pub fn coalesce_elements<I, S>(&self, elements: I) -> Result<Envelope, ExtentError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.coalesce(
            elements
                .into_iter()
                .map(|e| parse_bounding_box(e.as_ref()).map_err(ElementError::from)),
        )
    }

    /// Coalesces already parsed bounding boxes.
    ///
    /// # Errors
    /// Fails with [`ExtentError::EmptyInput`] if there are no records.
    /// Fails with [`ExtentError::Element`] if a CRS cannot be resolved, if
    /// a box cannot be transformed, or if a box has a different number of
    /// dimensions than the first one. No partial result is returned.
    pub fn coalesce_records<I>(&self, records: I) -> Result<Envelope, ExtentError>
    where
        I: IntoIterator<Item = BoundingBoxRecord>,
    {
        self.coalesce(records.into_iter().map(Ok))
    }

    fn coalesce<I>(&self, records: I) -> Result<Envelope, ExtentError>
    where
        I: Iterator<Item = Result<BoundingBoxRecord, ElementError>>,
    {
        let mut total_extent: Option<Envelope> = None;

        for (index, record) in records.enumerate() {
            let next = record
                .and_then(|r| self.to_envelope(r))
                .map_err(|err| ExtentError::element(index, err))?;

            match total_extent {
                None => {
                    // the first box determines the CRS of the result
                    debug!(crs = %next.crs(), dimension = next.dimension(), "initial extent");
                    total_extent = Some(next);
                }
                Some(ref mut total) => {
                    self.merge(total, next)
                        .map_err(|err| ExtentError::element(index, err))?;
                }
            }
        }

        total_extent.ok_or(ExtentError::EmptyInput)
    }

    /// Resolves the record's CRS and creates an envelope from its corners
    fn to_envelope(&self, record: BoundingBoxRecord) -> Result<Envelope, ElementError> {
        let crs = self.resolve_crs(&record.crs)?;
        trace!(crs_ref = %record.crs, %crs, "resolved bounding box CRS");
        Ok(Envelope::new(crs, record.lower, record.upper)?)
    }

    /// Extends `total` so it covers `next`. Transforms `next` into the CRS of
    /// `total` first if they differ.
    fn merge(&self, total: &mut Envelope, next: Envelope) -> Result<(), ElementError> {
        if next.dimension() != total.dimension() {
            return Err(FormatError::DimensionMismatch {
                expected: total.dimension(),
                found: next.dimension(),
            }
            .into());
        }

        let next = if next.crs() == total.crs() {
            next
        } else {
            debug!(from = %next.crs(), to = %total.crs(), "transforming bounding box");
            self.transformer.transform(&next, total.crs())?
        };

        total.expand_to_include(&next)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use assertor::{assert_that, EqualityAssertion};
    use pretty_assertions::assert_eq;
    use rand::{seq::SliceRandom, thread_rng, Rng};

    use crate::{
        crs::{CoordinateTransformer, Crs, CrsResolver},
        envelope::Envelope,
        error::{ElementError, ExtentError, FormatError, ResolutionError, TransformError},
        input::xml::BoundingBoxRecord,
    };

    use super::Coalescer;

    /// Knows every CRS of the `TEST` authority
    #[derive(Default)]
    struct FakeResolver {
        calls: Cell<usize>,
    }

    impl CrsResolver for FakeResolver {
        fn resolve(&self, id: &str) -> Result<Crs, ResolutionError> {
            self.calls.set(self.calls.get() + 1);
            match id.split_once(':') {
                Some(("TEST", code)) => Ok(Crs::new("TEST", code)),
                _ => Err(ResolutionError::UnknownCrs {
                    id: id.to_string(),
                    reason: "not a test CRS".to_string(),
                }),
            }
        }
    }

    /// Transforms from `TEST:B` to `TEST:A` by subtracting 50 from every
    /// ordinate. All other transformations fail.
    #[derive(Default)]
    struct FakeTransformer {
        calls: Cell<usize>,
    }

    impl CoordinateTransformer for FakeTransformer {
        fn transform(&self, envelope: &Envelope, target: &Crs) -> Result<Envelope, TransformError> {
            self.calls.set(self.calls.get() + 1);
            if envelope.crs() == &crs("B") && target == &crs("A") {
                let shift = |v: &[f64]| v.iter().map(|o| o - 50.0).collect::<Vec<_>>();
                Ok(Envelope::new(target.clone(), shift(envelope.lower()), shift(envelope.upper())).unwrap())
            } else {
                Err(TransformError::NoPath {
                    from: envelope.crs().clone(),
                    to: target.clone(),
                    reason: "no test transformation".to_string(),
                })
            }
        }
    }

    fn crs(code: &str) -> Crs {
        Crs::new("TEST", code)
    }

    fn record(crs: &str, lower: &[f64], upper: &[f64]) -> BoundingBoxRecord {
        BoundingBoxRecord::new(crs, lower.to_vec(), upper.to_vec()).unwrap()
    }

    fn envelope(crs: Crs, lower: &[f64], upper: &[f64]) -> Envelope {
        Envelope::new(crs, lower.to_vec(), upper.to_vec()).unwrap()
    }

    #[test]
    fn same_crs() {
        let (r, t) = (FakeResolver::default(), FakeTransformer::default());
        let c = Coalescer::new(&r, &t);
        let result = c
            .coalesce_records([
                record("TEST:A", &[0.0, 0.0], &[10.0, 10.0]),
                record("TEST:A", &[5.0, 5.0], &[20.0, 20.0]),
            ])
            .unwrap();
        assert_eq!(result, envelope(crs("A"), &[0.0, 0.0], &[20.0, 20.0]));
        assert_that!(t.calls.get()).is_equal_to(0);
    }

    #[test]
    fn different_crs() {
        let (r, t) = (FakeResolver::default(), FakeTransformer::default());
        let c = Coalescer::new(&r, &t);
        let result = c
            .coalesce_records([
                record("TEST:A", &[0.0, 0.0], &[10.0, 10.0]),
                record("TEST:B", &[100.0, 100.0], &[200.0, 200.0]),
            ])
            .unwrap();
        assert_eq!(result, envelope(crs("A"), &[0.0, 0.0], &[150.0, 150.0]));
        assert_that!(t.calls.get()).is_equal_to(1);
    }

    #[test]
    fn first_box_determines_crs() {
        let (r, t) = (FakeResolver::default(), FakeTransformer::default());
        let c = Coalescer::new(&r, &t);

        // there is no transformation from A to B, so the operation must fail
        // instead of picking another target CRS
        let err = c
            .coalesce_records([
                record("TEST:B", &[100.0, 100.0], &[200.0, 200.0]),
                record("TEST:A", &[0.0, 0.0], &[10.0, 10.0]),
            ])
            .unwrap_err();
        assert_that!(err.index()).is_equal_to(Some(1));
        assert!(matches!(
            err,
            ExtentError::Element {
                source: ElementError::Transform(TransformError::NoPath { .. }),
                ..
            }
        ));
    }

    #[test]
    fn single_box_is_returned_unchanged() {
        let (r, t) = (FakeResolver::default(), FakeTransformer::default());
        let c = Coalescer::new(&r, &t);
        let result = c
            .coalesce_records([record("TEST:B", &[3.5, -1.25, 7.0], &[4.0, 2.0, 9.0])])
            .unwrap();
        assert_eq!(result, envelope(crs("B"), &[3.5, -1.25, 7.0], &[4.0, 2.0, 9.0]));
        assert_that!(t.calls.get()).is_equal_to(0);
    }

    #[test]
    fn empty_input() {
        let (r, t) = (FakeResolver::default(), FakeTransformer::default());
        let c = Coalescer::new(&r, &t);
        let err = c.coalesce_records(Vec::<BoundingBoxRecord>::new()).unwrap_err();
        assert!(matches!(err, ExtentError::EmptyInput));
        let err = c.coalesce_elements(Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, ExtentError::EmptyInput));
    }

    #[test]
    fn default_crs_keeps_lon_lat_order() {
        let (r, t) = (FakeResolver::default(), FakeTransformer::default());
        let c = Coalescer::new(&r, &t);
        let result = c
            .coalesce_records([
                record("", &[-10.0, 40.0], &[5.0, 52.0]),
                record("urn:ogc:def:crs:OGC:1.3:CRS84", &[2.0, 35.0], &[30.0, 45.0]),
                record("http://www.opengis.net/def/crs/OGC/1.3/CRS84", &[0.0, 50.0], &[1.0, 60.0]),
                record("urn:ogc:def:crs:OGC:1.3:crs84", &[0.0, 40.0], &[1.0, 41.0]),
            ])
            .unwrap();
        assert_eq!(result, envelope(Crs::crs84(), &[-10.0, 35.0], &[30.0, 60.0]));

        // the default CRS never needs the resolver or the transformer
        assert_that!(r.calls.get()).is_equal_to(0);
        assert_that!(t.calls.get()).is_equal_to(0);
    }

    #[test]
    fn identifiers_are_abbreviated() {
        let (r, t) = (FakeResolver::default(), FakeTransformer::default());
        let c = Coalescer::new(&r, &t);
        let result = c
            .coalesce_records([
                record("urn:ogc:def:crs:TEST::A", &[0.0, 0.0], &[1.0, 1.0]),
                record("http://www.opengis.net/def/crs/TEST/0/A", &[2.0, 2.0], &[3.0, 3.0]),
                record("TEST:A", &[-1.0, 0.5], &[0.0, 0.5]),
            ])
            .unwrap();
        assert_eq!(result, envelope(crs("A"), &[-1.0, 0.0], &[3.0, 3.0]));
        assert_that!(r.calls.get()).is_equal_to(3);
        assert_that!(t.calls.get()).is_equal_to(0);
    }

    #[test]
    fn matches_plain_min_max() {
        let mut rng = thread_rng();
        let (r, t) = (FakeResolver::default(), FakeTransformer::default());
        let c = Coalescer::new(&r, &t);

        for _ in 0..20 {
            let n = rng.gen_range(1..10);
            let records = (0..n)
                .map(|_| {
                    let lower = [rng.gen_range(-1000.0..1000.0), rng.gen_range(-1000.0..1000.0)];
                    let upper = [
                        lower[0] + rng.gen_range(0.0..100.0),
                        lower[1] + rng.gen_range(0.0..100.0),
                    ];
                    record("TEST:A", &lower, &upper)
                })
                .collect::<Vec<_>>();

            let min = |i: usize| records.iter().map(|r| r.lower[i]).fold(f64::INFINITY, f64::min);
            let max = |i: usize| {
                records
                    .iter()
                    .map(|r| r.upper[i])
                    .fold(f64::NEG_INFINITY, f64::max)
            };
            let expected = envelope(crs("A"), &[min(0), min(1)], &[max(0), max(1)]);

            let result = c.coalesce_records(records.clone()).unwrap();
            assert_eq!(result, expected);
        }
        assert_that!(t.calls.get()).is_equal_to(0);
    }

    #[test]
    fn order_independent() {
        let mut rng = thread_rng();
        let (r, t) = (FakeResolver::default(), FakeTransformer::default());
        let c = Coalescer::new(&r, &t);

        let first = record("TEST:A", &[0.0, 0.0], &[10.0, 10.0]);
        let mut rest = vec![
            record("TEST:B", &[100.0, 100.0], &[200.0, 200.0]),
            record("TEST:A", &[-5.0, 3.0], &[1.0, 4.0]),
            record("TEST:B", &[20.0, 40.0], &[30.0, 45.0]),
            record("TEST:A", &[7.0, -30.0], &[8.0, -20.0]),
            record("TEST:B", &[50.0, 50.0], &[51.0, 300.0]),
        ];

        let expected = c
            .coalesce_records(std::iter::once(first.clone()).chain(rest.clone()))
            .unwrap();
        assert_eq!(expected, envelope(crs("A"), &[-30.0, -30.0], &[150.0, 250.0]));

        for _ in 0..10 {
            rest.shuffle(&mut rng);
            let result = c
                .coalesce_records(std::iter::once(first.clone()).chain(rest.clone()))
                .unwrap();
            assert_eq!(result, expected);
        }
    }

    #[test]
    fn malformed_corner_aborts() {
        let (r, t) = (FakeResolver::default(), FakeTransformer::default());
        let c = Coalescer::new(&r, &t);
        let err = c
            .coalesce_elements([
                r#"<BoundingBox crs="TEST:A"><LowerCorner>0 0</LowerCorner><UpperCorner>10 10</UpperCorner></BoundingBox>"#,
                r#"<BoundingBox crs="TEST:A"><LowerCorner>1 one</LowerCorner><UpperCorner>2 2</UpperCorner></BoundingBox>"#,
                r#"<BoundingBox crs="TEST:A"><LowerCorner>5 5</LowerCorner><UpperCorner>20 20</UpperCorner></BoundingBox>"#,
            ])
            .unwrap_err();
        assert_that!(err.index()).is_equal_to(Some(1));
        assert!(matches!(
            err,
            ExtentError::Element {
                source: ElementError::Format(FormatError::InvalidNumber(_)),
                ..
            }
        ));
    }

    #[test]
    fn unknown_crs_aborts() {
        let (r, t) = (FakeResolver::default(), FakeTransformer::default());
        let c = Coalescer::new(&r, &t);
        let err = c
            .coalesce_records([
                record("TEST:A", &[0.0, 0.0], &[1.0, 1.0]),
                record("TEST:A", &[0.0, 0.0], &[1.0, 1.0]),
                record("urn:ogc:def:crs:EPSG::4326", &[0.0, 0.0], &[1.0, 1.0]),
            ])
            .unwrap_err();
        assert_that!(err.index()).is_equal_to(Some(2));
        assert!(matches!(
            err,
            ExtentError::Element {
                source: ElementError::Resolution(ResolutionError::UnknownCrs { .. }),
                ..
            }
        ));

        let err = c
            .coalesce_records([record("not a crs", &[0.0, 0.0], &[1.0, 1.0])])
            .unwrap_err();
        assert!(matches!(
            err,
            ExtentError::Element {
                index: 0,
                source: ElementError::Resolution(ResolutionError::MalformedIdentifier(_)),
            }
        ));
    }

    #[test]
    fn inverted_box_aborts() {
        let (r, t) = (FakeResolver::default(), FakeTransformer::default());
        let c = Coalescer::new(&r, &t);

        // records built without validation are checked, too
        let inverted = BoundingBoxRecord {
            crs: String::new(),
            lower: vec![170.0, -10.0],
            upper: vec![-170.0, 10.0],
        };
        let err = c.coalesce_records([inverted.clone()]).unwrap_err();
        assert!(matches!(
            err,
            ExtentError::Element {
                index: 0,
                source: ElementError::Format(FormatError::InvertedCorner { axis: 0, .. }),
            }
        ));

        // the box must not vanish when it is merged with others
        let err = c
            .coalesce_records([inverted, record("", &[0.0, 0.0], &[10.0, 5.0])])
            .unwrap_err();
        assert_that!(err.index()).is_equal_to(Some(0));

        let err = c
            .coalesce_elements([
                r#"<BoundingBox><LowerCorner>0 0</LowerCorner><UpperCorner>10 5</UpperCorner></BoundingBox>"#,
                r#"<BoundingBox><LowerCorner>170 -10</LowerCorner><UpperCorner>-170 10</UpperCorner></BoundingBox>"#,
            ])
            .unwrap_err();
        assert!(matches!(
            err,
            ExtentError::Element {
                index: 1,
                source: ElementError::Format(FormatError::InvertedCorner { axis: 0, .. }),
            }
        ));
    }

    #[test]
    fn dimension_mismatch_aborts() {
        let (r, t) = (FakeResolver::default(), FakeTransformer::default());
        let c = Coalescer::new(&r, &t);
        let err = c
            .coalesce_records([
                record("TEST:A", &[0.0, 0.0], &[1.0, 1.0]),
                record("TEST:B", &[0.0, 0.0, 0.0], &[1.0, 1.0, 1.0]),
            ])
            .unwrap_err();
        assert!(matches!(
            err,
            ExtentError::Element {
                index: 1,
                source: ElementError::Format(FormatError::DimensionMismatch {
                    expected: 2,
                    found: 3
                }),
            }
        ));
        // the mismatch is detected before any transformation
        assert_that!(t.calls.get()).is_equal_to(0);
    }

    #[test]
    fn elements() {
        let (r, t) = (FakeResolver::default(), FakeTransformer::default());
        let c = Coalescer::new(&r, &t);
        let elements = vec![
            r#"<ows:BoundingBox xmlns:ows="http://www.opengis.net/ows/2.0" crs="urn:ogc:def:crs:TEST::A"><ows:LowerCorner>0 0</ows:LowerCorner><ows:UpperCorner>10 10</ows:UpperCorner></ows:BoundingBox>"#.to_string(),
            r#"<ows:BoundingBox xmlns:ows="http://www.opengis.net/ows/2.0" crs="urn:ogc:def:crs:TEST::B"><ows:LowerCorner>100 100</ows:LowerCorner><ows:UpperCorner>200 200</ows:UpperCorner></ows:BoundingBox>"#.to_string(),
        ];
        let result = c.coalesce_elements(&elements).unwrap();
        assert_eq!(result, envelope(crs("A"), &[0.0, 0.0], &[150.0, 150.0]));
    }

    #[test]
    fn error_message_names_element() {
        let (r, t) = (FakeResolver::default(), FakeTransformer::default());
        let c = Coalescer::new(&r, &t);
        let err = c
            .coalesce_records([
                record("TEST:A", &[0.0, 0.0], &[1.0, 1.0]),
                record("FOO:1", &[0.0, 0.0], &[1.0, 1.0]),
            ])
            .unwrap_err();
        assert_that!(err.to_string()).is_equal_to("unable to process element 1".to_string());
        let source = std::error::Error::source(&err).unwrap().to_string();
        assert_that!(source).is_equal_to("unknown CRS `FOO:1': not a test CRS".to_string());
    }
}
