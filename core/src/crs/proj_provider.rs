use std::{
    cell::RefCell,
    collections::hash_map::Entry::{Occupied, Vacant},
    rc::Rc,
};

use proj::Proj;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use tracing::{debug, trace};

use crate::{
    envelope::Envelope,
    error::{ResolutionError, TransformError},
};

use super::{CoordinateTransformer, Crs, CrsResolver};

/// The number of segments each edge of an envelope is split into before it
/// is transformed. Curved edges in the target CRS are covered by the
/// intermediate points.
const DENSIFY_SEGMENTS: usize = 20;

/// The order of the first two axes of a CRS as defined by its authority
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AxisOrder {
    /// Easting (or longitude) first
    EastNorth,

    /// Northing (or latitude) first, e.g. `EPSG:4326`
    NorthEast,
}

impl AxisOrder {
    /// Returns the indices of the east and the north ordinate
    fn east_north_indices(self) -> (usize, usize) {
        match self {
            AxisOrder::EastNorth => (0, 1),
            AxisOrder::NorthEast => (1, 0),
        }
    }
}

/// The parts of a PROJJSON CRS definition needed to find its axis order.
/// Compound and bound CRSs are searched for their horizontal component.
#[derive(Deserialize)]
struct ProjJsonCrs {
    coordinate_system: Option<ProjJsonCoordinateSystem>,
    source_crs: Option<Box<ProjJsonCrs>>,
    #[serde(default)]
    components: Vec<ProjJsonCrs>,
}

#[derive(Deserialize)]
struct ProjJsonCoordinateSystem {
    axis: Vec<ProjJsonAxis>,
}

#[derive(Deserialize)]
struct ProjJsonAxis {
    direction: String,
}

impl ProjJsonCrs {
    fn horizontal_axes(&self) -> Option<&[ProjJsonAxis]> {
        if let Some(cs) = &self.coordinate_system {
            return Some(&cs.axis);
        }
        if let Some(source) = &self.source_crs {
            return source.horizontal_axes();
        }
        self.components.first().and_then(|c| c.horizontal_axes())
    }
}

/// Reads the axis order from a PROJJSON CRS definition
fn parse_axis_order(projjson: &str) -> Result<AxisOrder, String> {
    let crs: ProjJsonCrs = serde_json::from_str(projjson).map_err(|err| err.to_string())?;
    let axes = crs
        .horizontal_axes()
        .ok_or_else(|| "CRS definition has no coordinate system".to_string())?;

    let is_north = |a: &ProjJsonAxis| matches!(a.direction.as_str(), "north" | "south");
    let is_east = |a: &ProjJsonAxis| matches!(a.direction.as_str(), "east" | "west");

    // polar systems may have two axes pointing north or south
    Ok(match axes {
        [first, second, ..] if is_north(first) && is_east(second) => AxisOrder::NorthEast,
        _ => AxisOrder::EastNorth,
    })
}

/// Resolves and transforms coordinate reference systems with PROJ.
///
/// Envelopes are expected in the axis order defined by the authority of
/// their CRS. For example, `EPSG:4326` is latitude first while `OGC:CRS84`
/// is longitude first. The provider swaps axes as needed. Transformation
/// objects are cached per pair of CRSs. The provider is not `Sync` and
/// should be created per thread.
#[derive(Default)]
pub struct ProjProvider {
    /// A cache of identifiers that have already been resolved
    resolved: RefCell<FxHashMap<String, Crs>>,

    /// A cache of authority axis orders
    axis_orders: RefCell<FxHashMap<Crs, AxisOrder>>,

    /// A cache of transformation objects. They work in east/north order.
    transformers: RefCell<FxHashMap<(Crs, Crs), Rc<Proj>>>,
}

impl ProjProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the authority axis order of the given CRS
    fn axis_order(&self, crs: &Crs) -> Result<AxisOrder, String> {
        if crs.is_crs84() {
            return Ok(AxisOrder::EastNorth);
        }
        if let Some(order) = self.axis_orders.borrow().get(crs) {
            return Ok(*order);
        }

        let p = Proj::new(&crs.to_string()).map_err(|err| err.to_string())?;
        let projjson = p
            .to_projjson(None, None, None)
            .map_err(|err| err.to_string())?;
        let order = parse_axis_order(&projjson)?;

        trace!(%crs, ?order, "determined axis order");
        self.axis_orders.borrow_mut().insert(crs.clone(), order);
        Ok(order)
    }

    /// Returns a transformation object from `from` to `to`
    fn get_transformer(&self, from: &Crs, to: &Crs) -> Result<Rc<Proj>, TransformError> {
        let mut cache = self.transformers.borrow_mut();
        Ok(match cache.entry((from.clone(), to.clone())) {
            Occupied(e) => Rc::clone(e.get()),
            Vacant(e) => {
                debug!(%from, %to, "creating transformation");
                let p = Proj::new_known_crs(&from.to_string(), &to.to_string(), None).map_err(
                    |err| TransformError::NoPath {
                        from: from.clone(),
                        to: to.clone(),
                        reason: err.to_string(),
                    },
                )?;
                Rc::clone(e.insert(Rc::new(p)))
            }
        })
    }
}

impl CrsResolver for ProjProvider {
    fn resolve(&self, id: &str) -> Result<Crs, ResolutionError> {
        if let Some(crs) = self.resolved.borrow().get(id) {
            return Ok(crs.clone());
        }

        let (authority, code) = id
            .split_once(':')
            .ok_or_else(|| ResolutionError::MalformedIdentifier(id.to_owned()))?;
        let crs = Crs::new(authority, code);

        // fails if PROJ does not know the CRS
        self.axis_order(&crs)
            .map_err(|reason| ResolutionError::UnknownCrs {
                id: id.to_owned(),
                reason,
            })?;

        trace!(id, %crs, "resolved CRS");
        self.resolved
            .borrow_mut()
            .insert(id.to_owned(), crs.clone());
        Ok(crs)
    }
}

/// Returns the points along the boundary of the given rectangle, starting
/// at the lower left corner
fn densify(min: (f64, f64), max: (f64, f64)) -> Vec<(f64, f64)> {
    let corners = [min, (max.0, min.1), max, (min.0, max.1)];
    let mut points = Vec::with_capacity(4 * DENSIFY_SEGMENTS);
    for (i, a) in corners.iter().enumerate() {
        let b = corners[(i + 1) % corners.len()];
        for s in 0..DENSIFY_SEGMENTS {
            let t = s as f64 / DENSIFY_SEGMENTS as f64;
            points.push((a.0 + (b.0 - a.0) * t, a.1 + (b.1 - a.1) * t));
        }
    }
    points
}

impl CoordinateTransformer for ProjProvider {
    fn transform(&self, envelope: &Envelope, target: &Crs) -> Result<Envelope, TransformError> {
        let from = envelope.crs();
        if from == target {
            return Ok(envelope.clone());
        }

        let invalid = |reason: String| TransformError::InvalidCoordinates {
            from: from.clone(),
            to: target.clone(),
            reason,
        };

        if envelope.dimension() < 2 {
            return Err(invalid(format!(
                "{}-dimensional envelopes are not supported",
                envelope.dimension()
            )));
        }

        let no_path = |reason: String| TransformError::NoPath {
            from: from.clone(),
            to: target.clone(),
            reason,
        };
        let (source_east, source_north) = self
            .axis_order(from)
            .map_err(no_path)?
            .east_north_indices();
        let (target_east, target_north) = self
            .axis_order(target)
            .map_err(no_path)?
            .east_north_indices();

        let proj = self.get_transformer(from, target)?;
        let mut points = densify(
            (envelope.minimum(source_east), envelope.minimum(source_north)),
            (envelope.maximum(source_east), envelope.maximum(source_north)),
        );
        proj.convert_array(&mut points)
            .map_err(|err| invalid(err.to_string()))?;

        let mut lower = envelope.lower().to_vec();
        let mut upper = envelope.upper().to_vec();
        lower[target_east] = f64::INFINITY;
        lower[target_north] = f64::INFINITY;
        upper[target_east] = f64::NEG_INFINITY;
        upper[target_north] = f64::NEG_INFINITY;
        for (east, north) in points {
            if !east.is_finite() || !north.is_finite() {
                return Err(invalid("transformation yields non-finite coordinates".to_string()));
            }
            lower[target_east] = lower[target_east].min(east);
            lower[target_north] = lower[target_north].min(north);
            upper[target_east] = upper[target_east].max(east);
            upper[target_north] = upper[target_north].max(north);
        }

        debug!(%from, to = %target, ?lower, ?upper, "transformed envelope");

        // ordinates beyond the second one are carried over unchanged
        Envelope::new(target.clone(), lower, upper).map_err(|err| invalid(err.to_string()))
    }
}
