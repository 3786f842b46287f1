pub use self::{
    bounding_box::{parse_bounding_box, BoundingBoxRecord},
    element_splitter::{
        is_bounding_box, is_gml_geometry, split_element_ranges, split_elements, ElementSplitter,
    },
    geometry::{GeometryExtent, GeometryParser, GmlGeometryParser},
};

pub mod bounding_box;
pub mod element_splitter;
pub mod geometry;
