pub mod coordinates;
pub mod xml;
