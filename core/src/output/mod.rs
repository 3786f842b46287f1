//! Serializers for envelopes. [`gml`] writes a human-readable document with
//! rounded ordinates, [`kvp`] a lossless query parameter value.

pub mod gml;
pub mod kvp;
pub mod number_format;
