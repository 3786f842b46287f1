use std::str::SplitWhitespace;

use crate::error::FormatError;

/// Iterates over the whitespace-separated ordinates of a coordinate list
/// such as the content of `LowerCorner` or `posList`
pub struct OrdinateIter<'a> {
    inner: SplitWhitespace<'a>,
}

impl<'a> OrdinateIter<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            inner: text.split_whitespace(),
        }
    }
}

impl Iterator for OrdinateIter<'_> {
    type Item = Result<f64, FormatError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(parse_ordinate)
    }
}

/// Parses a single ordinate. Non-finite values are rejected because they
/// cannot take part in an envelope.
fn parse_ordinate(token: &str) -> Result<f64, FormatError> {
    match token.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => Err(FormatError::InvalidNumber(token.to_owned())),
    }
}

/// Parses all ordinates of a coordinate list
///
/// # Errors
/// Fails on the first token that is not a finite number
pub fn parse_ordinates(text: &str) -> Result<Vec<f64>, FormatError> {
    OrdinateIter::new(text).collect()
}

/// Parses a GML 2 `coordinates` string where ordinates are separated by
/// `cs` and tuples by whitespace, e.g. `1,2 3,4`. Returns the ordinates of
/// all tuples in a flat list together with the tuple size.
///
/// # Errors
/// Fails on malformed numbers or if tuples have a different number of
/// ordinates
pub fn parse_coordinate_tuples(text: &str, cs: &str) -> Result<(Vec<f64>, usize), FormatError> {
    let mut ordinates = Vec::new();
    let mut tuple_size = None;
    for tuple in text.split_whitespace() {
        let mut n = 0;
        for token in tuple.split(cs).filter(|t| !t.is_empty()) {
            ordinates.push(parse_ordinate(token)?);
            n += 1;
        }
        match tuple_size {
            None => tuple_size = Some(n),
            Some(expected) if expected != n => {
                return Err(FormatError::DimensionMismatch { expected, found: n });
            }
            _ => {}
        }
    }
    Ok((ordinates, tuple_size.unwrap_or(0)))
}
