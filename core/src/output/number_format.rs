/// The number of fraction digits kept by [`format_floor_2`]
const FRACTION_DIGITS: usize = 2;

/// Formats a number with at most two fraction digits, rounded toward
/// negative infinity. Trailing zeros are omitted.
///
/// The number is rounded based on its shortest decimal representation, so
/// `0.29` yields `0.29` and not `0.28`.
///
/// ```
/// use geoextent_core::output::number_format::format_floor_2;
///
/// assert_eq!(format_floor_2(12.347), "12.34");
/// assert_eq!(format_floor_2(-12.347), "-12.35");
/// assert_eq!(format_floor_2(10.0), "10");
/// ```
pub fn format_floor_2(v: f64) -> String {
    if !v.is_finite() {
        return v.to_string();
    }

    // `Display` never uses exponent notation
    let s = v.abs().to_string();
    let (int, frac) = s.split_once('.').unwrap_or((&s, ""));

    // integer digits followed by exactly two fraction digits
    let mut digits = int
        .bytes()
        .chain(
            frac.bytes()
                .chain(std::iter::repeat(b'0'))
                .take(FRACTION_DIGITS),
        )
        .collect::<Vec<_>>();

    let cut_off = frac.bytes().skip(FRACTION_DIGITS).any(|b| b != b'0');
    if v < 0.0 && cut_off {
        // rounding a negative number down increases its magnitude
        increment(&mut digits);
    }

    if digits.iter().all(|&b| b == b'0') {
        return "0".to_string();
    }

    let (int, frac) = digits.split_at(digits.len() - FRACTION_DIGITS);
    let frac = match frac.iter().rposition(|&b| b != b'0') {
        Some(last) => &frac[..=last],
        None => &[],
    };

    let mut result = String::with_capacity(digits.len() + 2);
    if v < 0.0 {
        result.push('-');
    }
    result.extend(int.iter().map(|&b| b as char));
    if !frac.is_empty() {
        result.push('.');
        result.extend(frac.iter().map(|&b| b as char));
    }
    result
}

/// Adds one unit in the last place to a string of decimal digits
fn increment(digits: &mut Vec<u8>) {
    for d in digits.iter_mut().rev() {
        if *d == b'9' {
            *d = b'0';
        } else {
            *d += 1;
            return;
        }
    }
    digits.insert(0, b'1');
}
