//! Output comparison for validation runs

use interfaces::ArrayData;
use num_complex::Complex32;

fn first_index<T>(expected: &[T], actual: &[T], mut differs: impl FnMut(&T, &T) -> bool) -> Option<usize> {
    expected.iter().zip(actual).position(|(e, a)| differs(e, a))
}

fn complex_differs(e: &Complex32, a: &Complex32, tolerance: f32) -> bool {
    !((e - a).norm() <= tolerance)
}

/// Compare a produced array with the reference.
///
/// Bytes, bits and LLRs must match bit for bit. Complex and float values,
/// including the values of resource grid entries, may differ by `tolerance`;
/// grid entry indices must match exactly.
pub fn compare(expected: &ArrayData, actual: &ArrayData, tolerance: f32) -> Result<(), String> {
    if expected.element_type() != actual.element_type() {
        return Err(format!(
            "element type {:?}, expected {:?}",
            actual.element_type(),
            expected.element_type()
        ));
    }
    if expected.len() != actual.len() {
        return Err(format!("{} elements, expected {}", actual.len(), expected.len()));
    }

    let mismatch = match (expected, actual) {
        (ArrayData::Bytes(e), ArrayData::Bytes(a)) | (ArrayData::Bits(e), ArrayData::Bits(a)) => {
            first_index(e, a, |x, y| x != y)
        }
        (ArrayData::Llrs(e), ArrayData::Llrs(a)) => first_index(e, a, |x, y| x != y),
        (ArrayData::Floats(e), ArrayData::Floats(a)) => first_index(e, a, |x, y| !((x - y).abs() <= tolerance)),
        (ArrayData::Complex(e), ArrayData::Complex(a)) => first_index(e, a, |x, y| complex_differs(x, y, tolerance)),
        (ArrayData::GridEntries(e), ArrayData::GridEntries(a)) => first_index(e, a, |x, y| {
            (x.port, x.symbol, x.subcarrier) != (y.port, y.symbol, y.subcarrier)
                || complex_differs(&x.value, &y.value, tolerance)
        }),
        _ => None,
    };

    match mismatch {
        Some(index) => Err(format!("first difference at element {}", index)),
        None => Ok(()),
    }
}
