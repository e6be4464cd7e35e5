//! Base rule library.
//!
//! Each rule checks one concern. Columns combine them by listing several
//! rules in order; required-ness is always a separate [`RequiredFieldRule`],
//! every other rule has no opinion about missing values.

mod numeric;
mod text;

pub use numeric::*;
pub use text::*;

use catalog_core::CellValue;

/// String tokens treated as a missing value.
pub const NULL_TOKENS: &[&str] = &["null", "none", "nan", "n/a"];

/// Returns true for null, blank strings and null-equivalent tokens.
pub fn is_missing(value: &CellValue) -> bool {
    if value.is_blank() {
        return true;
    }
    match value {
        CellValue::String(s) => {
            let s = s.trim().to_lowercase();
            NULL_TOKENS.contains(&s.as_str())
        }
        _ => false,
    }
}

/// Returns the text a string rule checks, or `None` for missing values.
pub(crate) fn text_of(value: &CellValue) -> Option<String> {
    if is_missing(value) {
        return None;
    }
    Some(value.to_display())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_values() {
        assert!(is_missing(&CellValue::Null));
        assert!(is_missing(&CellValue::from("   ")));
        assert!(is_missing(&CellValue::from("N/A")));
        assert!(is_missing(&CellValue::from("NaN")));
        assert!(is_missing(&CellValue::Float(f64::NAN)));
        assert!(!is_missing(&CellValue::from("0")));
        assert!(!is_missing(&CellValue::Int(0)));
        assert!(!is_missing(&CellValue::Bool(false)));
    }
}
