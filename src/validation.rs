use validator::ValidationError;

/// Normalizes a display name into a URL-safe slug.
///
/// Lowercases the input, keeps alphanumeric characters (unicode letters are
/// kept verbatim), collapses every other run of characters into a single
/// hyphen and trims leading/trailing hyphens. Slugs are derived once at
/// creation time and never recomputed on rename.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_separator = false;

    for ch in name.chars() {
        if ch.is_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            for lower in ch.to_lowercase() {
                slug.push(lower);
            }
        } else {
            pending_separator = true;
        }
    }

    slug
}

/// Validates that a price is strictly positive.
pub fn validate_positive_price(price: &rust_decimal::Decimal) -> Result<(), ValidationError> {
    if *price <= rust_decimal::Decimal::ZERO {
        let mut error = ValidationError::new("invalid_price");
        error.message = Some("Price must be greater than 0".into());
        return Err(error);
    }
    Ok(())
}

/// Validates that a monetary amount is not negative (shipping costs may be 0).
pub fn validate_non_negative_amount(amount: &rust_decimal::Decimal) -> Result<(), ValidationError> {
    if *amount < rust_decimal::Decimal::ZERO {
        let mut error = ValidationError::new("invalid_amount");
        error.message = Some("Amount must not be negative".into());
        return Err(error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Running Shoes"), "running-shoes");
    }

    #[test]
    fn test_slugify_collapses_separators() {
        assert_eq!(slugify("  Men's -- Shoes!  "), "men-s-shoes");
    }

    #[test]
    fn test_slugify_keeps_unicode_letters() {
        assert_eq!(slugify("أحذية رياضية"), "أحذية-رياضية");
    }

    #[test]
    fn test_slugify_is_deterministic() {
        assert_eq!(slugify("Home & Garden"), slugify("Home & Garden"));
    }

    #[test]
    fn test_positive_price_rejects_zero() {
        assert!(validate_positive_price(&Decimal::ZERO).is_err());
        assert!(validate_positive_price(&Decimal::from_str("-1").unwrap()).is_err());
        assert!(validate_positive_price(&Decimal::from_str("0.01").unwrap()).is_ok());
    }

    #[test]
    fn test_non_negative_amount_allows_zero() {
        assert!(validate_non_negative_amount(&Decimal::ZERO).is_ok());
        assert!(validate_non_negative_amount(&Decimal::from_str("-0.01").unwrap()).is_err());
    }
}
