//! Marketplace identifiers.

/// Normalizes a marketplace name to its canonical identifier.
///
/// Lowercases, drops separators and resolves common aliases, so
/// `"Mercado Livre"`, `"mercado_livre"` and `"MELI"` all map to `"mercadolivre"`.
pub fn normalize_marketplace(name: &str) -> String {
    let compact: String = name
        .trim()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect();

    match compact.as_str() {
        "ml" | "meli" | "mercadolibre" | "mercadolivre" => "mercadolivre".to_string(),
        "amazonbr" | "amazoncombr" | "amazon" => "amazon".to_string(),
        "magazineluiza" | "magalu" => "magalu".to_string(),
        _ => compact,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_normalize() {
        assert_eq!(normalize_marketplace("Mercado Livre"), "mercadolivre");
        assert_eq!(normalize_marketplace("mercado_livre"), "mercadolivre");
        assert_eq!(normalize_marketplace("MELI"), "mercadolivre");
        assert_eq!(normalize_marketplace(" Amazon.com.br "), "amazon");
        assert_eq!(normalize_marketplace("Shopee"), "shopee");
        assert_eq!(normalize_marketplace("Tiny-Shop"), "tinyshop");
    }
}
