//! Static ISO 3166-1 alpha-2 code to display name table, per locale

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::models::Locale;

/// (code, English, Hebrew)
const COUNTRY_NAMES: &[(&str, &str, &str)] = &[
    ("AE", "United Arab Emirates", "איחוד האמירויות הערביות"),
    ("AR", "Argentina", "ארגנטינה"),
    ("AT", "Austria", "אוסטריה"),
    ("AU", "Australia", "אוסטרליה"),
    ("BE", "Belgium", "בלגיה"),
    ("BG", "Bulgaria", "בולגריה"),
    ("BR", "Brazil", "ברזיל"),
    ("CA", "Canada", "קנדה"),
    ("CH", "Switzerland", "שווייץ"),
    ("CL", "Chile", "צ'ילה"),
    ("CN", "China", "סין"),
    ("CY", "Cyprus", "קפריסין"),
    ("CZ", "Czechia", "צ'כיה"),
    ("DE", "Germany", "גרמניה"),
    ("DK", "Denmark", "דנמרק"),
    ("EG", "Egypt", "מצרים"),
    ("ES", "Spain", "ספרד"),
    ("FI", "Finland", "פינלנד"),
    ("FR", "France", "צרפת"),
    ("GB", "United Kingdom", "הממלכה המאוחדת"),
    ("GE", "Georgia", "גאורגיה"),
    ("GR", "Greece", "יוון"),
    ("HR", "Croatia", "קרואטיה"),
    ("HU", "Hungary", "הונגריה"),
    ("IE", "Ireland", "אירלנד"),
    ("IL", "Israel", "ישראל"),
    ("IN", "India", "הודו"),
    ("IS", "Iceland", "איסלנד"),
    ("IT", "Italy", "איטליה"),
    ("JO", "Jordan", "ירדן"),
    ("JP", "Japan", "יפן"),
    ("KR", "South Korea", "קוריאה הדרומית"),
    ("LB", "Lebanon", "לבנון"),
    ("MA", "Morocco", "מרוקו"),
    ("MX", "Mexico", "מקסיקו"),
    ("NL", "Netherlands", "הולנד"),
    ("NO", "Norway", "נורווגיה"),
    ("NZ", "New Zealand", "ניו זילנד"),
    ("PL", "Poland", "פולין"),
    ("PT", "Portugal", "פורטוגל"),
    ("RO", "Romania", "רומניה"),
    ("RU", "Russia", "רוסיה"),
    ("SA", "Saudi Arabia", "ערב הסעודית"),
    ("SE", "Sweden", "שוודיה"),
    ("SY", "Syria", "סוריה"),
    ("TH", "Thailand", "תאילנד"),
    ("TR", "Turkey", "טורקיה"),
    ("UA", "Ukraine", "אוקראינה"),
    ("US", "United States", "ארצות הברית"),
    ("ZA", "South Africa", "דרום אפריקה"),
];

static BY_CODE: LazyLock<HashMap<&'static str, (&'static str, &'static str)>> =
    LazyLock::new(|| {
        COUNTRY_NAMES
            .iter()
            .map(|(code, en, he)| (*code, (*en, *he)))
            .collect()
    });

/// Display name for an alpha-2 code, if the table knows it
#[must_use]
pub fn country_name(code: &str, locale: Locale) -> Option<&'static str> {
    let code = code.trim().to_ascii_uppercase();
    BY_CODE.get(code.as_str()).map(|(en, he)| match locale {
        Locale::En => *en,
        Locale::He => *he,
    })
}

/// Full country display name from whatever the provider sent.
///
/// A populated `country` wins unless it is itself a bare two-letter code.
/// Codes missing from the table come back upper-cased and untranslated.
/// Returns an empty string when the provider sent neither field.
#[must_use]
pub fn resolve_country(country: Option<&str>, country_code: Option<&str>, locale: Locale) -> String {
    let country = country.map(str::trim).filter(|c| !c.is_empty());
    let code = country_code.map(str::trim).filter(|c| !c.is_empty());

    match (country, code) {
        (Some(name), _) if !looks_like_code(name) => name.to_string(),
        (Some(name), _) => translate_code(name, locale),
        (None, Some(code)) => translate_code(code, locale),
        (None, None) => String::new(),
    }
}

fn looks_like_code(value: &str) -> bool {
    value.len() == 2 && value.chars().all(|c| c.is_ascii_alphabetic())
}

fn translate_code(code: &str, locale: Locale) -> String {
    country_name(code, locale)
        .map(str::to_string)
        .unwrap_or_else(|| code.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_table_codes_are_unique() {
        assert_eq!(BY_CODE.len(), COUNTRY_NAMES.len());
    }

    #[rstest]
    #[case("IL", Locale::En, Some("Israel"))]
    #[case("il", Locale::He, Some("ישראל"))]
    #[case(" gb ", Locale::En, Some("United Kingdom"))]
    #[case("XX", Locale::En, None)]
    fn test_country_name(#[case] code: &str, #[case] locale: Locale, #[case] expected: Option<&str>) {
        assert_eq!(country_name(code, locale), expected);
    }

    #[test]
    fn test_resolve_prefers_full_name() {
        assert_eq!(resolve_country(Some("France"), Some("fr"), Locale::He), "France");
    }

    #[test]
    fn test_resolve_translates_code_only_payloads() {
        assert_eq!(resolve_country(Some(""), Some("IL"), Locale::En), "Israel");
        assert_eq!(resolve_country(None, Some("il"), Locale::He), "ישראל");
        assert_eq!(resolve_country(Some("DE"), None, Locale::En), "Germany");
    }

    #[test]
    fn test_resolve_unknown_code_passes_through() {
        assert_eq!(resolve_country(None, Some("zz"), Locale::En), "ZZ");
    }

    #[test]
    fn test_resolve_nothing_is_empty() {
        assert_eq!(resolve_country(None, None, Locale::En), "");
        assert_eq!(resolve_country(Some("  "), Some(""), Locale::En), "");
    }
}
