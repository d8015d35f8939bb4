// src/countries.rs

use regex::Regex;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Country {
    pub code: &'static str,
    pub name: &'static str,
    pub flag: &'static str,
}

pub const COUNTRIES: &[Country] = &[
    Country { code: "BE", name: "Belgium", flag: "\u{1F1E7}\u{1F1EA}" },
    Country { code: "DE", name: "Germany", flag: "\u{1F1E9}\u{1F1EA}" },
    Country { code: "NL", name: "Netherlands", flag: "\u{1F1F3}\u{1F1F1}" },
    Country { code: "FR", name: "France", flag: "\u{1F1EB}\u{1F1F7}" },
    Country { code: "PL", name: "Poland", flag: "\u{1F1F5}\u{1F1F1}" },
    Country { code: "CZ", name: "Czechia", flag: "\u{1F1E8}\u{1F1FF}" },
    Country { code: "AT", name: "Austria", flag: "\u{1F1E6}\u{1F1F9}" },
    Country { code: "SK", name: "Slovakia", flag: "\u{1F1F8}\u{1F1F0}" },
    Country { code: "HU", name: "Hungary", flag: "\u{1F1ED}\u{1F1FA}" },
    Country { code: "SI", name: "Slovenia", flag: "\u{1F1F8}\u{1F1EE}" },
    Country { code: "HR", name: "Croatia", flag: "\u{1F1ED}\u{1F1F7}" },
    Country { code: "RO", name: "Romania", flag: "\u{1F1F7}\u{1F1F4}" },
    Country { code: "BG", name: "Bulgaria", flag: "\u{1F1E7}\u{1F1EC}" },
    Country { code: "RS", name: "Serbia", flag: "\u{1F1F7}\u{1F1F8}" },
    Country { code: "UA", name: "Ukraine", flag: "\u{1F1FA}\u{1F1E6}" },
    Country { code: "LT", name: "Lithuania", flag: "\u{1F1F1}\u{1F1F9}" },
    Country { code: "LV", name: "Latvia", flag: "\u{1F1F1}\u{1F1FB}" },
    Country { code: "EE", name: "Estonia", flag: "\u{1F1EA}\u{1F1EA}" },
    Country { code: "CH", name: "Switzerland", flag: "\u{1F1E8}\u{1F1ED}" },
    Country { code: "LU", name: "Luxembourg", flag: "\u{1F1F1}\u{1F1FA}" },
];

/// Country code followed by a postcode, e.g. `DE 68219` or `NL-1011`.
static POSTCODE_PREFIX: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\b([A-Z]{2})[\s-]\d").ok());

pub fn by_code(code: &str) -> Option<&'static Country> {
    COUNTRIES.iter().find(|c| c.code.eq_ignore_ascii_case(code))
}

/// Best guess at the country of a free-text address.
///
/// Postcode prefixes are tried first, then any standalone upper-case
/// two-letter word that is a known code.
pub fn extract_country(address: &str) -> Option<&'static Country> {
    if let Some(re) = POSTCODE_PREFIX.as_ref() {
        let found = re
            .captures_iter(address)
            .find_map(|caps| by_code(&caps[1]));
        if found.is_some() {
            return found;
        }
    }

    address
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.len() == 2 && word.chars().all(|c| c.is_ascii_uppercase()))
        .find_map(by_code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_consistent() {
        assert_eq!(COUNTRIES.len(), 20);
        for country in COUNTRIES {
            let expected: String = country
                .code
                .chars()
                .filter_map(|c| char::from_u32(0x1F1E6 + (c as u32 - 'A' as u32)))
                .collect();
            assert_eq!(country.flag, expected, "{}", country.code);
        }
    }

    #[test]
    fn test_by_code() {
        assert_eq!(by_code("de").map(|c| c.name), Some("Germany"));
        assert_eq!(by_code("US"), None);
    }

    #[test]
    fn test_postcode_prefix() {
        assert_eq!(
            extract_country("BASF SE, Carl-Bosch-Strasse 38, DE 67056 Ludwigshafen").map(|c| c.code),
            Some("DE")
        );
        assert_eq!(
            extract_country("Quay 2, NL-1011 Amsterdam").map(|c| c.code),
            Some("NL")
        );
    }

    #[test]
    fn test_standalone_code_fallback() {
        assert_eq!(extract_country("Zone Industrielle, Lyon FR").map(|c| c.code), Some("FR"));
        assert_eq!(extract_country("Somewhere, be careful"), None);
        assert_eq!(extract_country("Yard 7, US 90210"), None);
    }
}
