// src/utils.rs
use std::cmp::Ordering;

/// Human ordering for display strings: case-insensitive first, then the raw
/// strings so that distinct values never compare equal.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| b.cmp(a))
}

/// Equality after trimming and Unicode lowercasing; how mod ids are matched
/// everywhere.
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Case-insensitive substring test. An empty needle always matches.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Detail page for a mod on the public mod database, once its asset id is
/// known.
pub fn mod_detail_url(detail_base: &str, asset_id: Option<&str>) -> Option<String> {
    let asset_id = asset_id.map(str::trim).filter(|id| !id.is_empty())?;
    Some(format!(
        "{}/show/mod/{}",
        detail_base.trim_end_matches('/'),
        asset_id
    ))
}

/// Absolute logo URL. Absolute references pass through, relative ones are
/// served from the directory API.
pub fn logo_url(api_base: &str, logo: Option<&str>) -> Option<String> {
    let logo = logo.map(str::trim).filter(|l| !l.is_empty())?;
    let lower = logo.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Some(logo.to_string());
    }
    let base = api_base.trim_end_matches('/');
    if logo.starts_with('/') {
        Some(format!("{}{}", base, logo))
    } else {
        Some(format!("{}/{}", base, logo))
    }
}

/// Parses the loose boolean vocabulary accepted in query strings.
///
/// `Some(None)` means explicitly unset (`all`, `any`, empty); `None` means
/// the value was not understood.
pub fn parse_tri_state(value: &str) -> Option<Option<bool>> {
    match value.trim().to_lowercase().as_str() {
        "" | "all" | "any" => Some(None),
        "true" | "1" | "yes" | "y" => Some(Some(true)),
        "false" | "0" | "no" | "n" => Some(Some(false)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eq_ignore_case_folds_unicode() {
        assert!(eq_ignore_case("Ärmel", " ärmel"));
        assert!(!eq_ignore_case("Ärmel", "armel"));
    }

    #[test]
    fn locale_cmp_ignores_case_first() {
        assert_eq!(locale_cmp("apple", "Banana"), Ordering::Less);
        assert_eq!(locale_cmp("Zed", "alpha"), Ordering::Greater);
        assert_eq!(locale_cmp("same", "same"), Ordering::Equal);
        assert_ne!(locale_cmp("a", "A"), Ordering::Equal);
    }

    #[test]
    fn detail_url_requires_asset_id() {
        assert_eq!(
            mod_detail_url("https://mods.example.at/", Some("123")).as_deref(),
            Some("https://mods.example.at/show/mod/123")
        );
        assert_eq!(mod_detail_url("https://mods.example.at", Some("  ")), None);
        assert_eq!(mod_detail_url("https://mods.example.at", None), None);
    }

    #[test]
    fn logo_url_joins_relative_paths() {
        assert_eq!(
            logo_url("http://api/", Some("files/logo.png")).as_deref(),
            Some("http://api/files/logo.png")
        );
        assert_eq!(
            logo_url("http://api", Some("/files/logo.png")).as_deref(),
            Some("http://api/files/logo.png")
        );
        assert_eq!(
            logo_url("http://api", Some("HTTPS://cdn/logo.png")).as_deref(),
            Some("HTTPS://cdn/logo.png")
        );
        assert_eq!(logo_url("http://api", Some("")), None);
    }

    #[test]
    fn tri_state_vocabulary() {
        assert_eq!(parse_tri_state("Yes"), Some(Some(true)));
        assert_eq!(parse_tri_state("0"), Some(Some(false)));
        assert_eq!(parse_tri_state("ANY"), Some(None));
        assert_eq!(parse_tri_state(""), Some(None));
        assert_eq!(parse_tri_state("maybe"), None);
    }
}
