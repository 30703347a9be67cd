//! Locale resolution for the conversion engine.
//!
//! calibre decodes text using the process locale. A non UTF-8 locale leads to
//! mangled output instead of an error, so the locale is settled once at
//! startup and exported to every engine invocation.

use crate::error::{Error, Result};

/// Environment variables consulted, in POSIX precedence order.
const LOCALE_VARS: [&str; 3] = ["LC_ALL", "LC_CTYPE", "LANG"];

/// Resolve the locale to export to the conversion engine.
///
/// A configured locale wins. Otherwise the first non-empty of `LC_ALL`,
/// `LC_CTYPE`, `LANG` (as returned by `lookup`) must name a UTF-8 locale.
pub fn resolve_locale<F>(configured: Option<&str>, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(locale) = configured {
        let locale = locale.trim();
        if locale.is_empty() {
            return Err(Error::ConfigValidation {
                field: "converter.locale".to_string(),
                message: "Locale must not be empty".to_string(),
            });
        }
        return Ok(locale.to_string());
    }

    let found = LOCALE_VARS
        .iter()
        .find_map(|var| lookup(var).filter(|v| !v.is_empty()).map(|v| (*var, v)));

    match found {
        Some((_, value)) if is_utf8_locale(&value) => Ok(value),
        Some((var, value)) => Err(Error::Config(format!(
            "Conversion needs a UTF-8 locale but {}={}. \
             Set converter.locale (e.g. \"C.UTF-8\") or export LANG.",
            var, value
        ))),
        None => Err(Error::Config(
            "Conversion needs a UTF-8 locale but none of LC_ALL, LC_CTYPE, LANG is set. \
             Set converter.locale (e.g. \"C.UTF-8\") or export LANG."
                .to_string(),
        )),
    }
}

fn is_utf8_locale(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    lower.contains("utf-8") || lower.contains("utf8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_configured_locale_wins() {
        let locale = resolve_locale(Some("C.UTF-8"), env(&[("LANG", "C")])).unwrap();
        assert_eq!(locale, "C.UTF-8");
    }

    #[test]
    fn test_falls_back_to_environment() {
        let locale = resolve_locale(None, env(&[("LANG", "es_ES.UTF-8")])).unwrap();
        assert_eq!(locale, "es_ES.UTF-8");
    }

    #[test]
    fn test_lc_all_takes_precedence() {
        let locale = resolve_locale(
            None,
            env(&[("LC_ALL", "en_US.utf8"), ("LANG", "POSIX")]),
        )
        .unwrap();
        assert_eq!(locale, "en_US.utf8");
    }

    #[test]
    fn test_missing_locale_is_descriptive() {
        let err = resolve_locale(None, env(&[])).unwrap_err();
        assert!(err.to_string().contains("UTF-8 locale"));
    }

    #[test]
    fn test_non_utf8_locale_rejected() {
        let err = resolve_locale(None, env(&[("LANG", "C")])).unwrap_err();
        assert!(err.to_string().contains("LANG=C"));
    }

    #[test]
    fn test_blank_configured_locale_rejected() {
        assert!(resolve_locale(Some("  "), env(&[])).is_err());
    }
}
