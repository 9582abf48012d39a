//! Check-page contract: the interstitial that forwards a tab to the backup
//! URL, tagged against redirect loops.

use thiserror::Error;
use url::Url;

use crate::matcher::{add_redirect_marker, RedirectPair};

/// Where the redirect executor sends a tab when the grace period expires.
pub const DEFAULT_CHECK_PAGE_URL: &str = "mdr://check";

pub const PARAM_ORIGINAL: &str = "original";
pub const PARAM_BACKUP: &str = "backup";
pub const PARAM_SILENT: &str = "silent";

/// Why a check-page URL could not be acted on. These are terminal for the
/// navigation: the page shows the message and performs no redirect.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckPageError {
    #[error("check page URL does not parse: {0}")]
    Unparseable(String),
    #[error("missing redirect parameter: {0}")]
    MissingParam(&'static str),
}

/// Parsed check-page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRequest {
    pub original: String,
    pub backup: String,
    /// Suppress the visible "checking" message.
    pub silent: bool,
}

impl CheckRequest {
    /// Parse the interstitial's own URL. `original` and `backup` are
    /// required; `silent` is on only for the exact value `"1"`.
    pub fn parse(url: &str) -> Result<Self, CheckPageError> {
        let parsed =
            Url::parse(url).map_err(|_| CheckPageError::Unparseable(url.to_string()))?;
        let mut original = None;
        let mut backup = None;
        let mut silent = false;
        for (key, value) in parsed.query_pairs() {
            match key.as_ref() {
                PARAM_ORIGINAL => original = Some(value.into_owned()),
                PARAM_BACKUP => backup = Some(value.into_owned()),
                PARAM_SILENT => silent = value == "1",
                _ => {}
            }
        }
        let original = original.ok_or(CheckPageError::MissingParam(PARAM_ORIGINAL))?;
        let backup = backup.ok_or(CheckPageError::MissingParam(PARAM_BACKUP))?;
        Ok(Self {
            original,
            backup,
            silent,
        })
    }

    /// The onward navigation target: the backup URL carrying the
    /// loop-prevention marker, so the next matcher pass short-circuits.
    pub fn forward_url(&self) -> String {
        add_redirect_marker(&self.backup)
    }
}

/// Build the check-page URL for a matched pair. The show flag maps to the
/// `silent=1` parameter when the interstitial message is suppressed.
pub fn build_check_url(check_page: &str, pair: &RedirectPair, show_check_page: bool) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    query.append_pair(PARAM_ORIGINAL, &pair.original);
    query.append_pair(PARAM_BACKUP, &pair.backup);
    if !show_check_page {
        query.append_pair(PARAM_SILENT, "1");
    }
    format!("{}?{}", check_page, query.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> RedirectPair {
        RedirectPair {
            original: "https://a.example/page?x=1".to_string(),
            backup: "https://b.example/page?x=1".to_string(),
        }
    }

    #[test]
    fn build_and_parse_round_trip() {
        let url = build_check_url(DEFAULT_CHECK_PAGE_URL, &pair(), true);
        let request = CheckRequest::parse(&url).unwrap();
        assert_eq!(request.original, "https://a.example/page?x=1");
        assert_eq!(request.backup, "https://b.example/page?x=1");
        assert!(!request.silent);
    }

    #[test]
    fn suppressed_message_sets_silent_parameter() {
        let url = build_check_url(DEFAULT_CHECK_PAGE_URL, &pair(), false);
        assert!(url.contains("silent=1"));
        let request = CheckRequest::parse(&url).unwrap();
        assert!(request.silent);
    }

    #[test]
    fn missing_parameters_are_terminal() {
        assert_eq!(
            CheckRequest::parse("mdr://check?backup=https%3A%2F%2Fb.example%2F"),
            Err(CheckPageError::MissingParam(PARAM_ORIGINAL))
        );
        assert_eq!(
            CheckRequest::parse("mdr://check?original=https%3A%2F%2Fa.example%2F"),
            Err(CheckPageError::MissingParam(PARAM_BACKUP))
        );
        assert!(matches!(
            CheckRequest::parse("not a url"),
            Err(CheckPageError::Unparseable(_))
        ));
    }

    #[test]
    fn silent_requires_exact_value() {
        let url = format!(
            "mdr://check?original=o&backup=b&{}=yes",
            PARAM_SILENT
        );
        let request = CheckRequest::parse(&url).unwrap();
        assert!(!request.silent);
    }

    #[test]
    fn forward_url_tags_the_backup() {
        let request = CheckRequest {
            original: "https://a.example/page?x=1".to_string(),
            backup: "https://b.example/page?x=1".to_string(),
            silent: false,
        };
        assert_eq!(
            request.forward_url(),
            "https://b.example/page?x=1&_eight_redirect=1"
        );
    }
}
