//! Mirror-pair matching and the loop-prevention marker.

use url::Url;

use crate::settings::{normalize_host, Rule};

/// Query parameter marking a navigation as already-redirected. A URL bearing
/// it is exempt from rule matching for that navigation.
pub const REDIRECT_MARKER: &str = "_eight_redirect";

/// A matched navigation: the URL that was requested and the same URL with
/// the host swapped to the paired domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectPair {
    pub original: String,
    pub backup: String,
}

/// Decide whether a request URL belongs to a configured mirror pair.
///
/// Fails closed: non-http(s) schemes, unparseable URLs, and URLs already
/// carrying the redirect marker never match. Rules are consulted in stored
/// order and the first hit wins. A rule pairing a host with itself, or with
/// an empty host, does not match.
pub fn match_pair(url_str: &str, rules: &[Rule]) -> Option<RedirectPair> {
    let url = Url::parse(url_str).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    if has_redirect_marker(&url) {
        return None;
    }
    let raw_host = url.host_str()?.to_ascii_lowercase();
    let host = normalize_host(&raw_host);

    for rule in rules {
        let idx = rule
            .domains
            .iter()
            .position(|d| !d.is_empty() && (*d == host || *d == raw_host));
        let Some(idx) = idx else { continue };
        let other = &rule.domains[1 - idx];
        if other.is_empty() || *other == host {
            continue;
        }
        return Some(RedirectPair {
            original: url_str.to_string(),
            backup: swap_host(&url, other),
        });
    }
    None
}

/// Rebuild the URL with only the host replaced. Scheme, path, query, and
/// fragment are carried over verbatim from the parsed original.
fn swap_host(url: &Url, host: &str) -> String {
    let mut backup = format!("{}://{}{}", url.scheme(), host, url.path());
    if let Some(query) = url.query() {
        backup.push('?');
        backup.push_str(query);
    }
    if let Some(fragment) = url.fragment() {
        backup.push('#');
        backup.push_str(fragment);
    }
    backup
}

/// Loop guard: the marker counts whether it appears as a query parameter or
/// anywhere in the fragment.
pub fn has_redirect_marker(url: &Url) -> bool {
    url.query_pairs().any(|(k, _)| k == REDIRECT_MARKER)
        || url.fragment().is_some_and(|f| f.contains(REDIRECT_MARKER))
}

/// Tag a URL with the redirect marker. Unparseable URLs get the parameter
/// appended textually so the guard still holds on the next pass.
pub fn add_redirect_marker(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed
                .query_pairs_mut()
                .append_pair(REDIRECT_MARKER, "1");
            parsed.to_string()
        }
        Err(_) => {
            let sep = if url.contains('?') { '&' } else { '?' };
            format!("{url}{sep}{REDIRECT_MARKER}=1")
        }
    }
}

/// Remove the redirect marker from a URL, as the landing page does once the
/// navigation has committed. Returns None when the marker is absent.
pub fn strip_redirect_marker(url: &str) -> Option<String> {
    let mut parsed = Url::parse(url).ok()?;
    if !parsed.query_pairs().any(|(k, _)| k == REDIRECT_MARKER) {
        return None;
    }
    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| k != REDIRECT_MARKER)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        let mut pairs = parsed.query_pairs_mut();
        pairs.clear();
        for (k, v) in &kept {
            pairs.append_pair(k, v);
        }
        drop(pairs);
    }
    Some(parsed.to_string())
}

/// True when both URLs are http(s) and share a normalized hostname. Ports
/// are deliberately not compared. False on any parse failure.
pub fn is_same_host(url_a: &str, url_b: &str) -> bool {
    let (Ok(a), Ok(b)) = (Url::parse(url_a), Url::parse(url_b)) else {
        return false;
    };
    for url in [&a, &b] {
        if url.scheme() != "http" && url.scheme() != "https" {
            return false;
        }
    }
    match (a.host_str(), b.host_str()) {
        (Some(ha), Some(hb)) => normalize_host(ha) == normalize_host(hb),
        _ => false,
    }
}

/// Everything before the first `#`, for fragment-insensitive comparison.
pub fn strip_fragment(url: &str) -> &str {
    url.split('#').next().unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> Vec<Rule> {
        vec![Rule::new("a.example", "b.example", true)]
    }

    #[test]
    fn matches_both_directions_preserving_path_query_fragment() {
        let pair = match_pair("https://a.example/page?x=1#sec", &rules()).unwrap();
        assert_eq!(pair.original, "https://a.example/page?x=1#sec");
        assert_eq!(pair.backup, "https://b.example/page?x=1#sec");

        let pair = match_pair("http://b.example/other?y=2", &rules()).unwrap();
        assert_eq!(pair.backup, "http://a.example/other?y=2");
    }

    #[test]
    fn matches_www_and_case_variants_of_the_host() {
        let pair = match_pair("https://www.A.example/p", &rules()).unwrap();
        assert_eq!(pair.backup, "https://b.example/p");
    }

    #[test]
    fn bare_host_gets_root_path() {
        let pair = match_pair("https://a.example", &rules()).unwrap();
        assert_eq!(pair.backup, "https://b.example/");
    }

    #[test]
    fn first_matching_rule_wins() {
        let stacked = vec![
            Rule::new("a.example", "b.example", false),
            Rule::new("a.example", "c.example", false),
        ];
        let pair = match_pair("https://a.example/", &stacked).unwrap();
        assert_eq!(pair.backup, "https://b.example/");
    }

    #[test]
    fn fails_closed_on_bad_input() {
        assert!(match_pair("ftp://a.example/file", &rules()).is_none());
        assert!(match_pair("not a url", &rules()).is_none());
        assert!(match_pair("https://unrelated.example/", &rules()).is_none());
        assert!(match_pair("https://a.example/", &[]).is_none());
    }

    #[test]
    fn marker_exempts_url_from_matching() {
        assert!(match_pair("https://a.example/p?_eight_redirect=1", &rules()).is_none());
        assert!(match_pair("https://a.example/p#_eight_redirect", &rules()).is_none());
        // The marker must be a parameter name or fragment text, not a value.
        assert!(match_pair("https://a.example/p?next=_x", &rules()).is_some());
    }

    #[test]
    fn degenerate_rules_do_not_match() {
        let twice = vec![Rule::new("a.example", "a.example", false)];
        assert!(match_pair("https://a.example/", &twice).is_none());

        let half = vec![Rule::new("a.example", "", false)];
        assert!(match_pair("https://a.example/", &half).is_none());
    }

    #[test]
    fn add_marker_appends_query_parameter() {
        assert_eq!(
            add_redirect_marker("https://b.example/page?x=1"),
            "https://b.example/page?x=1&_eight_redirect=1"
        );
        assert_eq!(
            add_redirect_marker("https://b.example/page"),
            "https://b.example/page?_eight_redirect=1"
        );
        // Fallback for something the parser rejects.
        assert_eq!(add_redirect_marker("::"), "::?_eight_redirect=1");
    }

    #[test]
    fn strip_marker_removes_only_the_marker() {
        assert_eq!(
            strip_redirect_marker("https://b.example/page?x=1&_eight_redirect=1").as_deref(),
            Some("https://b.example/page?x=1")
        );
        assert_eq!(
            strip_redirect_marker("https://b.example/page?_eight_redirect=1").as_deref(),
            Some("https://b.example/page")
        );
        assert!(strip_redirect_marker("https://b.example/page?x=1").is_none());
    }

    #[test]
    fn marked_backup_url_no_longer_matches() {
        let pair = match_pair("https://a.example/page?x=1", &rules()).unwrap();
        let forwarded = add_redirect_marker(&pair.backup);
        assert!(match_pair(&forwarded, &rules()).is_none());
    }

    #[test]
    fn same_host_ignores_www_case_and_port() {
        assert!(is_same_host(
            "https://www.a.example/x",
            "http://A.EXAMPLE/y?z=1"
        ));
        assert!(is_same_host(
            "https://a.example:8443/x",
            "https://a.example/y"
        ));
        assert!(!is_same_host("https://a.example/", "https://b.example/"));
        assert!(!is_same_host("ftp://a.example/", "https://a.example/"));
        assert!(!is_same_host("junk", "https://a.example/"));
    }

    #[test]
    fn strip_fragment_cuts_at_first_hash() {
        assert_eq!(strip_fragment("https://a.example/p#sec"), "https://a.example/p");
        assert_eq!(strip_fragment("https://a.example/p"), "https://a.example/p");
    }
}
