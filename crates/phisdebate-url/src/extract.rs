//! Finds URL-like tokens in free text and normalizes them.
//!
//! Chat messages have no reliable notion of "code span" (unlike markdown
//! documents), so unlike a general-purpose sanitizer this extractor makes no
//! attempt to special-case fenced text — a URL inside a code fence is still a
//! URL a recipient can click.

use crate::models::URLInfo;
use regex::Regex;
use std::sync::OnceLock;

/// Trailing characters that are almost always prose punctuation rather than
/// part of the URL itself.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']'];

/// A small gazetteer of plausibly-registered TLDs, used only to decide
/// whether a bare `host.tld/path` token (no scheme, no `www.`) is worth
/// extracting at all. Scheme-qualified and `www.`-prefixed tokens bypass
/// this check entirely since their form already signals intent.
fn plausible_tlds() -> &'static [&'static str] {
    &[
        "com", "net", "org", "id", "co", "io", "info", "biz", "xyz", "top", "tk", "ml", "ga",
        "cf", "gq", "me", "us", "edu", "gov", "ac", "sch", "go", "click", "work", "online",
    ]
}

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?xi)
            (?P<absolute>https?://[^\s<>\x22]+)
            |
            (?P<www>www\.[a-z0-9\-\.]+\.[a-z]{2,}(?:/[^\s<>\x22]*)?)
            |
            (?P<bare>[a-z0-9\-]+(?:\.[a-z0-9\-]+)*\.[a-z]{2,}(?:/[^\s<>\x22]*)?)
            ",
        )
        .expect("static URL token regex is valid")
    })
}

/// Finds URL-like tokens in `text`, in order of first appearance, with
/// duplicates removed (later occurrences of an already-seen normalized URL
/// are dropped). Returns an empty list, never an error, when nothing is
/// found.
pub fn extract_urls(text: &str) -> Vec<URLInfo> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();

    for caps in token_regex().captures_iter(text) {
        let raw = caps
            .name("absolute")
            .or_else(|| caps.name("www"))
            .or_else(|| caps.name("bare"))
            .map(|m| m.as_str())
            .unwrap_or_default();

        let raw = raw.trim_end_matches(TRAILING_PUNCTUATION);
        if raw.is_empty() {
            continue;
        }

        if caps.name("bare").is_some() && caps.name("absolute").is_none() && caps.name("www").is_none() {
            if !has_plausible_tld(raw) {
                continue;
            }
        }

        let Some(info) = build_url_info(raw) else {
            continue;
        };

        if seen.insert(info.normalized.clone()) {
            out.push(info);
        }
    }

    out
}

fn has_plausible_tld(bare_token: &str) -> bool {
    let host = bare_token.split('/').next().unwrap_or(bare_token);
    let Some(last_label) = host.rsplit('.').next() else {
        return false;
    };
    plausible_tlds()
        .iter()
        .any(|t| t.eq_ignore_ascii_case(last_label))
}

fn build_url_info(raw: &str) -> Option<URLInfo> {
    let normalized = if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("http://{raw}")
    };

    let parsed = url::Url::parse(&normalized).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    let tld = effective_tld(&host);
    let path_depth = parsed
        .path_segments()
        .map(|segs| segs.filter(|s| !s.is_empty()).count())
        .unwrap_or(0);
    let is_secure = parsed.scheme() == "https";

    Some(URLInfo {
        raw: raw.to_string(),
        normalized,
        host,
        tld,
        path_depth,
        is_secure,
    })
}

/// Two-label suffixes commonly used in Indonesia (`.ac.id`, `.sch.id`, ...)
/// are treated as the effective TLD rather than just the last label, so
/// trust-set matching lines up with how such domains are actually registered.
fn effective_tld(host: &str) -> String {
    const TWO_LABEL_SUFFIXES: &[&str] = &["ac.id", "sch.id", "go.id", "co.id", "or.id", "web.id"];
    let labels: Vec<&str> = host.rsplit('.').collect();
    if labels.len() >= 2 {
        let candidate = format!("{}.{}", labels[1], labels[0]);
        if TWO_LABEL_SUFFIXES.contains(&candidate.as_str()) {
            return candidate;
        }
    }
    labels.first().map(|s| s.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_urls_returns_empty() {
        assert!(extract_urls("Jangan lupa deadline besok").is_empty());
    }

    #[test]
    fn extracts_absolute_url() {
        let urls = extract_urls("Cek https://example.com/path untuk info");
        assert_eq!(urls.len(), 1);
        assert_eq!(urls[0].host, "example.com");
        assert!(urls[0].is_secure);
    }

    #[test]
    fn strips_trailing_prose_punctuation() {
        let urls = extract_urls("Lihat bit.ly/materi-kuliah.");
        assert_eq!(urls.len(), 1);
        assert_eq!(urls[0].raw, "bit.ly/materi-kuliah");
    }

    #[test]
    fn extracts_www_prefixed_host() {
        let urls = extract_urls("kunjungi www.kampus.ac.id sekarang");
        assert_eq!(urls.len(), 1);
        assert_eq!(urls[0].host, "www.kampus.ac.id");
    }

    #[test]
    fn rejects_implausible_bare_tld() {
        // "v1.2" looks like a bare host.tld token but ".2" isn't a real TLD.
        assert!(extract_urls("versi v1.2 dirilis").is_empty());
    }

    #[test]
    fn dedupes_repeated_urls() {
        let urls = extract_urls("https://a.com/x dan lagi https://a.com/x ya");
        assert_eq!(urls.len(), 1);
    }

    #[test]
    fn normalizes_missing_scheme() {
        let urls = extract_urls("classroom.google.com/c/abc");
        assert_eq!(urls[0].normalized, "http://classroom.google.com/c/abc");
    }

    #[test]
    fn code_fenced_urls_are_still_extracted() {
        let urls = extract_urls("```\nhttps://bit.ly/x\n```");
        assert_eq!(urls.len(), 1);
    }

    #[test]
    fn effective_tld_handles_two_label_suffix() {
        let urls = extract_urls("https://ui.ac.id/page");
        assert_eq!(urls[0].tld, "ac.id");
    }
}
