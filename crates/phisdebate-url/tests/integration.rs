//! End-to-end tests for URL extraction and checking, no network access
//! (the default config runs with [`NullReputationService`]).

use phisdebate_url::{extract_urls, URLSecurityChecker, UrlCheckerConfig};

#[tokio::test]
async fn trusted_suffix_short_circuits_to_zero_risk() {
    let checker = URLSecurityChecker::new(UrlCheckerConfig::default());
    let result = checker.check("https://classroom.google.com/c/abc123").await;

    assert!(!result.is_malicious);
    assert_eq!(result.risk_score, 0.0);
}

#[tokio::test]
async fn suspicious_tld_raises_heuristic_risk() {
    let checker = URLSecurityChecker::new(UrlCheckerConfig::default());
    let result = checker.check("http://akun-verifikasi.tk/login").await;

    assert!(result.risk_score > 0.0);
}

#[tokio::test]
async fn check_many_covers_every_distinct_url() {
    let checker = URLSecurityChecker::new(UrlCheckerConfig::default());
    let urls = vec![
        "https://zoom.us/j/123456".to_string(),
        "http://klaim-hadiah.xyz/sekarang".to_string(),
    ];

    let results = checker.check_many(&urls).await;

    assert_eq!(results.len(), 2);
    assert!(!results["https://zoom.us/j/123456"].is_malicious);
    assert!(results["http://klaim-hadiah.xyz/sekarang"].risk_score > 0.0);
}

#[tokio::test]
async fn repeated_check_hits_the_cache() {
    let checker = URLSecurityChecker::new(UrlCheckerConfig::default());
    let first = checker.check("http://contoh-phishing.ga/verifikasi").await;
    let second = checker.check("http://contoh-phishing.ga/verifikasi").await;

    assert_eq!(first.risk_score, second.risk_score);
    assert_eq!(first.source, second.source);
}

#[test]
fn extract_urls_finds_every_link_in_mixed_text() {
    let text = "Cek info di https://baak.kampus.ac.id/jadwal dan juga http://bit.ly/info-krs ya";
    let urls = extract_urls(text);

    assert_eq!(urls.len(), 2);
    assert!(urls.iter().any(|u| u.host == "baak.kampus.ac.id"));
    assert!(urls.iter().any(|u| u.host == "bit.ly"));
}
