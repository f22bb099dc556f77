// Unit tests for whitelist normalization and matching

use gatekeeper::gate::{normalize_path, RouteFlags, Whitelist};

#[test]
fn test_version_segment_stripped() {
    assert_eq!(normalize_path("/v1/orders"), "/orders");
    assert_eq!(normalize_path("/v12/doc/api"), "/doc/api");
    assert_eq!(normalize_path("/V3/USER/Authorize"), "/user/authorize");
}

#[test]
fn test_non_version_segments_kept() {
    assert_eq!(normalize_path("/vendors/1"), "/vendors/1");
    assert_eq!(normalize_path("/v/orders"), "/v/orders");
    assert_eq!(normalize_path("/api/v1/orders"), "/api/v1/orders");
}

#[test]
fn test_health_and_doc_skip_both_checks() {
    let wl = Whitelist::standard();
    for path in ["/health", "/health/live", "/doc", "/doc/index.html", "/v2/HEALTH"] {
        assert!(wl.allows(path, RouteFlags::SKIP_API_KEY), "{}", path);
        assert!(wl.allows(path, RouteFlags::SKIP_TOKEN), "{}", path);
    }
}

#[test]
fn test_login_skips_token_only() {
    let wl = Whitelist::standard();
    assert!(wl.allows("/user/authorize", RouteFlags::SKIP_TOKEN));
    assert!(wl.allows("/v1/user/authorize/refresh", RouteFlags::SKIP_TOKEN));
    assert!(!wl.allows("/user/authorize", RouteFlags::SKIP_API_KEY));
}

#[test]
fn test_unlisted_paths_checked() {
    let wl = Whitelist::standard();
    for path in ["/orders", "/user", "/users/authorize", "/healt"] {
        assert!(!wl.allows(path, RouteFlags::SKIP_API_KEY), "{}", path);
        assert!(!wl.allows(path, RouteFlags::SKIP_TOKEN), "{}", path);
    }
}

#[test]
fn test_over_broad_prefix_match_preserved() {
    let wl = Whitelist::standard();
    assert!(wl.allows("/documents", RouteFlags::SKIP_TOKEN));
    assert!(wl.allows("/healthcheck-admin", RouteFlags::SKIP_API_KEY));
}

#[test]
fn test_custom_table_is_case_insensitive() {
    let wl = Whitelist::new([("/Public", RouteFlags::SKIP_TOKEN)]);
    assert_eq!(wl.entries()[0].prefix, "/public");
    assert!(wl.allows("/PUBLIC/feed", RouteFlags::SKIP_TOKEN));
    assert!(!wl.allows("/public/feed", RouteFlags::SKIP_API_KEY));
}
