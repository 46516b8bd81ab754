use axum::http::{header, HeaderValue, Method};
use common::settings::Settings;
use std::collections::HashSet;
use tower_http::cors::{AllowOrigin, CorsLayer};

fn normalize_origin(value: &str) -> Option<String> {
    let normalized = value.trim().trim_end_matches('/');
    if normalized.is_empty() {
        None
    } else {
        Some(normalized.to_string())
    }
}

/// `auth.frontend_origin` holds a comma separated list.
pub fn parse_frontend_origins(raw: Option<&str>) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.into_iter()
        .flat_map(|raw| raw.split(','))
        .filter_map(normalize_origin)
        .filter(|origin| seen.insert(origin.clone()))
        .collect()
}

pub fn is_origin_allowed(allowed_origins: &[String], request_origin: &str) -> bool {
    normalize_origin(request_origin)
        .is_some_and(|origin| allowed_origins.iter().any(|allowed| allowed == &origin))
}

/// Debug builds and unconfigured origins fall back to a permissive layer.
pub fn build_cors(settings: &Settings) -> CorsLayer {
    let origins = parse_frontend_origins(settings.auth.frontend_origin.as_deref());
    if settings.debug || origins.is_empty() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _request| {
                origin
                    .to_str()
                    .is_ok_and(|origin| is_origin_allowed(&origins, origin))
            },
        ))
        .allow_credentials(true)
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
}

#[cfg(test)]
mod tests {
    use super::{is_origin_allowed, parse_frontend_origins};

    #[test]
    fn parse_frontend_origins_supports_multiple_values() {
        let origins = parse_frontend_origins(Some("https://a.example, https://b.example"));
        assert_eq!(origins, vec!["https://a.example", "https://b.example"]);
    }

    #[test]
    fn parse_frontend_origins_deduplicates_and_trims() {
        let origins = parse_frontend_origins(Some(
            " https://a.example/ , https://a.example , , https://b.example/ ",
        ));
        assert_eq!(origins, vec!["https://a.example", "https://b.example"]);
        assert!(parse_frontend_origins(None).is_empty());
    }

    #[test]
    fn is_origin_allowed_matches_normalized_value() {
        let allowed = parse_frontend_origins(Some("https://a.example,https://b.example"));
        assert!(is_origin_allowed(&allowed, "https://a.example/"));
        assert!(!is_origin_allowed(&allowed, "https://c.example"));
    }
}
