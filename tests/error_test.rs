use axum::{http::StatusCode, response::IntoResponse};
use serde_json::json;
use tunebridge::error::{ConvertError, CredentialError, CredentialErrorKind};
use tunebridge::types::ProviderId;

fn credential(provider: ProviderId, kind: CredentialErrorKind) -> ConvertError {
    ConvertError::from(CredentialError::new(provider, kind))
}

#[test]
fn test_credential_action_codes() {
    let cases = [
        (ProviderId::Youtube, CredentialErrorKind::NotLinked, "CONNECT_GOOGLE"),
        (ProviderId::Youtube, CredentialErrorKind::Expired, "RECONNECT_GOOGLE"),
        (ProviderId::Youtube, CredentialErrorKind::RefreshFailed, "RECONNECT_GOOGLE"),
        (ProviderId::Youtube, CredentialErrorKind::ScopeMissing, "RECONNECT_GOOGLE_YOUTUBE"),
        (ProviderId::Spotify, CredentialErrorKind::NotLinked, "CONNECT_SPOTIFY"),
        (ProviderId::Spotify, CredentialErrorKind::Expired, "RECONNECT_SPOTIFY"),
    ];

    for (provider, kind, action) in cases {
        assert_eq!(
            credential(provider, kind).action().as_deref(),
            Some(action),
            "{:?} {:?}",
            provider,
            kind
        );
    }
}

#[test]
fn test_credential_status_codes() {
    assert_eq!(
        credential(ProviderId::Spotify, CredentialErrorKind::NotLinked).status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        credential(ProviderId::Spotify, CredentialErrorKind::Expired).status(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        credential(ProviderId::Youtube, CredentialErrorKind::ScopeMissing).status(),
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        credential(ProviderId::Spotify, CredentialErrorKind::Store).status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[test]
fn test_quota_and_api_errors() {
    let quota = ConvertError::Quota {
        provider: ProviderId::Youtube,
    };
    assert_eq!(quota.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(quota.action().as_deref(), Some("RETRY_LATER"));

    let disabled = ConvertError::ApiNotEnabled {
        provider: ProviderId::Youtube,
    };
    assert_eq!(disabled.status(), StatusCode::FORBIDDEN);
    assert_eq!(disabled.action().as_deref(), Some("ENABLE_API"));
}

#[test]
fn test_input_errors_are_bad_requests() {
    for e in [
        ConvertError::UnsupportedUrl,
        ConvertError::SamePlatform,
        ConvertError::Extraction,
        ConvertError::Input("URL and target platform are required".to_string()),
    ] {
        assert_eq!(e.status(), StatusCode::BAD_REQUEST);
        assert_eq!(e.action(), None);
    }
    assert_eq!(ConvertError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
}

#[test]
fn test_body_shape() {
    assert_eq!(
        ConvertError::Extraction.body(),
        json!({ "error": { "message": "Failed to extract playlist data" } })
    );

    let body = credential(ProviderId::Youtube, CredentialErrorKind::NotLinked).body();
    assert_eq!(body["error"]["action"], "CONNECT_GOOGLE");
    assert!(body["error"]["message"].as_str().is_some());
}

#[test]
fn test_unexpected_error_hides_detail() {
    let e = ConvertError::Unexpected("connection pool exhausted".to_string());

    assert_eq!(e.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        e.body(),
        json!({ "error": { "message": "Internal server error" } })
    );
}

#[test]
fn test_provider_error_is_forwarded() {
    let e = ConvertError::Provider {
        status: 404,
        body: json!({ "error": { "status": 404, "message": "Not found." } }),
    };

    assert_eq!(e.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        e.body(),
        json!({ "error": { "status": 404, "message": "Not found." } })
    );
}

#[test]
fn test_into_response_status() {
    let response = ConvertError::Quota {
        provider: ProviderId::Spotify,
    }
    .into_response();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}
