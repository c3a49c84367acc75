//! JWT provider resolution for gateway upstreams.

use crate::builders::service::ServiceIdentity;
use crate::config::JwtAuth;
use crate::errors::{FullStackError, Result};
use crate::graph::JwtProvider;

/// Public JWKS endpoint Google serves for every service account
pub const SERVICE_ACCOUNT_JWKS_BASE: &str = "https://www.googleapis.com/service_accounts/v1/jwk/";

/// Resolve an upstream's JWT block.
///
/// A block with neither issuer nor JWKS URI trusts tokens signed by the
/// frontend's service account. Setting only one of the two is an error.
pub fn resolve_jwt(
    jwt: Option<&JwtAuth>,
    frontend: Option<&ServiceIdentity>,
    field: &str,
) -> Result<Option<JwtProvider>> {
    let Some(jwt) = jwt else {
        return Ok(None);
    };

    if jwt.is_partial() {
        return Err(FullStackError::config_field(
            "jwt_auth issuer and jwks_uri must be set together",
            format!("{}.jwt_auth", field),
        ));
    }

    let (issuer, jwks_uri) = if jwt.is_unresolved() {
        let identity = frontend.ok_or_else(|| {
            FullStackError::config_field(
                "jwt_auth without issuer needs a frontend service account to derive it from; \
                 the frontend runs as the project default identity",
                format!("{}.jwt_auth", field),
            )
        })?;
        tracing::debug!(issuer = %identity.email, "deriving JWT provider from frontend identity");
        (identity.email.clone(), service_account_jwks(&identity.email))
    } else {
        let issuer = jwt.issuer.as_deref().unwrap_or_default().trim().to_string();
        let jwks_uri = jwt.jwks_uri.as_deref().unwrap_or_default().trim().to_string();
        validate_jwks_uri(&jwks_uri, field)?;
        (issuer, jwks_uri)
    };

    Ok(Some(JwtProvider { issuer, jwks_uri, audiences: jwt.audiences.clone() }))
}

pub fn service_account_jwks(email: &str) -> String {
    format!("{}{}", SERVICE_ACCOUNT_JWKS_BASE, email)
}

fn validate_jwks_uri(jwks_uri: &str, field: &str) -> Result<()> {
    match url::Url::parse(jwks_uri) {
        Ok(url) if url.scheme() == "https" => Ok(()),
        _ => Err(FullStackError::config_field(
            format!("jwks_uri '{}' must be an https URL", jwks_uri),
            format!("{}.jwt_auth.jwks_uri", field),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frontend() -> ServiceIdentity {
        ServiceIdentity { email: "shop-frontend@p.iam.gserviceaccount.com".into(), resource: None }
    }

    #[test]
    fn absent_block_means_no_auth() {
        assert!(resolve_jwt(None, Some(&frontend()), "backend").unwrap().is_none());
    }

    #[test]
    fn empty_block_derives_from_frontend_identity() {
        let jwt = JwtAuth { audiences: vec!["shop".into()], ..Default::default() };
        let provider = resolve_jwt(Some(&jwt), Some(&frontend()), "backend").unwrap().unwrap();
        assert_eq!(provider.issuer, "shop-frontend@p.iam.gserviceaccount.com");
        assert_eq!(
            provider.jwks_uri,
            "https://www.googleapis.com/service_accounts/v1/jwk/shop-frontend@p.iam.gserviceaccount.com"
        );
        assert_eq!(provider.audiences, vec!["shop"]);
    }

    #[test]
    fn explicit_values_pass_through() {
        let jwt = JwtAuth {
            issuer: Some("https://issuer.example.com".into()),
            jwks_uri: Some("https://issuer.example.com/.well-known/jwks.json".into()),
            audiences: vec![],
        };
        let provider = resolve_jwt(Some(&jwt), None, "backend").unwrap().unwrap();
        assert_eq!(provider.issuer, "https://issuer.example.com");
    }

    #[test]
    fn partial_block_is_rejected() {
        let jwt = JwtAuth { issuer: Some("iss".into()), ..Default::default() };
        let err = resolve_jwt(Some(&jwt), Some(&frontend()), "backend").unwrap_err();
        assert_eq!(err.field(), Some("backend.jwt_auth"));
    }

    #[test]
    fn derivation_needs_frontend_identity() {
        let err = resolve_jwt(Some(&JwtAuth::default()), None, "backend").unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn plain_http_jwks_is_rejected() {
        let jwt = JwtAuth {
            issuer: Some("iss".into()),
            jwks_uri: Some("http://insecure.example.com/jwks".into()),
            audiences: vec![],
        };
        assert!(resolve_jwt(Some(&jwt), None, "backend").is_err());
    }
}
