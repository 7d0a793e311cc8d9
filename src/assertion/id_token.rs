//! id_token validation.
//!
//! Tokens are HS256-signed with the redirector client's secret and must carry
//! the client id as audience and the tenant as issuer (with or without a
//! trailing slash).

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use crate::assertion::{AssertionError, Principal};

#[derive(Clone)]
pub struct IdTokenValidator {
    key: DecodingKey,
    validation: Validation,
}

impl IdTokenValidator {
    pub fn new(client_secret: &str, client_id: &str, issuer: &str) -> Self {
        let issuer = issuer.trim_end_matches('/');
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 60;
        validation.set_audience(&[client_id]);
        validation.set_issuer(&[issuer.to_string(), format!("{}/", issuer)]);

        Self {
            key: DecodingKey::from_secret(client_secret.as_bytes()),
            validation,
        }
    }

    pub fn validate(&self, token: &str) -> Result<Principal, AssertionError> {
        let data = decode::<serde_json::Value>(token, &self.key, &self.validation)
            .map_err(|e| AssertionError::BadIdToken(e.to_string()))?;

        let sub = data
            .claims
            .get("sub")
            .and_then(|s| s.as_str())
            .ok_or_else(|| AssertionError::BadIdToken("missing sub claim".into()))?
            .to_string();

        Ok(Principal {
            sub,
            claims: data.claims,
        })
    }
}
