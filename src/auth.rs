//! Named auth policies turned into request gates.
//!
//! A module names at most one policy. The resolver builds every policy once at startup;
//! a policy that cannot be built (unknown type, bad key material) makes every module
//! that names it fail registration instead of running unprotected.

use crate::config::{AuthConfig, AuthPolicy};
use crate::error::ConfigError;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use base64::Engine as _;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use subtle::ConstantTimeEq;

pub const BASIC_UNAUTHORIZED_BODY: &str = "Unauthorized";
pub const BASIC_REALM: &str = "Basic realm=\"Restricted\"";
pub const TOKEN_UNAUTHORIZED_MESSAGE: &str = "invalid or missing token";

/// Single static username/password pair.
pub struct BasicGate {
    username: String,
    password: String,
}

impl std::fmt::Debug for BasicGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicGate").field("username", &self.username).finish_non_exhaustive()
    }
}

impl BasicGate {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        BasicGate {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn check(&self, headers: &HeaderMap) -> bool {
        let Some((user, pass)) = basic_credentials(headers) else {
            return false;
        };
        let user_ok = user.as_bytes().ct_eq(self.username.as_bytes());
        let pass_ok = pass.as_bytes().ct_eq(self.password.as_bytes());
        bool::from(user_ok & pass_ok)
    }

    fn reject() -> Response {
        (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, BASIC_REALM)],
            BASIC_UNAUTHORIZED_BODY,
        )
            .into_response()
    }
}

fn authorization<'a>(headers: &'a HeaderMap, scheme: &str) -> Option<&'a str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (given, rest) = value.split_once(' ')?;
    given.eq_ignore_ascii_case(scheme).then(|| rest.trim())
}

fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let encoded = authorization(headers, "Basic")?;
    let decoded = base64::engine::general_purpose::STANDARD.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

/// Claims of a verified bearer token, available to handlers via request extensions.
#[derive(Clone, Debug)]
pub struct TokenClaims(pub Map<String, Value>);

/// RS256 bearer-token verification against one public key.
pub struct TokenGate {
    key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenGate").field("algorithm", &Algorithm::RS256).finish()
    }
}

impl TokenGate {
    pub fn from_pem(pem: &[u8]) -> Result<Self, jsonwebtoken::errors::Error> {
        let key = DecodingKey::from_rsa_pem(pem)?;
        let mut validation = Validation::new(Algorithm::RS256);
        // exp/nbf are checked when the token carries them; none is mandatory.
        validation.required_spec_claims.clear();
        validation.validate_nbf = true;
        validation.validate_aud = false;
        Ok(TokenGate { key, validation })
    }

    pub fn verify(&self, headers: &HeaderMap) -> Option<TokenClaims> {
        let token = authorization(headers, "Bearer")?;
        match decode::<Map<String, Value>>(token, &self.key, &self.validation) {
            Ok(data) => Some(TokenClaims(data.claims)),
            Err(e) => {
                tracing::debug!(error = %e, "bearer token rejected");
                None
            }
        }
    }

    fn reject() -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": TOKEN_UNAUTHORIZED_MESSAGE })),
        )
            .into_response()
    }
}

/// Request-admission check attached to a module's routes.
#[derive(Clone, Debug)]
pub enum Gate {
    Basic(Arc<BasicGate>),
    SignedToken(Arc<TokenGate>),
}

impl Gate {
    pub fn from_policy(name: &str, policy: &AuthPolicy) -> Result<Self, ConfigError> {
        match policy {
            AuthPolicy::Basic { username, password } => {
                Ok(Gate::Basic(Arc::new(BasicGate::new(username.clone(), password.clone()))))
            }
            AuthPolicy::SignedToken { public_key_pem } => TokenGate::from_pem(public_key_pem)
                .map(|g| Gate::SignedToken(Arc::new(g)))
                .map_err(|e| ConfigError::InvalidAuth {
                    name: name.to_string(),
                    reason: format!("invalid RSA public key PEM: {}", e),
                }),
        }
    }

    /// Passes the request through (with claims attached for tokens) or returns the 401 response.
    pub fn admit(&self, req: &mut Request) -> Result<(), Response> {
        match self {
            Gate::Basic(g) => {
                if g.check(req.headers()) {
                    Ok(())
                } else {
                    Err(BasicGate::reject())
                }
            }
            Gate::SignedToken(g) => match g.verify(req.headers()) {
                Some(claims) => {
                    req.extensions_mut().insert(claims);
                    Ok(())
                }
                None => Err(TokenGate::reject()),
            },
        }
    }
}

/// Middleware for `axum::middleware::from_fn_with_state(gate, require_gate)`.
pub async fn require_gate(State(gate): State<Gate>, mut req: Request, next: Next) -> Response {
    match gate.admit(&mut req) {
        Ok(()) => next.run(req).await,
        Err(rejection) => rejection,
    }
}

/// Policy name -> gate, or the configuration error that prevented building it.
#[derive(Debug, Default)]
pub struct AuthResolver {
    gates: HashMap<String, Result<Gate, ConfigError>>,
}

impl AuthResolver {
    pub fn new(configs: &[AuthConfig]) -> Self {
        let mut gates = HashMap::new();
        for a in configs {
            let gate = AuthPolicy::try_from(a).and_then(|p| Gate::from_policy(&a.name, &p));
            match &gate {
                Ok(_) => tracing::info!(auth = %a.name, kind = %a.type_, "auth policy ready"),
                Err(e) => tracing::error!(auth = %a.name, error = %e, "auth policy unusable"),
            }
            gates.insert(a.name.clone(), gate);
        }
        AuthResolver { gates }
    }

    /// `None`/empty name means no gate. A name that is unknown or unusable is an error.
    pub fn resolve(&self, name: Option<&str>) -> Result<Option<Gate>, ConfigError> {
        let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) else {
            return Ok(None);
        };
        match self.gates.get(name) {
            Some(Ok(gate)) => Ok(Some(gate.clone())),
            Some(Err(e)) => Err(e.clone()),
            None => Err(ConfigError::MissingReference {
                kind: "auth",
                id: name.to_string(),
            }),
        }
    }
}
