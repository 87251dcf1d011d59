use std::collections::HashMap;
use std::sync::Arc;

use rocket::http::Status;
use rocket::request::{FromRequest, Outcome, Request};

use crate::config::{env_var, CALLER_TOKENS_VAR};
use crate::error::CallError;

/// Identity of an authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub uid: String,
}

/// Resolves bearer tokens into callers.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, token: &str) -> Option<Caller>;
}

/// Fixed table of `token -> uid`, e.g. `QR_PLAYLISTS_CALLER_TOKENS=tok1=alice,tok2=bob`.
#[derive(Debug, Default)]
pub struct StaticTokens {
    tokens: HashMap<String, String>,
}

impl StaticTokens {
    pub fn parse(table: &str) -> Self {
        let mut tokens = HashMap::new();
        for entry in table.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
            match entry.split_once('=') {
                Some((token, uid)) if !token.trim().is_empty() && !uid.trim().is_empty() => {
                    tokens.insert(token.trim().to_string(), uid.trim().to_string());
                }
                _ => log::warn!("Ignoring malformed caller token entry"),
            }
        }
        StaticTokens { tokens }
    }

    pub fn from_env() -> Self {
        let tokens = Self::parse(&env_var(CALLER_TOKENS_VAR).unwrap_or_default());
        if tokens.is_empty() {
            log::warn!("{CALLER_TOKENS_VAR} is empty, every call will be rejected");
        }
        tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl Authenticator for StaticTokens {
    fn authenticate(&self, token: &str) -> Option<Caller> {
        self.tokens.get(token).map(|uid| Caller { uid: uid.clone() })
    }
}

/// Rejected requests surface as `None` when the guard is taken as
/// `Option<Caller>`; handlers decide when to report it.
#[rocket::async_trait]
impl<'r> FromRequest<'r> for Caller {
    type Error = CallError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let Some(authenticator) = req.rocket().state::<Arc<dyn Authenticator>>() else {
            return Outcome::Error((Status::Unauthorized, CallError::unauthenticated()));
        };
        let caller = req
            .headers()
            .get_one("Authorization")
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .and_then(|token| authenticator.authenticate(token));
        match caller {
            Some(caller) => Outcome::Success(caller),
            None => Outcome::Error((Status::Unauthorized, CallError::unauthenticated())),
        }
    }
}

/// First step of every handler.
pub fn require_caller(caller: Option<&Caller>) -> Result<&Caller, CallError> {
    caller.ok_or_else(CallError::unauthenticated)
}
