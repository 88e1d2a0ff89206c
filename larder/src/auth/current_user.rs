//! Extractors for resolving the acting user in handlers.
//!
//! [`CurrentUser`] rejects with 401 when no valid session is present.
//! [`MaybeUser`] is the explicit anonymous marker for public reads: it
//! resolves to `None` when no credentials are present, but still rejects
//! when credentials are present and invalid.

use crate::{
    AppState,
    api::models::users::CurrentUser,
    auth::session,
    errors::{Error, Result},
};
use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::{debug, instrument, trace};

/// Extract user from JWT session cookie if present and valid
/// Returns:
/// - None: No session cookie present
/// - Some(Ok(user)): Valid session found and verified
/// - Some(Err(error)): Session cookie present but invalid/expired
#[instrument(skip(parts, config))]
fn try_jwt_session_auth(parts: &Parts, config: &crate::config::Config) -> Option<Result<CurrentUser>> {
    let cookie_header = parts.headers.get(axum::http::header::COOKIE)?;

    let cookie_str = match cookie_header.to_str() {
        Ok(s) => s,
        Err(e) => {
            return Some(Err(Error::BadRequest {
                message: format!("Invalid cookie header: {e}"),
            }));
        }
    };
    let cookie_name = &config.auth.session.cookie_name;

    for cookie in cookie_str.split(';') {
        let cookie = cookie.trim();
        if let Some((name, value)) = cookie.split_once('=')
            && name == cookie_name
        {
            return Some(session::verify_session_token(value, config));
        }
    }
    None
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        match try_jwt_session_auth(parts, &state.config) {
            Some(Ok(user)) => {
                debug!("Found session authenticated user: {}", user.id);
                Ok(user)
            }
            Some(Err(e)) => {
                trace!("Session authentication failed: {:?}", e);
                Err(Error::Unauthenticated { message: None })
            }
            None => {
                trace!("No authentication credentials found in request");
                Err(Error::Unauthenticated { message: None })
            }
        }
    }
}

/// The acting user, or the explicit anonymous marker.
///
/// Public read endpoints use this to compute per-viewer derived fields
/// (`is_favorited`, `is_in_shopping_cart`, `is_subscribed`) without
/// requiring authentication.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<CurrentUser>);

impl MaybeUser {
    /// The viewer's user id, if authenticated
    pub fn id(&self) -> Option<crate::types::UserId> {
        self.0.as_ref().map(|user| user.id)
    }
}

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        match try_jwt_session_auth(parts, &state.config) {
            Some(Ok(user)) => Ok(MaybeUser(Some(user))),
            // An expired or garbled session on a public endpoint reads as anonymous
            Some(Err(_)) => Ok(MaybeUser(None)),
            None => Ok(MaybeUser(None)),
        }
    }
}
