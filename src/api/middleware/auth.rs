use crate::AppState;
use crate::api::error::AppError;
use crate::api::permissions::{self, Chain, Denied};
use crate::entities::{prelude::*, users};
use crate::services::tier_service::{TierProfile, TierService};
use crate::utils::auth::validate_jwt;
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::Deserialize;
use std::convert::Infallible;
use tracing::debug;

#[derive(Deserialize)]
struct AuthQuery {
    token: Option<String>,
}

/// The authenticated user together with its tier, if any.
#[derive(Debug, Clone)]
pub struct Caller {
    pub user: users::Model,
    pub tier: Option<TierProfile>,
}

impl Caller {
    pub fn tier(&self) -> Result<&TierProfile, Denied> {
        self.tier.as_ref().ok_or(Denied::NoTier)
    }
}

/// Extracts the [`Caller`] attached by [`identify_caller`], if there is one.
pub struct MaybeCaller(pub Option<Caller>);

impl MaybeCaller {
    /// Runs `chain` and hands back the caller. Only meaningful for chains that
    /// demand an identity; an anonymous request always ends as `Unauthenticated`.
    pub fn authorize(self, chain: Chain) -> Result<Caller, Denied> {
        permissions::authorize(chain, self.0.as_ref())?;
        self.0.ok_or(Denied::Unauthenticated)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeCaller
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeCaller(parts.extensions.get::<Caller>().cloned()))
    }
}

fn bearer_token(req: &Request) -> Option<String> {
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|s| s.to_string());

    if auth_header.is_some() {
        return auth_header;
    }

    // Try query parameter
    let query = req.uri().query().unwrap_or_default();
    serde_urlencoded::from_str::<AuthQuery>(query)
        .ok()
        .and_then(|q| q.token)
}

pub async fn load_caller(
    db: &DatabaseConnection,
    user_id: &str,
) -> Result<Option<Caller>, AppError> {
    let Some(user) = Users::find_by_id(user_id).one(db).await? else {
        return Ok(None);
    };

    let tier = match user.tier_id {
        Some(tier_id) => TierService::load_profile(db, tier_id).await?,
        None => None,
    };

    Ok(Some(Caller { user, tier }))
}

/// Resolves the caller from a bearer token (header or `?token=`).
///
/// Never rejects: a missing or invalid token leaves the request anonymous and
/// the endpoint's permission chain decides what that means.
pub async fn identify_caller(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(token) = bearer_token(&req) {
        match validate_jwt(&token, &state.config.jwt_secret) {
            Ok(claims) => match load_caller(&state.db, &claims.sub).await? {
                Some(caller) => {
                    req.extensions_mut().insert(caller);
                    req.extensions_mut().insert(claims);
                }
                None => debug!("Token subject {} no longer exists", claims.sub),
            },
            Err(e) => debug!("Ignoring invalid bearer token: {}", e),
        }
    }

    Ok(next.run(req).await)
}
