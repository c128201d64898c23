//! Token authentication extractors.
//!
//! Requests carry `Authorization: Token <key>`. The key is resolved through
//! the domain service found in request extensions.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::api::rest::error::{map_domain_error, unauthenticated};
use crate::api::rest::problem::ProblemResponse;
use crate::contract::model::Identity;
use crate::domain::service::Service;

const SCHEME: &str = "Token";

/// Authenticated caller; rejects with 401 when no valid token is supplied.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub Identity);

/// Optional caller. A missing header yields `None`; a malformed or unknown
/// token is still a 401.
#[derive(Debug, Clone, Copy)]
pub struct MaybeUser(pub Option<Identity>);

/// `Some(key)` for a well-formed header, `Err` for anything else present.
fn token_from(parts: &Parts) -> Result<Option<&str>, ()> {
    let Some(raw) = parts.headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = raw.to_str().map_err(|_| ())?;
    let (scheme, key) = value.trim().split_once(' ').ok_or(())?;
    let key = key.trim();
    if !scheme.eq_ignore_ascii_case(SCHEME) || key.is_empty() {
        return Err(());
    }
    Ok(Some(key))
}

async fn resolve(parts: &Parts) -> Result<Option<Identity>, ProblemResponse> {
    let path = parts.uri.path();
    let key = match token_from(parts) {
        Ok(Some(key)) => key,
        Ok(None) => return Ok(None),
        Err(()) => {
            tracing::debug!("malformed authorization header");
            return Err(unauthenticated(path));
        }
    };
    let svc = parts
        .extensions
        .get::<Arc<Service>>()
        .cloned()
        .ok_or_else(|| {
            tracing::error!("foodgram service missing from request extensions");
            crate::api::rest::error::from_parts(
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "Internal error",
                "Service unavailable",
                path,
            )
        })?;
    svc.authenticate(key)
        .await
        .map(Some)
        .map_err(|e| map_domain_error(&e, path))
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ProblemResponse;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match resolve(parts).await? {
            Some(identity) => Ok(Self(identity)),
            None => Err(unauthenticated(parts.uri.path())),
        }
    }
}

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = ProblemResponse;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        resolve(parts).await.map(Self)
    }
}
