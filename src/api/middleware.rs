//! Request middleware: session cookie and bearer-token authentication.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::db::Database;
use crate::error::AppError;

pub const SESSION_COOKIE: &str = "sessionid";

/// The session a request belongs to. Flash messages are queued under it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionId {
    pub id: Uuid,
    /// The client sent this id back in its cookie, so it will see messages
    /// queued for later requests.
    pub returning: bool,
}

/// Attach a [`SessionId`] to the request, issuing a fresh `sessionid` cookie
/// when the client did not send a usable one.
pub async fn session(jar: CookieJar, mut request: Request, next: Next) -> (CookieJar, Response) {
    let existing = jar
        .get(SESSION_COOKIE)
        .and_then(|c| Uuid::parse_str(c.value()).ok());
    let id = existing.unwrap_or_else(Uuid::new_v4);

    request.extensions_mut().insert(SessionId {
        id,
        returning: existing.is_some(),
    });
    let response = next.run(request).await;

    let jar = match existing {
        Some(_) => jar,
        None => jar.add(
            Cookie::build((SESSION_COOKIE, id.to_string()))
                .path("/")
                .http_only(true),
        ),
    };
    (jar, response)
}

/// Resolve `Authorization: Bearer <token>` into a [`CurrentUser`].
///
/// No header means an anonymous request. A malformed or non-ASCII header or
/// an unknown token is rejected outright.
pub async fn authenticate(
    State(db): State<Database>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = match request.headers().get(AUTHORIZATION) {
        None => None,
        Some(value) => match value.to_str() {
            Ok(header) => Some(header.to_owned()),
            Err(_) => {
                tracing::warn!("Authorization header is not valid ASCII");
                return Err(AppError::Unauthorized);
            }
        },
    };

    let current = match auth_header {
        None => CurrentUser::Anonymous,
        Some(header) => {
            let Some(token) = header.strip_prefix("Bearer ") else {
                tracing::warn!("Invalid Authorization header format");
                return Err(AppError::Unauthorized);
            };
            match db.get_user_by_token(token.trim())? {
                Some(user) if user.is_active => CurrentUser::Authenticated(user),
                Some(user) => {
                    tracing::warn!("Token presented for inactive user {}", user.username);
                    CurrentUser::Anonymous
                }
                None => {
                    tracing::warn!("Invalid API token provided");
                    return Err(AppError::Unauthorized);
                }
            }
        }
    };

    request.extensions_mut().insert(current);
    Ok(next.run(request).await)
}
