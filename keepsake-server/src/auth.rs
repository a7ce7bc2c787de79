use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, StatusCode},
    routing::{get, post},
    Json,
};
use keepsake_shop::{Credentials, SessionData, UserData};

use crate::{
    errors::{ServerError, ServerResult},
    schemas::{LoginSchema, RegisterSchema, ValidatedJson},
    serialized::{LoginResult, ToSerialized, User},
    Router, ServerContext,
};

/// Wraps [SessionData] so [FromRequestParts] can be implemented for it
pub struct Session(SessionData);

impl Session {
    /// Returns the user of the session
    pub fn user(&self) -> &UserData {
        &self.0.user
    }

    pub fn token(&self) -> &str {
        &self.0.token
    }
}

#[async_trait]
impl FromRequestParts<ServerContext> for Session {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        context: &ServerContext,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|x| x.to_str().ok())
            .ok_or(ServerError::Unauthorized)?;

        let parts: Vec<_> = token.split_ascii_whitespace().collect();

        if parts.first() != Some(&"Bearer") {
            return Err(ServerError::MalformedAuthorization);
        }

        let token = parts.get(1).copied().unwrap_or_default();
        let session = context.shop.auth.session(token).await?;

        Ok(Self(session))
    }
}

#[utoipa::path(
    get,
    path = "/api/user",
    tag = "auth",
    security(("BearerAuth" = [])),
    responses(
        (status = 200, body = User),
        (status = 401, body = ErrorMessage)
    )
)]
async fn user(session: Session) -> Json<User> {
    Json(session.user().to_serialized())
}

#[utoipa::path(
    post,
    path = "/api/register",
    tag = "auth",
    request_body = RegisterSchema,
    responses(
        (status = 201, body = LoginResult),
        (status = 400, body = ErrorMessage)
    )
)]
async fn register(
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<RegisterSchema>,
) -> ServerResult<(StatusCode, Json<LoginResult>)> {
    let session = context
        .shop
        .auth
        .register(Credentials {
            username: body.username,
            password: body.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(session.to_serialized())))
}

#[utoipa::path(
    post,
    path = "/api/login",
    tag = "auth",
    request_body = LoginSchema,
    responses(
        (status = 200, body = LoginResult),
        (status = 401, body = ErrorMessage)
    )
)]
async fn login(
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<LoginSchema>,
) -> ServerResult<Json<LoginResult>> {
    let session = context
        .shop
        .auth
        .login(Credentials {
            username: body.username,
            password: body.password,
        })
        .await?;

    Ok(Json(session.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/api/logout",
    tag = "auth",
    security(("BearerAuth" = [])),
    responses(
        (status = 204, description = "The session was deleted"),
        (status = 401, body = ErrorMessage)
    )
)]
async fn logout(
    State(context): State<ServerContext>,
    session: Session,
) -> ServerResult<StatusCode> {
    context.shop.auth.logout(session.token()).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router {
    Router::new()
        .route("/user", get(user))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
}
