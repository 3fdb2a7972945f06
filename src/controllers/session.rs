use actix_web::dev::Payload;
use actix_web::http::{header, StatusCode};
use actix_web::{error::BlockingError, get, web, FromRequest, HttpRequest, HttpResponse};
use base64::prelude::{Engine, BASE64_STANDARD};
use futures::future::LocalBoxFuture;
use serde_json::json;
use shop_backoffice::access::{authenticate, Caller};
use shop_backoffice::error::ServiceError;
use shop_backoffice::store::{Entity, PgStore};
use shop_backoffice::DbPool;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("malformed Authorization header")]
    BadCredentials,
    #[error("connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
    #[error("blocking task failed: {0}")]
    Blocking(#[from] BlockingError),
    #[error("{0} is not configured")]
    Misconfigured(&'static str),
}

impl actix_web::error::ResponseError for ControllerError {
    fn status_code(&self) -> StatusCode {
        use ControllerError::*;
        match self {
            Service(ServiceError::Unauthorized) | BadCredentials => StatusCode::UNAUTHORIZED,
            Service(ServiceError::Forbidden) => StatusCode::FORBIDDEN,
            Service(ServiceError::Validation { .. }) => StatusCode::BAD_REQUEST,
            Service(ServiceError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Service(ServiceError::Protected { .. }) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{self}");
        } else {
            log::warn!("{self}");
        }
        let message = match self {
            ControllerError::Service(ServiceError::Protected {
                entity: Entity::Product,
                ..
            }) => "product is referenced by existing orders and cannot be deleted".to_string(),
            _ if status.is_server_error() => "internal server error".to_string(),
            err => err.to_string(),
        };
        let mut response = HttpResponse::build(status);
        if status == StatusCode::UNAUTHORIZED {
            response.insert_header((header::WWW_AUTHENTICATE, "Basic realm=\"shop\""));
        }
        response.json(json!({ "error": message }))
    }
}

struct Credentials {
    username: String,
    password: String,
}

/// `None` when the request carries no Authorization header.
fn basic_credentials(req: &HttpRequest) -> Result<Option<Credentials>, ControllerError> {
    let Some(value) = req.headers().get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let encoded = value
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Basic "))
        .ok_or(ControllerError::BadCredentials)?;
    let decoded = BASE64_STANDARD
        .decode(encoded.trim())
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .ok_or(ControllerError::BadCredentials)?;
    let (username, password) = decoded
        .split_once(':')
        .ok_or(ControllerError::BadCredentials)?;
    Ok(Some(Credentials {
        username: username.to_owned(),
        password: password.to_owned(),
    }))
}

/// The authenticated caller of a request; a guest when no credentials were sent.
pub struct Session(pub Caller);

impl FromRequest for Session {
    type Error = ControllerError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            let Some(credentials) = basic_credentials(&req)? else {
                return Ok(Session(Caller::guest()));
            };
            let pool = web::Data::<DbPool>::extract(&req)
                .await
                .map_err(|_| ControllerError::Misconfigured("database pool"))?;
            let caller = web::block(move || -> Result<Caller, ControllerError> {
                let mut conn = pool.get()?;
                let mut store = PgStore::new(&mut conn);
                Ok(authenticate(
                    &mut store,
                    &credentials.username,
                    &credentials.password,
                )?)
            })
            .await??;
            Ok(Session(caller))
        })
    }
}

#[get("/api/me")]
async fn get_me(session: Session) -> HttpResponse {
    HttpResponse::Ok().json(session.0)
}
