use crate::db::get_db_pool;
use crate::orm::admin_users;
use crate::session::authenticate_by_cookie;
use actix_session::Session;
use actix_web::dev::Payload;
use actix_web::{Error, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;
use sea_orm::entity::*;

/// Authenticated admin data for a single request cycle.
#[derive(Clone, Debug)]
pub struct Profile {
    pub id: i32,
    pub username: String,
}

/// Client context passed to routes.
/// A request without a valid admin session resolves to a guest context.
#[derive(Clone, Debug, Default)]
pub struct ClientCtx {
    client: Option<Profile>,
}

impl ClientCtx {
    pub async fn from_session(session: &Session) -> Self {
        let record = match authenticate_by_cookie(session).await {
            Some((_, record)) => record,
            None => return Self::default(),
        };

        // The session outliving its admin row is possible but unusual;
        // treat it as a guest.
        let client = match admin_users::Entity::find_by_id(record.admin_id)
            .one(get_db_pool())
            .await
        {
            Ok(admin) => admin.map(|a| Profile {
                id: a.id,
                username: a.username,
            }),
            Err(e) => {
                log::error!("ClientCtx::from_session: {}", e);
                None
            }
        };

        Self { client }
    }

    /// Returns either the admin's id or None for guests.
    pub fn get_id(&self) -> Option<i32> {
        self.client.as_ref().map(|a| a.id)
    }

    pub fn get_admin(&self) -> Option<&Profile> {
        self.client.as_ref()
    }

    pub fn is_admin(&self) -> bool {
        self.client.is_some()
    }

    /// Require an authenticated admin. Returns the admin id or ErrorUnauthorized.
    pub fn require_admin(&self) -> Result<i32, Error> {
        self.get_id()
            .ok_or_else(|| actix_web::error::ErrorUnauthorized("Unauthorized"))
    }
}

/// This implementation is what actually provides the `client: ClientCtx` in
/// the parameters of route functions.
impl FromRequest for ClientCtx {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            match Session::extract(&req).await {
                Ok(session) => Ok(ClientCtx::from_session(&session).await),
                Err(e) => {
                    log::error!("Unable to extract Session data in extractor: {}", e);
                    Ok(ClientCtx::default())
                }
            }
        })
    }
}
