//! Administration and moderation endpoints.
//!
//! Everything here except login and the session check requires an
//! authenticated admin session; unauthenticated calls get a 401 before any
//! database write happens.

use crate::app_config;
use crate::db::get_db_pool;
use crate::directory;
use crate::middleware::ClientCtx;
use crate::moderation::{self, SuggestionOutcome};
use crate::orm::{admin_users, channels, reviews, tag_suggestions};
use crate::session::{self, get_argon2, get_sess};
use actix_web::{error, get, patch, post, web, Error, HttpResponse};
use argon2::password_hash::{PasswordHash, PasswordVerifier};
use chrono::Utc;
use sea_orm::{
    entity::*, query::*, ActiveValue::Set, ColumnTrait, DbErr, QueryFilter, QueryOrder,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(post_login)
        .service(post_logout)
        .service(get_check)
        .service(get_stats)
        // Moderation queues
        .service(view_all_channels)
        .service(view_all_reviews)
        .service(view_tag_suggestions)
        // Approval state machine
        .service(update_channel_approval)
        .service(update_review_approval)
        .service(update_tag_approval)
        // Tag management
        .service(approve_tag)
        .service(create_tag);
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

// ============================================================================
// Authentication
// ============================================================================

#[derive(Debug)]
pub enum LoginOutcome {
    Success(i32),
    BadName,
    BadPassword,
    AccountLocked,
}

/// Check credentials against the stored argon2 hash, tracking failed
/// attempts and locking the account after too many.
pub async fn login(name: &str, pass: &str) -> Result<LoginOutcome, DbErr> {
    let security = app_config::security();
    let db = get_db_pool();

    let admin = admin_users::Entity::find()
        .filter(admin_users::Column::Username.eq(name))
        .one(db)
        .await?;

    let admin = match admin {
        Some(admin) => admin,
        None => return Ok(LoginOutcome::BadName),
    };

    // Check if the account is locked
    let admin = match admin.locked_until {
        Some(locked_until) if locked_until > Utc::now().naive_utc() => {
            return Ok(LoginOutcome::AccountLocked);
        }
        Some(_) => {
            // Lock has expired, reset failed attempts
            let mut active_admin: admin_users::ActiveModel = admin.into();
            active_admin.failed_login_attempts = Set(0);
            active_admin.locked_until = Set(None);
            active_admin.update(db).await?
        }
        None => admin,
    };

    let parsed_hash = match PasswordHash::new(&admin.password) {
        Ok(hash) => hash,
        Err(e) => {
            log::error!("Unparseable password hash for admin {}: {}", admin.id, e);
            return Ok(LoginOutcome::BadPassword);
        }
    };

    if get_argon2()
        .verify_password(pass.as_bytes(), &parsed_hash)
        .is_err()
    {
        // Increment failed login attempts
        let mut active_admin: admin_users::ActiveModel = admin.clone().into();
        let new_attempts = admin.failed_login_attempts + 1;
        active_admin.failed_login_attempts = Set(new_attempts);

        // Lock account if max attempts reached
        if new_attempts >= security.max_failed_logins as i32 {
            let lock_until = Utc::now().naive_utc()
                + chrono::Duration::minutes(security.lockout_duration_minutes as i64);
            active_admin.locked_until = Set(Some(lock_until));
            log::warn!(
                "Admin account locked due to {} failed login attempts: admin_id={}",
                new_attempts,
                admin.id
            );
        }

        active_admin.update(db).await?;
        return Ok(LoginOutcome::BadPassword);
    }

    // Reset failed login attempts on successful login
    if admin.failed_login_attempts > 0 || admin.locked_until.is_some() {
        let admin_id = admin.id;
        let mut active_admin: admin_users::ActiveModel = admin.into();
        active_admin.failed_login_attempts = Set(0);
        active_admin.locked_until = Set(None);
        active_admin.update(db).await?;
        return Ok(LoginOutcome::Success(admin_id));
    }

    Ok(LoginOutcome::Success(admin.id))
}

#[derive(Deserialize, Validate)]
struct LoginForm {
    #[validate(length(min = 1, max = 50))]
    username: String,
    #[validate(length(min = 1, max = 1000))]
    password: String,
}

#[derive(Serialize)]
struct AdminView {
    id: i32,
    username: String,
}

#[derive(Serialize)]
struct LoginResponse {
    message: String,
    admin: AdminView,
}

/// POST /api/admin/login
#[post("/api/admin/login")]
async fn post_login(
    cookies: actix_session::Session,
    form: web::Json<LoginForm>,
) -> Result<HttpResponse, Error> {
    form.validate()
        .map_err(|_| error::ErrorBadRequest("Username and password are required"))?;

    let outcome = login(&form.username, &form.password).await.map_err(|e| {
        log::error!("error {:?}", e);
        error::ErrorInternalServerError("Database error")
    })?;

    let admin_id = match outcome {
        LoginOutcome::Success(admin_id) => admin_id,
        LoginOutcome::AccountLocked => {
            log::warn!("Login attempt on locked admin account: {}", form.username);
            return Err(error::ErrorForbidden(
                "Account locked due to too many failed login attempts. Please try again later.",
            ));
        }
        LoginOutcome::BadName | LoginOutcome::BadPassword => {
            log::debug!("login failure: {:?} for {}", outcome, form.username);
            // Use generic message to avoid username enumeration
            return Err(error::ErrorUnauthorized("Invalid username or password."));
        }
    };

    let uuid = session::new_session(get_sess(), admin_id).await.map_err(|e| {
        log::error!("error {:?}", e);
        error::ErrorInternalServerError("Database error")
    })?;

    cookies
        .insert("logged_in", true)
        .map_err(|_| error::ErrorInternalServerError("middleware error"))?;

    cookies
        .insert("token", uuid.to_string())
        .map_err(|_| error::ErrorInternalServerError("middleware error"))?;

    log::info!("Admin logged in: {} (id: {})", form.username, admin_id);

    Ok(HttpResponse::Ok().json(LoginResponse {
        message: "Login successful".to_string(),
        admin: AdminView {
            id: admin_id,
            username: form.username.clone(),
        },
    }))
}

/// POST /api/admin/logout
#[post("/api/admin/logout")]
async fn post_logout(cookies: actix_session::Session) -> Result<HttpResponse, Error> {
    // Remove the session from database and session cache
    match cookies.get::<String>("token") {
        Ok(Some(token)) => match Uuid::parse_str(&token) {
            Ok(uuid) => {
                if let Err(e) = session::remove_session(get_sess(), uuid).await {
                    log::error!("post_logout: remove_session() {}", e);
                }
            }
            Err(e) => {
                log::error!("post_logout: parse_str() {}", e);
            }
        },
        Ok(None) => {
            log::debug!("post_logout: missing token (already logged out?)");
        }
        Err(e) => {
            log::error!("post_logout: cookies.get() {}", e);
        }
    }

    // Remove session cookies
    cookies.remove("logged_in");
    cookies.remove("token");

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Logged out".to_string(),
    }))
}

#[derive(Serialize)]
struct CheckResponse {
    authenticated: bool,
    username: Option<String>,
}

/// GET /api/admin/check - session probe, 200 for everyone
#[get("/api/admin/check")]
async fn get_check(client: ClientCtx) -> Result<HttpResponse, Error> {
    Ok(HttpResponse::Ok().json(CheckResponse {
        authenticated: client.is_admin(),
        username: client.get_admin().map(|a| a.username.clone()),
    }))
}

// ============================================================================
// Dashboard data
// ============================================================================

/// GET /api/admin/stats
#[get("/api/admin/stats")]
async fn get_stats(client: ClientCtx) -> Result<HttpResponse, Error> {
    client.require_admin()?;

    let stats = directory::site_stats(get_db_pool()).await.map_err(|e| {
        log::error!("Failed to compute stats: {}", e);
        error::ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(stats))
}

/// GET /api/admin/channels - every channel regardless of approval
#[get("/api/admin/channels")]
async fn view_all_channels(client: ClientCtx) -> Result<HttpResponse, Error> {
    client.require_admin()?;

    let results = directory::all_channels(get_db_pool()).await.map_err(|e| {
        log::error!("Failed to fetch channels: {}", e);
        error::ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(results))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChannelSummary {
    id: i32,
    name: String,
    url: String,
    description: Option<String>,
    subscriber_count: i32,
    is_approved: bool,
    created_at: chrono::NaiveDateTime,
}

impl From<channels::Model> for ChannelSummary {
    fn from(channel: channels::Model) -> Self {
        Self {
            id: channel.id,
            name: channel.name,
            url: channel.url,
            description: channel.description,
            subscriber_count: channel.subscriber_count,
            is_approved: channel.is_approved,
            created_at: channel.created_at,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReviewWithChannel {
    id: i32,
    channel_id: i32,
    rating: i32,
    comment: Option<String>,
    is_anonymous: bool,
    author_name: Option<String>,
    is_approved: bool,
    created_at: chrono::NaiveDateTime,
    channel: Option<ChannelSummary>,
}

/// GET /api/admin/reviews - every review joined with its channel
#[get("/api/admin/reviews")]
async fn view_all_reviews(client: ClientCtx) -> Result<HttpResponse, Error> {
    client.require_admin()?;

    let db = get_db_pool();

    let rows = reviews::Entity::find()
        .order_by_desc(reviews::Column::CreatedAt)
        .limit(app_config::limits().admin_listing_max as u64)
        .find_also_related(channels::Entity)
        .all(db)
        .await
        .map_err(|e| {
            log::error!("Failed to fetch reviews: {}", e);
            error::ErrorInternalServerError("Database error")
        })?;

    let response: Vec<ReviewWithChannel> = rows
        .into_iter()
        .map(|(review, channel)| ReviewWithChannel {
            id: review.id,
            channel_id: review.channel_id,
            rating: review.rating,
            comment: review.comment,
            is_anonymous: review.is_anonymous,
            author_name: review.author_name,
            is_approved: review.is_approved,
            created_at: review.created_at,
            channel: channel.map(ChannelSummary::from),
        })
        .collect();

    Ok(HttpResponse::Ok().json(response))
}

/// GET /api/admin/tag-suggestions - pending suggestions, newest first
#[get("/api/admin/tag-suggestions")]
async fn view_tag_suggestions(client: ClientCtx) -> Result<HttpResponse, Error> {
    client.require_admin()?;

    let db = get_db_pool();

    let suggestions = tag_suggestions::Entity::find()
        .filter(tag_suggestions::Column::IsApproved.eq(false))
        .order_by_desc(tag_suggestions::Column::CreatedAt)
        .all(db)
        .await
        .map_err(|e| {
            log::error!("Failed to fetch tag suggestions: {}", e);
            error::ErrorInternalServerError("Database error")
        })?;

    let response: Vec<super::tags::SuggestionView> = suggestions
        .into_iter()
        .map(super::tags::SuggestionView::from)
        .collect();

    Ok(HttpResponse::Ok().json(response))
}

// ============================================================================
// Approval state machine
// ============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApprovalForm {
    is_approved: bool,
}

/// PATCH /api/channels/{id}/approval
#[patch("/api/channels/{id}/approval")]
async fn update_channel_approval(
    client: ClientCtx,
    path: web::Path<i32>,
    form: web::Json<ApprovalForm>,
) -> Result<HttpResponse, Error> {
    let admin_id = client.require_admin()?;
    let channel_id = path.into_inner();

    let channel = moderation::set_channel_approval(get_db_pool(), channel_id, form.is_approved)
        .await
        .map_err(|e| {
            log::error!("Failed to update channel approval: {}", e);
            error::ErrorInternalServerError("Failed to update channel approval")
        })?
        .ok_or_else(|| error::ErrorNotFound("Channel not found"))?;

    log::info!(
        "Channel {} {} by admin {}",
        channel.id,
        if form.is_approved { "approved" } else { "rejected" },
        admin_id
    );

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Channel approval updated".to_string(),
    }))
}

/// PATCH /api/reviews/{id}/approval
#[patch("/api/reviews/{id}/approval")]
async fn update_review_approval(
    client: ClientCtx,
    path: web::Path<i32>,
    form: web::Json<ApprovalForm>,
) -> Result<HttpResponse, Error> {
    let admin_id = client.require_admin()?;
    let review_id = path.into_inner();

    let review = moderation::set_review_approval(get_db_pool(), review_id, form.is_approved)
        .await
        .map_err(|e| {
            log::error!("Failed to update review approval: {}", e);
            error::ErrorInternalServerError("Failed to update review approval")
        })?
        .ok_or_else(|| error::ErrorNotFound("Review not found"))?;

    log::info!(
        "Review {} {} by admin {}",
        review.id,
        if form.is_approved { "approved" } else { "rejected" },
        admin_id
    );

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Review approval updated".to_string(),
    }))
}

/// PATCH /api/tags/{id}/approval
#[patch("/api/tags/{id}/approval")]
async fn update_tag_approval(
    client: ClientCtx,
    path: web::Path<i32>,
    form: web::Json<ApprovalForm>,
) -> Result<HttpResponse, Error> {
    let admin_id = client.require_admin()?;
    let tag_id = path.into_inner();

    let tag = moderation::set_tag_approval(get_db_pool(), tag_id, form.is_approved)
        .await
        .map_err(|e| {
            log::error!("Failed to update tag approval: {}", e);
            error::ErrorInternalServerError("Failed to update tag approval")
        })?
        .ok_or_else(|| error::ErrorNotFound("Tag not found"))?;

    log::info!(
        "Tag {} {} by admin {}",
        tag.id,
        if form.is_approved { "approved" } else { "rejected" },
        admin_id
    );

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Tag approval updated".to_string(),
    }))
}

// ============================================================================
// Tag management
// ============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApproveTagForm {
    suggestion_id: i32,
}

#[derive(Serialize)]
struct ApproveTagResponse {
    message: String,
    tag: directory::TagView,
}

/// POST /api/admin/approve-tag - convert a pending suggestion into a tag
#[post("/api/admin/approve-tag")]
async fn approve_tag(
    client: ClientCtx,
    form: web::Json<ApproveTagForm>,
) -> Result<HttpResponse, Error> {
    let admin_id = client.require_admin()?;

    let outcome = moderation::approve_suggestion(get_db_pool(), form.suggestion_id)
        .await
        .map_err(|e| {
            log::error!("Failed to approve tag suggestion: {}", e);
            error::ErrorInternalServerError("Failed to approve tag suggestion")
        })?;

    match outcome {
        SuggestionOutcome::NotFound => Err(error::ErrorNotFound("Tag suggestion not found")),
        SuggestionOutcome::AlreadyApproved => {
            Err(error::ErrorBadRequest("Suggestion is already approved"))
        }
        SuggestionOutcome::Approved(tag) => {
            log::info!(
                "Tag '{}' created from suggestion {} by admin {}",
                tag.name,
                form.suggestion_id,
                admin_id
            );
            Ok(HttpResponse::Ok().json(ApproveTagResponse {
                message: "Tag suggestion approved".to_string(),
                tag: directory::TagView::from(tag),
            }))
        }
    }
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct TagForm {
    #[validate(length(min = 1, max = 50))]
    name: String,
    color: Option<String>,
}

/// POST /api/admin/tags - create a tag directly, born approved
#[post("/api/admin/tags")]
async fn create_tag(client: ClientCtx, form: web::Json<TagForm>) -> Result<HttpResponse, Error> {
    let admin_id = client.require_admin()?;

    form.validate()
        .map_err(|_| error::ErrorBadRequest("Tag name must be 1-50 characters"))?;

    let tag = moderation::create_tag(get_db_pool(), &form.name, form.color.as_deref())
        .await
        .map_err(|e| {
            log::error!("Failed to create tag: {}", e);
            error::ErrorInternalServerError("Failed to create tag")
        })?;

    log::info!("Tag '{}' created by admin {}", tag.name, admin_id);

    Ok(HttpResponse::Created().json(directory::TagView::from(tag)))
}
