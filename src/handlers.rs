use actix_web::{delete, get, http::header, post, put, web, HttpRequest, HttpResponse, Responder};
use validator::Validate;

use crate::clients::identity::bearer_token;
use crate::error::RepositoryError;
use crate::models::{
    ApiResponse, Business, BusinessListParams, CreateBusinessRequest, CreateUserRequest,
    StatusChangeRequest, UpdateBusinessRequest, UpdateUserRequest, User, UserListParams,
    UserStatus, UserType,
};
use crate::query::annotate_distance;
use crate::state::AppState;

/// Registers every endpoint under `/api/v1`
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            // Health
            .service(health_check)
            // Identity
            .service(current_profile)
            // Businesses
            .service(list_businesses)
            .service(create_business)
            .service(get_business)
            .service(update_business)
            .service(delete_business)
            .service(change_business_status)
            // Users
            .service(list_users)
            .service(create_user)
            .service(get_user)
            .service(update_user)
            .service(delete_user),
    );
}

// ============================================================================
// IDENTITY
// ============================================================================

/// Resolves the caller's profile from the bearer token
async fn authenticate(req: &HttpRequest, state: &AppState) -> Result<User, HttpResponse> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(bearer_token)
        .ok_or_else(|| {
            HttpResponse::Unauthorized()
                .json(ApiResponse::<()>::error("Missing bearer token".into()))
        })?;

    let principal = match state.identity.resolve(token).await {
        Ok(Some(principal)) => principal,
        Ok(None) => {
            return Err(HttpResponse::Unauthorized()
                .json(ApiResponse::<()>::error("Invalid or expired token".into())))
        }
        Err(err) => {
            log::error!("Identity provider failed: {err}");
            return Err(HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Failed to resolve identity".into())));
        }
    };

    let profile = state.users.get(&principal.id).await.ok_or_else(|| {
        HttpResponse::Unauthorized().json(ApiResponse::<()>::error("Profile not found".into()))
    })?;

    if profile.status == UserStatus::Inactive {
        return Err(HttpResponse::Forbidden()
            .json(ApiResponse::<()>::error("Account is inactive".into())));
    }

    log::debug!(
        "Authenticated {} as {}",
        profile.full_name(),
        profile.user_type.as_str()
    );
    Ok(profile)
}

fn require(allowed: bool) -> Result<(), HttpResponse> {
    if allowed {
        Ok(())
    } else {
        Err(HttpResponse::Forbidden()
            .json(ApiResponse::<()>::error("Insufficient permissions".into())))
    }
}

fn write_failure(err: &RepositoryError, not_found: &str, failed: &str) -> HttpResponse {
    match err {
        RepositoryError::NotFound { .. } => {
            HttpResponse::NotFound().json(ApiResponse::<()>::error(not_found.into()))
        }
        RepositoryError::Failed { .. } => {
            HttpResponse::InternalServerError().json(ApiResponse::<()>::error(failed.into()))
        }
    }
}

macro_rules! try_response {
    ($expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(response) => return response,
        }
    };
}

// ============================================================================
// HEALTH CHECK
// ============================================================================

#[get("/health")]
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "local-business-directory",
        "store": state.backend,
        "timestamp": chrono::Utc::now()
    }))
}

#[get("/me")]
pub async fn current_profile(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let profile = try_response!(authenticate(&req, &state).await);
    HttpResponse::Ok().json(ApiResponse::success(profile))
}

// ============================================================================
// BUSINESSES
// ============================================================================

#[get("/businesses")]
pub async fn list_businesses(
    state: web::Data<AppState>,
    params: web::Query<BusinessListParams>,
) -> impl Responder {
    let params = params.into_inner();
    if let Err(e) = params.validate() {
        return HttpResponse::BadRequest()
            .json(ApiResponse::<()>::error(format!("Validation failed: {}", e)));
    }

    let mut businesses = state.businesses.list(&params.filter()).await;
    if let Some(origin) = params.origin() {
        annotate_distance(&mut businesses, origin);
    }

    HttpResponse::Ok().json(ApiResponse::success(businesses))
}

#[get("/businesses/{business_id}")]
pub async fn get_business(
    state: web::Data<AppState>,
    business_id: web::Path<String>,
) -> impl Responder {
    let business_id = business_id.into_inner();
    match state.businesses.get(&business_id).await {
        Some(business) => HttpResponse::Ok().json(ApiResponse::success(business)),
        None => HttpResponse::NotFound().json(ApiResponse::<()>::error("Business not found".into())),
    }
}

#[post("/businesses")]
pub async fn create_business(
    req: HttpRequest,
    state: web::Data<AppState>,
    payload: web::Json<CreateBusinessRequest>,
) -> HttpResponse {
    let actor = try_response!(authenticate(&req, &state).await);
    try_response!(require(actor.user_type.manages_listings()));

    let body = payload.into_inner();
    if let Err(e) = body.validate() {
        return HttpResponse::BadRequest()
            .json(ApiResponse::<()>::error(format!("Validation failed: {}", e)));
    }

    let mut new_business = body.into_new_business();
    if actor.user_type != UserType::Admin {
        // Owner submissions always enter moderation
        new_business.status = None;
    }

    match state.businesses.add(new_business).await {
        Ok(business) => HttpResponse::Created().json(ApiResponse::success(business)),
        Err(err) => write_failure(&err, "Business not found", "Failed to create business"),
    }
}

#[put("/businesses/{business_id}")]
pub async fn update_business(
    req: HttpRequest,
    state: web::Data<AppState>,
    business_id: web::Path<String>,
    payload: web::Json<UpdateBusinessRequest>,
) -> HttpResponse {
    let actor = try_response!(authenticate(&req, &state).await);
    try_response!(require(actor.user_type.manages_listings()));

    let business_id = business_id.into_inner();
    let body = payload.into_inner();

    if let Err(e) = body.validate() {
        return HttpResponse::BadRequest()
            .json(ApiResponse::<()>::error(format!("Validation failed: {}", e)));
    }

    let mut existing_business: Business = match state.businesses.get(&business_id).await {
        Some(business) => business,
        None => {
            return HttpResponse::NotFound()
                .json(ApiResponse::<()>::error("Business not found".into()));
        }
    };

    body.apply_to_existing(&mut existing_business, actor.user_type == UserType::Admin);

    match state.businesses.update(&existing_business).await {
        Ok(updated) => HttpResponse::Ok().json(ApiResponse::success(updated)),
        Err(err) => write_failure(&err, "Business not found", "Failed to update business"),
    }
}

#[delete("/businesses/{business_id}")]
pub async fn delete_business(
    req: HttpRequest,
    state: web::Data<AppState>,
    business_id: web::Path<String>,
) -> HttpResponse {
    let actor = try_response!(authenticate(&req, &state).await);
    try_response!(require(actor.user_type.manages_listings()));

    let business_id = business_id.into_inner();
    if state.businesses.get(&business_id).await.is_none() {
        return HttpResponse::NotFound().json(ApiResponse::<()>::error("Business not found".into()));
    }

    if state.businesses.delete(&business_id).await {
        HttpResponse::NoContent().finish()
    } else {
        HttpResponse::InternalServerError()
            .json(ApiResponse::<()>::error("Failed to delete business".into()))
    }
}

#[post("/businesses/{business_id}/status")]
pub async fn change_business_status(
    req: HttpRequest,
    state: web::Data<AppState>,
    business_id: web::Path<String>,
    payload: web::Json<StatusChangeRequest>,
) -> HttpResponse {
    let actor = try_response!(authenticate(&req, &state).await);
    try_response!(require(actor.user_type == UserType::Admin));

    let business_id = business_id.into_inner();
    let StatusChangeRequest { status } = payload.into_inner();

    match state.businesses.set_status(&business_id, status).await {
        Ok(business) => {
            log::info!(
                "Business {} moved to {} by {}",
                business.id,
                status.as_str(),
                actor.id
            );
            HttpResponse::Ok().json(ApiResponse::success(business))
        }
        Err(err) => write_failure(&err, "Business not found", "Failed to update business status"),
    }
}

// ============================================================================
// USERS
// ============================================================================

#[get("/users")]
pub async fn list_users(
    req: HttpRequest,
    state: web::Data<AppState>,
    params: web::Query<UserListParams>,
) -> HttpResponse {
    let actor = try_response!(authenticate(&req, &state).await);
    try_response!(require(actor.user_type == UserType::Admin));

    let users = state.users.list(&params.filter()).await;
    HttpResponse::Ok().json(ApiResponse::success(users))
}

#[get("/users/{user_id}")]
pub async fn get_user(
    req: HttpRequest,
    state: web::Data<AppState>,
    user_id: web::Path<String>,
) -> HttpResponse {
    let actor = try_response!(authenticate(&req, &state).await);
    try_response!(require(actor.user_type == UserType::Admin));

    match state.users.get(&user_id.into_inner()).await {
        Some(user) => HttpResponse::Ok().json(ApiResponse::success(user)),
        None => HttpResponse::NotFound().json(ApiResponse::<()>::error("User not found".into())),
    }
}

#[post("/users")]
pub async fn create_user(
    req: HttpRequest,
    state: web::Data<AppState>,
    payload: web::Json<CreateUserRequest>,
) -> HttpResponse {
    let actor = try_response!(authenticate(&req, &state).await);
    try_response!(require(actor.user_type == UserType::Admin));

    let body = payload.into_inner();
    if let Err(e) = body.validate() {
        return HttpResponse::BadRequest()
            .json(ApiResponse::<()>::error(format!("Validation failed: {}", e)));
    }

    match state.users.add(body.into_new_user()).await {
        Ok(user) => HttpResponse::Created().json(ApiResponse::success(user)),
        Err(err) => write_failure(&err, "User not found", "Failed to create user"),
    }
}

#[put("/users/{user_id}")]
pub async fn update_user(
    req: HttpRequest,
    state: web::Data<AppState>,
    user_id: web::Path<String>,
    payload: web::Json<UpdateUserRequest>,
) -> HttpResponse {
    let actor = try_response!(authenticate(&req, &state).await);
    try_response!(require(actor.user_type == UserType::Admin));

    let body = payload.into_inner();
    if let Err(e) = body.validate() {
        return HttpResponse::BadRequest()
            .json(ApiResponse::<()>::error(format!("Validation failed: {}", e)));
    }

    let mut existing_user = match state.users.get(&user_id.into_inner()).await {
        Some(user) => user,
        None => {
            return HttpResponse::NotFound().json(ApiResponse::<()>::error("User not found".into()));
        }
    };

    body.apply_to_existing(&mut existing_user);

    match state.users.update(&existing_user).await {
        Ok(updated) => HttpResponse::Ok().json(ApiResponse::success(updated)),
        Err(err) => write_failure(&err, "User not found", "Failed to update user"),
    }
}

#[delete("/users/{user_id}")]
pub async fn delete_user(
    req: HttpRequest,
    state: web::Data<AppState>,
    user_id: web::Path<String>,
) -> HttpResponse {
    let actor = try_response!(authenticate(&req, &state).await);
    try_response!(require(actor.user_type == UserType::Admin));

    let user_id = user_id.into_inner();
    if user_id == actor.id {
        return HttpResponse::BadRequest()
            .json(ApiResponse::<()>::error("Administrators cannot delete their own profile".into()));
    }
    if state.users.get(&user_id).await.is_none() {
        return HttpResponse::NotFound().json(ApiResponse::<()>::error("User not found".into()));
    }

    if state.users.delete(&user_id).await {
        HttpResponse::NoContent().finish()
    } else {
        HttpResponse::InternalServerError()
            .json(ApiResponse::<()>::error("Failed to delete user".into()))
    }
}
