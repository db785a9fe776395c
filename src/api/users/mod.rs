//! Account endpoints
//!
//! Every route answers with the `{success, msg?, token?, user?, users?}`
//! envelope. Protected routes check the caller's own roles before touching
//! the store, so a caller lacking the prerequisite role gets 401 whether or
//! not the target exists. Rules that depend on the target's roles run after
//! the target is loaded.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json as JsonResponse, Router,
};
use serde::Deserialize;
use tracing::{debug, info};

use crate::api::middleware::RequireUser;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Envelope, Json};
use crate::domain::user::access;
use crate::domain::user::{Role, User, UserId};
use crate::infrastructure::user::{RegisterUserRequest, UpdateProfileRequest};

type EnvelopeResult = Result<(StatusCode, JsonResponse<Envelope>), ApiError>;

/// Create the account router, mounted under `/users`
pub fn create_users_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/authenticate", post(authenticate))
        .route("/profile", get(own_profile))
        .route("/profile/{id}", get(profile_by_id))
        .route("/profile/edit/{id}", put(edit_profile))
        .route("/profile/{id}/toggleBuy", put(toggle_buy))
        .route("/profile/{id}/editPermissions", put(edit_permissions))
        .route("/show/customers", get(show_customers))
        .route("/show/staff", get(show_staff))
}

#[derive(Debug, Deserialize)]
pub struct RegisterApiRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AuthenticateApiRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Partial profile update; absent fields keep their stored value
#[derive(Debug, Default, Deserialize)]
pub struct EditProfileApiRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EditPermissionsApiRequest {
    #[serde(rename = "hasRoles")]
    pub roles: Vec<String>,
}

fn ok(envelope: Envelope) -> EnvelopeResult {
    Ok((StatusCode::OK, JsonResponse(envelope)))
}

async fn load_user(state: &AppState, id: &UserId) -> Result<User, ApiError> {
    state
        .user_service
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

/// POST /users/register
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterApiRequest>,
) -> EnvelopeResult {
    debug!(email = %request.email, "Registering user");

    let user = state
        .user_service
        .register(RegisterUserRequest {
            name: request.name,
            email: request.email,
            password: request.password,
            address: request.address,
        })
        .await?;

    info!(user_id = %user.id(), "User registered");

    Ok((
        StatusCode::CREATED,
        JsonResponse(Envelope::ok().with_msg("User registered")),
    ))
}

/// POST /users/authenticate
///
/// Unknown email and wrong password get the same answer and no token.
pub async fn authenticate(
    State(state): State<AppState>,
    Json(request): Json<AuthenticateApiRequest>,
) -> EnvelopeResult {
    debug!(email = %request.email, "Authenticating user");

    let Some(user) = state
        .user_service
        .authenticate(&request.email, &request.password)
        .await?
    else {
        debug!(email = %request.email, "Authentication failed");
        return Err(ApiError::new(
            StatusCode::UNAUTHORIZED,
            "User or password incorrect.",
        ));
    };

    let token = state.jwt_service.generate(&user)?;

    info!(
        user_id = %user.id(),
        expires_in_secs = state.jwt_service.expires_in_secs(),
        "Token issued"
    );

    ok(Envelope::ok().with_token(format!("JWT {}", token)))
}

/// GET /users/profile
pub async fn own_profile(
    State(state): State<AppState>,
    RequireUser(caller): RequireUser,
) -> EnvelopeResult {
    debug!(user_id = %caller.id, "Reading own profile");

    let user = load_user(&state, &caller.id).await?;

    ok(Envelope::ok().with_user(&user))
}

/// GET /users/profile/{id}
pub async fn profile_by_id(
    State(state): State<AppState>,
    RequireUser(caller): RequireUser,
    Path(id): Path<String>,
) -> EnvelopeResult {
    debug!(caller_id = %caller.id, target_id = %id, "Reading profile");

    let target_id = UserId::parse(&id)?;

    if !caller.is(&target_id) && !access::may_view_other_profiles(&caller) {
        return Err(ApiError::unauthorized());
    }

    let target = load_user(&state, &target_id).await?;

    if !access::can_view_profile(&caller, &target) {
        return Err(ApiError::unauthorized());
    }

    ok(Envelope::ok().with_user(&target))
}

/// PUT /users/profile/edit/{id}
pub async fn edit_profile(
    State(state): State<AppState>,
    RequireUser(caller): RequireUser,
    Path(id): Path<String>,
    Json(request): Json<EditProfileApiRequest>,
) -> EnvelopeResult {
    debug!(caller_id = %caller.id, target_id = %id, "Editing profile");

    let target_id = UserId::parse(&id)?;

    if !access::can_edit_profile(&caller, &target_id) {
        return Err(ApiError::unauthorized());
    }

    let user = load_user(&state, &target_id).await?;

    let updated = state
        .user_service
        .update_profile(
            user,
            UpdateProfileRequest {
                name: request.name,
                email: request.email,
                address: request.address,
            },
        )
        .await?;

    ok(Envelope::ok().with_user(&updated))
}

/// PUT /users/profile/{id}/toggleBuy
pub async fn toggle_buy(
    State(state): State<AppState>,
    RequireUser(caller): RequireUser,
    Path(id): Path<String>,
) -> EnvelopeResult {
    debug!(caller_id = %caller.id, target_id = %id, "Toggling buy approval");

    let target_id = UserId::parse(&id)?;

    if !caller.has_role(Role::Staff) {
        return Err(ApiError::unauthorized());
    }

    let target = load_user(&state, &target_id).await?;

    if !access::can_toggle_buy(&caller, &target) {
        return Err(ApiError::unauthorized());
    }

    let updated = state.user_service.toggle_buy(target).await?;

    info!(
        caller_id = %caller.id,
        target_id = %updated.id(),
        approved = !updated.has_role(Role::NotApproved),
        "Buy approval toggled"
    );

    ok(Envelope::ok().with_user(&updated))
}

/// PUT /users/profile/{id}/editPermissions
///
/// Request strings that are not known roles are ignored; known roles
/// outside `canBuy`/`canMessage` never change.
pub async fn edit_permissions(
    State(state): State<AppState>,
    RequireUser(caller): RequireUser,
    Path(id): Path<String>,
    Json(request): Json<EditPermissionsApiRequest>,
) -> EnvelopeResult {
    debug!(caller_id = %caller.id, target_id = %id, requested = ?request.roles, "Editing permissions");

    let target_id = UserId::parse(&id)?;

    if !caller.has_role(Role::Management) {
        return Err(ApiError::unauthorized());
    }

    let target = load_user(&state, &target_id).await?;

    if !access::can_edit_permissions(&caller, &target) {
        return Err(ApiError::unauthorized());
    }

    let requested: Vec<Role> = request
        .roles
        .iter()
        .filter_map(|tag| tag.parse().ok())
        .collect();

    let updated = state
        .user_service
        .edit_permissions(target, requested)
        .await?;

    info!(
        caller_id = %caller.id,
        target_id = %updated.id(),
        roles = ?updated.roles(),
        "Permissions edited"
    );

    ok(Envelope::ok().with_user(&updated))
}

/// GET /users/show/customers
pub async fn show_customers(
    State(state): State<AppState>,
    RequireUser(caller): RequireUser,
) -> EnvelopeResult {
    debug!(caller_id = %caller.id, "Listing customers");

    if !access::can_list_customers(&caller) {
        return Err(ApiError::unauthorized());
    }

    let users = state.user_service.list_by_role(Role::Customer).await?;

    ok(Envelope::ok().with_users(&users))
}

/// GET /users/show/staff
pub async fn show_staff(
    State(state): State<AppState>,
    RequireUser(caller): RequireUser,
) -> EnvelopeResult {
    debug!(caller_id = %caller.id, "Listing staff");

    if !access::can_list_staff(&caller) {
        return Err(ApiError::unauthorized());
    }

    let users = state.user_service.list_by_role(Role::Staff).await?;

    ok(Envelope::ok().with_users(&users))
}
