use axum::{Json, extract::State};

use crate::{
    AppState,
    api::models::{
        auth::{AuthResponse, ChangePasswordRequest, LoginRequest, LoginResponse, LogoutResponse, RegisterRequest, RegisterResponse},
        users::{CurrentUser, UserResponse},
    },
    auth::{password, session},
    db::{
        handlers::{Repository, Users},
        models::users::{UserCreateDBRequest, UserUpdateDBRequest},
    },
    errors::Error,
};

/// Build the Set-Cookie value carrying the session token
fn create_session_cookie(token: &str, config: &crate::config::Config) -> String {
    let session = &config.auth.session;
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        session.cookie_name,
        token,
        session.expiry.as_secs()
    );
    if session.secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Build the Set-Cookie value that clears the session
fn clear_session_cookie(config: &crate::config::Config) -> String {
    let session = &config.auth.session;
    let mut cookie = format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", session.cookie_name);
    if session.secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Register a new user account
#[utoipa::path(
    post,
    path = "/authentication/register",
    request_body = RegisterRequest,
    tag = "authentication",
    responses(
        (status = 201, description = "User registered successfully", body = AuthResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "User already exists"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register(State(state): State<AppState>, Json(request): Json<RegisterRequest>) -> Result<RegisterResponse, Error> {
    // Check if registration is allowed
    if !state.config.auth.allow_registration.0 {
        return Err(Error::BadRequest {
            message: "User registration is disabled".to_string(),
        });
    }

    // Validate password length
    let password_config = &state.config.auth.password;
    if request.password.len() < password_config.min_length {
        return Err(Error::Validation {
            field: "password".to_string(),
            message: format!("Password must be at least {} characters", password_config.min_length),
        });
    }
    if request.password.len() > password_config.max_length {
        return Err(Error::Validation {
            field: "password".to_string(),
            message: format!("Password must be no more than {} characters", password_config.max_length),
        });
    }

    // Hash the password on a blocking thread to avoid blocking the async runtime
    let password = request.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || password::hash_string(&password))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })??;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut conn);

    // The unique indexes on email and username turn a duplicate registration
    // into a Conflict response
    let created_user = user_repo
        .create(&UserCreateDBRequest {
            email: request.email,
            username: request.username,
            first_name: request.first_name,
            last_name: request.last_name,
            is_admin: false,
            password_hash: Some(password_hash),
        })
        .await?;

    let current_user = CurrentUser::from(created_user.clone());
    let token = session::create_session_token(&current_user, &state.config)?;
    let cookie = create_session_cookie(&token, &state.config);

    Ok(RegisterResponse {
        auth_response: AuthResponse {
            user: UserResponse::from(created_user),
            message: "Registration successful".to_string(),
        },
        cookie,
    })
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/authentication/login",
    request_body = LoginRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<LoginResponse, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut conn);

    let invalid_credentials = || Error::Unauthenticated {
        message: Some("Invalid email or password".to_string()),
    };

    let user = user_repo.get_user_by_email(&request.email).await?.ok_or_else(invalid_credentials)?;
    let password_hash = user.password_hash.clone().ok_or_else(invalid_credentials)?;

    // Verify on a blocking thread; argon2 is deliberately expensive
    let password = request.password.clone();
    let verified = tokio::task::spawn_blocking(move || password::verify_string(&password, &password_hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })??;

    if !verified {
        return Err(invalid_credentials());
    }

    let current_user = CurrentUser::from(user.clone());
    let token = session::create_session_token(&current_user, &state.config)?;
    let cookie = create_session_cookie(&token, &state.config);

    Ok(LoginResponse {
        auth_response: AuthResponse {
            user: UserResponse::from(user),
            message: "Login successful".to_string(),
        },
        cookie,
    })
}

/// Logout and clear the session cookie
#[utoipa::path(
    post,
    path = "/authentication/logout",
    tag = "authentication",
    responses(
        (status = 200, description = "Logged out"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>) -> LogoutResponse {
    LogoutResponse {
        cookie: clear_session_cookie(&state.config),
    }
}

/// Change the current user's password
#[utoipa::path(
    post,
    path = "/authentication/password-change",
    request_body = ChangePasswordRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Password changed"),
        (status = 401, description = "Current password incorrect"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn change_password(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<serde_json::Value>, Error> {
    let password_config = &state.config.auth.password;
    if request.new_password.len() < password_config.min_length {
        return Err(Error::Validation {
            field: "new_password".to_string(),
            message: format!("Password must be at least {} characters", password_config.min_length),
        });
    }
    if request.new_password.len() > password_config.max_length {
        return Err(Error::Validation {
            field: "new_password".to_string(),
            message: format!("Password must be no more than {} characters", password_config.max_length),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut conn);

    let stored = user_repo.get_by_id(user.id).await?.ok_or_else(|| Error::NotFound {
        resource: "User".to_string(),
        id: user.id.to_string(),
    })?;
    let password_hash = stored.password_hash.ok_or_else(|| Error::Unauthenticated {
        message: Some("Account has no password set".to_string()),
    })?;

    let current = request.current_password.clone();
    let verified = tokio::task::spawn_blocking(move || password::verify_string(&current, &password_hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })??;
    if !verified {
        return Err(Error::Unauthenticated {
            message: Some("Current password is incorrect".to_string()),
        });
    }

    let new_password = request.new_password.clone();
    let new_hash = tokio::task::spawn_blocking(move || password::hash_string(&new_password))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })??;

    user_repo
        .update(
            user.id,
            &UserUpdateDBRequest {
                password_hash: Some(new_hash),
                ..Default::default()
            },
        )
        .await?;

    Ok(Json(serde_json::json!({ "message": "Password changed" })))
}
