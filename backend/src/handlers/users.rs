use axum::extract::{Extension, State};
use axum::Json;

use crate::{
    error::AppError,
    extract::{ApiJson, ApiPath},
    models::{
        password_reset::{
            ForgotPasswordRequest, ResetPasswordRequest, VerifyOtpRequest, VerifyOtpResponse,
        },
        user::{
            ChangePasswordRequest, ChangeRoleRequest, Identity, NewUser, SigninRequest,
            SigninResponse, SignupRequest, UpdateProfileRequest, UserResponse, UserRole,
        },
    },
    repositories::CreateUserError,
    response::{message, success, ApiResponse},
    state::AppState,
    types::UserId,
    utils::password::{hash_password_blocking, verify_password_blocking},
    validation::{require_present, Validate},
};

type HandlerResult<T> = Result<Json<ApiResponse<T>>, AppError>;

fn user_not_found() -> AppError {
    AppError::NotFound("User not found".to_string())
}

pub async fn signin(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SigninRequest>,
) -> HandlerResult<SigninResponse> {
    require_present(
        &[&payload.email, &payload.password],
        "Email and password are required",
    )?;

    let user = state
        .users
        .find_by_email(payload.email.trim())
        .await?
        .ok_or_else(|| AppError::NotFound("Invalid email".to_string()))?;

    if !user.is_active {
        return Err(AppError::Validation(
            "Account is deactivated. Please contact support.".to_string(),
        ));
    }

    let matches = verify_password_blocking(payload.password, user.password.clone()).await?;
    if !matches {
        return Err(AppError::Validation("Invalid password".to_string()));
    }

    let token = state.tokens.issue(&user.identity())?;
    tracing::info!(user_id = %user.user_id, "user signed in");

    Ok(success(SigninResponse {
        user: UserResponse::from(user),
        token,
    }))
}

pub async fn signup(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SignupRequest>,
) -> HandlerResult<UserResponse> {
    require_present(
        &[
            &payload.name,
            &payload.email,
            &payload.phone,
            &payload.password,
        ],
        "All fields are required",
    )?;
    payload.validate()?;

    let password_hash = hash_password_blocking(payload.password).await?;
    let new_user = NewUser {
        name: payload.name.trim().to_string(),
        email: payload.email.trim().to_string(),
        phone: payload.phone.trim().to_string(),
        password_hash,
        role: UserRole::Customer,
        is_active: true,
    };

    let user = state.users.create(new_user).await.map_err(|err| match err {
        CreateUserError::DuplicateEmail => AppError::Conflict("Email already exists".to_string()),
        CreateUserError::Other(err) => AppError::Internal(err),
    })?;
    tracing::info!(user_id = %user.user_id, "user registered");

    Ok(success(UserResponse::from(user)))
}

pub async fn forgot_password(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ForgotPasswordRequest>,
) -> HandlerResult<String> {
    state.password_resets.request_otp(&payload.email).await?;
    Ok(message("OTP sent successfully to your email"))
}

pub async fn verify_otp(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<VerifyOtpRequest>,
) -> HandlerResult<VerifyOtpResponse> {
    let reset_token = state
        .password_resets
        .verify_otp(&payload.email, &payload.otp)
        .await?;
    Ok(success(VerifyOtpResponse {
        message: "OTP verified successfully".to_string(),
        reset_token,
    }))
}

pub async fn reset_password(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ResetPasswordRequest>,
) -> HandlerResult<String> {
    state
        .password_resets
        .reset_password(&payload.reset_token, &payload.new_password)
        .await?;
    Ok(message("Password reset successfully"))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(payload): ApiJson<ChangePasswordRequest>,
) -> HandlerResult<String> {
    require_present(
        &[&payload.current_password, &payload.new_password],
        "Current password and new password are required",
    )?;
    payload.validate()?;

    let user = state
        .users
        .find_by_id(identity.id)
        .await?
        .ok_or_else(user_not_found)?;

    let matches =
        verify_password_blocking(payload.current_password, user.password.clone()).await?;
    if !matches {
        return Err(AppError::Validation(
            "Current password is incorrect".to_string(),
        ));
    }

    let password_hash = hash_password_blocking(payload.new_password).await?;
    if !state
        .users
        .update_password(user.user_id, &password_hash)
        .await?
    {
        return Err(user_not_found());
    }
    tracing::info!(user_id = %user.user_id, "password changed");

    Ok(message("Password updated successfully"))
}

pub async fn get_user(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<UserId>,
) -> HandlerResult<UserResponse> {
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(user_not_found)?;
    Ok(success(UserResponse::from(user)))
}

pub async fn get_user_by_email(
    State(state): State<AppState>,
    ApiPath(email): ApiPath<String>,
) -> HandlerResult<UserResponse> {
    let user = state
        .users
        .find_by_email(email.trim())
        .await?
        .ok_or_else(user_not_found)?;
    Ok(success(UserResponse::from(user)))
}

pub async fn list_customers(State(state): State<AppState>) -> HandlerResult<Vec<UserResponse>> {
    let users = state.users.list_by_role(UserRole::Customer).await?;
    Ok(success(users.into_iter().map(UserResponse::from).collect()))
}

pub async fn list_users(State(state): State<AppState>) -> HandlerResult<Vec<UserResponse>> {
    let users = state.users.list_all().await?;
    Ok(success(users.into_iter().map(UserResponse::from).collect()))
}

pub async fn update_profile(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<UserId>,
    ApiJson(payload): ApiJson<UpdateProfileRequest>,
) -> HandlerResult<UserResponse> {
    require_present(&[&payload.name, &payload.phone], "Name and phone are required")?;

    let user = state
        .users
        .update_profile(user_id, payload.name.trim(), payload.phone.trim())
        .await?
        .ok_or_else(user_not_found)?;
    Ok(success(UserResponse::from(user)))
}

pub async fn activate_user(
    State(state): State<AppState>,
    ApiPath(email): ApiPath<String>,
) -> HandlerResult<String> {
    set_active(&state, &email, true).await?;
    Ok(message("User activated successfully"))
}

pub async fn deactivate_user(
    State(state): State<AppState>,
    ApiPath(email): ApiPath<String>,
) -> HandlerResult<String> {
    set_active(&state, &email, false).await?;
    Ok(message("User deactivated successfully"))
}

async fn set_active(state: &AppState, email: &str, active: bool) -> Result<(), AppError> {
    if !state.users.set_active_by_email(email.trim(), active).await? {
        return Err(user_not_found());
    }
    tracing::info!(active, "user activation changed");
    Ok(())
}

pub async fn change_role(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<UserId>,
    ApiJson(payload): ApiJson<ChangeRoleRequest>,
) -> HandlerResult<String> {
    let role: UserRole = payload.role.trim().parse().map_err(|_| {
        AppError::Validation("Invalid role. Must be ADMIN or CUSTOMER".to_string())
    })?;

    if !state.users.set_role(user_id, role).await? {
        return Err(user_not_found());
    }
    tracing::info!(user_id = %user_id, role = role.as_str(), "user role changed");

    Ok(message("User role updated successfully"))
}
