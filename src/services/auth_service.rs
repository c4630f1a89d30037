use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use password_hash::rand_core::{OsRng, RngCore};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    sea_query::Expr,
};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    audit,
    config::AppConfig,
    dto::auth::{
        Claims, LoginResponse, RefreshRequest, RequestOtpRequest, RequestOtpResponse, TokenKind,
        TokenPair, VerifyOtpRequest,
    },
    entity::{
        otp_codes::{ActiveModel as OtpActive, Column as OtpCol, Entity as OtpCodes},
        users::{self, ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    models::{User, UserRole, UserType},
    response::{ApiResponse, Meta},
    state::AppState,
};

const INVALID_OTP: &str = "Invalid OTP. Please try again.";
const EXPIRED_OTP: &str = "OTP has expired. Please request a new one.";

pub fn generate_otp(length: usize) -> String {
    let mut rng = OsRng;
    (0..length.max(1))
        .map(|_| char::from(b'0' + (rng.next_u32() % 10) as u8))
        .collect()
}

pub fn hash_otp(otp: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(otp.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(AppError::internal)
}

pub fn verify_otp_hash(otp: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(otp.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

fn normalize_email(email: &str) -> AppResult<String> {
    let email = email.trim().to_lowercase();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid {
        return Err(AppError::BadRequest("A valid email is required".into()));
    }
    Ok(email)
}

pub fn issue_token(
    config: &AppConfig,
    user: &users::Model,
    kind: TokenKind,
) -> AppResult<String> {
    let ttl = match kind {
        TokenKind::Access => Duration::minutes(config.access_token_expire_minutes),
        TokenKind::Refresh => Duration::days(config.refresh_token_expire_days),
    };
    let expiration = Utc::now()
        .checked_add_signed(ttl)
        .ok_or_else(|| AppError::internal("Failed to set expiration"))?;

    let claims = Claims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        role: user.role.clone(),
        kind,
        exp: expiration.timestamp() as usize,
    };

    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )?)
}

/// Decodes `token` and checks it is of the expected kind.
pub fn decode_token(secret: &str, token: &str, expected: TokenKind) -> AppResult<Claims> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    if decoded.claims.kind != expected {
        return Err(AppError::Unauthorized("Invalid token type".into()));
    }
    Ok(decoded.claims)
}

pub fn issue_token_pair(config: &AppConfig, user: &users::Model) -> AppResult<TokenPair> {
    Ok(TokenPair {
        access_token: issue_token(config, user, TokenKind::Access)?,
        refresh_token: issue_token(config, user, TokenKind::Refresh)?,
        token_type: "bearer".to_string(),
        expires_in: config.access_token_expire_minutes * 60,
    })
}

pub async fn request_otp(
    state: &AppState,
    payload: RequestOtpRequest,
) -> AppResult<ApiResponse<RequestOtpResponse>> {
    let email = normalize_email(&payload.email)?;

    let user = match Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?
    {
        Some(user) => user,
        None => {
            let user = UserActive {
                id: Set(Uuid::new_v4()),
                email: Set(email.clone()),
                phone: Set(None),
                full_name: Set(None),
                business_name: Set(None),
                gst_number: Set(None),
                user_type: Set(UserType::default().as_str().to_string()),
                role: Set(UserRole::Customer.as_str().to_string()),
                is_active: Set(true),
                is_verified: Set(false),
                created_at: NotSet,
                updated_at: NotSet,
            }
            .insert(&state.orm)
            .await?;
            tracing::info!(user_id = %user.id, "created user on first OTP request");
            user
        }
    };

    if !user.is_active {
        return Err(AppError::Forbidden("User account is deactivated".into()));
    }

    OtpCodes::update_many()
        .col_expr(OtpCol::IsUsed, Expr::value(true))
        .filter(OtpCol::Email.eq(email.as_str()))
        .filter(OtpCol::IsUsed.eq(false))
        .exec(&state.orm)
        .await?;

    let otp = generate_otp(state.config.otp_length);
    let expires_at = Utc::now() + Duration::minutes(state.config.otp_expire_minutes);

    OtpActive {
        id: Set(Uuid::new_v4()),
        email: Set(email.clone()),
        user_id: Set(Some(user.id)),
        otp_hash: Set(hash_otp(&otp)?),
        expires_at: Set(expires_at.into()),
        is_used: Set(false),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    // No mail transport is wired in; the code is delivered through the log.
    tracing::info!(%email, %otp, "login code issued");

    audit::record(
        &state.pool,
        Some(user.id),
        "otp_requested",
        "otp_codes",
        serde_json::json!({ "email": email }),
    )
    .await;

    Ok(ApiResponse::success(
        "OTP sent successfully",
        RequestOtpResponse {
            email,
            expires_in_minutes: state.config.otp_expire_minutes,
        },
        Some(Meta::empty()),
    ))
}

pub async fn verify_otp(
    state: &AppState,
    payload: VerifyOtpRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let email = normalize_email(&payload.email)?;

    let code = OtpCodes::find()
        .filter(OtpCol::Email.eq(email.as_str()))
        .filter(OtpCol::IsUsed.eq(false))
        .order_by_desc(OtpCol::CreatedAt)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::BadRequest(INVALID_OTP.into()))?;

    if code.expires_at.with_timezone(&Utc) < Utc::now() {
        let mut active: OtpActive = code.into();
        active.is_used = Set(true);
        active.update(&state.orm).await?;
        return Err(AppError::BadRequest(EXPIRED_OTP.into()));
    }

    if !verify_otp_hash(payload.otp.trim(), &code.otp_hash) {
        return Err(AppError::BadRequest(INVALID_OTP.into()));
    }

    let mut active: OtpActive = code.into();
    active.is_used = Set(true);
    active.update(&state.orm).await?;

    let user = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    let user = if user.is_verified {
        user
    } else {
        let mut active: UserActive = user.into();
        active.is_verified = Set(true);
        active.updated_at = Set(Utc::now().into());
        active.update(&state.orm).await?
    };

    let tokens = issue_token_pair(&state.config, &user)?;

    audit::record(
        &state.pool,
        Some(user.id),
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Login successful",
        LoginResponse {
            tokens,
            user: User::from(user),
        },
        Some(Meta::empty()),
    ))
}

pub async fn refresh_tokens(
    state: &AppState,
    payload: RefreshRequest,
) -> AppResult<ApiResponse<TokenPair>> {
    let claims = decode_token(
        &state.config.jwt_secret,
        &payload.refresh_token,
        TokenKind::Refresh,
    )?;
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Unauthorized("Invalid user id in token".into()))?;

    let user = Users::find_by_id(user_id)
        .one(&state.orm)
        .await?
        .filter(|user| user.is_active)
        .ok_or_else(|| AppError::Unauthorized("User not found or inactive".into()))?;

    let tokens = issue_token_pair(&state.config, &user)?;
    Ok(ApiResponse::success("Token refreshed", tokens, Some(Meta::empty())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user() -> users::Model {
        users::Model {
            id: Uuid::new_v4(),
            email: "buyer@pranjay.test".into(),
            phone: None,
            full_name: None,
            business_name: None,
            gst_number: None,
            user_type: "B2B".into(),
            role: "customer".into(),
            is_active: true,
            is_verified: true,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[test]
    fn otp_has_requested_length_and_digits_only() {
        let otp = generate_otp(6);
        assert_eq!(otp.len(), 6);
        assert!(otp.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn otp_hash_verifies_only_the_issued_code() {
        let hash = hash_otp("123456").unwrap();
        assert!(verify_otp_hash("123456", &hash));
        assert!(!verify_otp_hash("654321", &hash));
        assert!(!verify_otp_hash("123456", "not-a-hash"));
    }

    #[test]
    fn tokens_are_checked_for_kind() {
        let config = AppConfig::with_defaults("postgres://unused", "test-secret");
        let user = user();
        let pair = issue_token_pair(&config, &user).unwrap();

        let claims = decode_token("test-secret", &pair.access_token, TokenKind::Access).unwrap();
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.role, "customer");

        assert!(decode_token("test-secret", &pair.access_token, TokenKind::Refresh).is_err());
        assert!(decode_token("test-secret", &pair.refresh_token, TokenKind::Access).is_err());
        assert!(decode_token("other-secret", &pair.access_token, TokenKind::Access).is_err());
        assert_eq!(pair.expires_in, 30 * 60);
    }

    #[test]
    fn email_is_normalized() {
        assert_eq!(normalize_email("  Buyer@Pranjay.Test ").unwrap(), "buyer@pranjay.test");
        assert!(normalize_email("nope").is_err());
    }
}
