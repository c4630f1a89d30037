mod common;

use chrono::{Duration, Utc};
use pranjay_storefront::{
    dto::auth::{RefreshRequest, RequestOtpRequest, TokenKind, VerifyOtpRequest},
    entity::otp_codes::ActiveModel as OtpActive,
    error::AppError,
    models::UserRole,
    services::auth_service,
};
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

async fn plant_code(
    state: &pranjay_storefront::state::AppState,
    email: &str,
    otp: &str,
    expires_in: Duration,
) -> anyhow::Result<()> {
    OtpActive {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        user_id: Set(None),
        otp_hash: Set(auth_service::hash_otp(otp)?),
        expires_at: Set((Utc::now() + expires_in).into()),
        is_used: Set(false),
        created_at: Set((Utc::now() + Duration::seconds(1)).into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(())
}

#[tokio::test]
async fn otp_login_issues_tokens_once() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let state = common::setup_state(&url).await?;
    let email = format!("{}@pranjay.test", common::unique("login"));

    let sent = auth_service::request_otp(
        &state,
        RequestOtpRequest {
            email: format!("  {}  ", email.to_uppercase()),
        },
    )
    .await?
    .data
    .expect("otp response");
    assert_eq!(sent.email, email);
    assert_eq!(sent.expires_in_minutes, 10);

    plant_code(&state, &email, "482913", Duration::minutes(10)).await?;

    let wrong = auth_service::verify_otp(
        &state,
        VerifyOtpRequest {
            email: email.clone(),
            otp: "000000".into(),
        },
    )
    .await;
    assert!(matches!(wrong, Err(AppError::BadRequest(msg)) if msg.starts_with("Invalid OTP")));

    let login = auth_service::verify_otp(
        &state,
        VerifyOtpRequest {
            email: email.clone(),
            otp: "482913".into(),
        },
    )
    .await?
    .data
    .expect("login");
    assert!(login.user.is_verified);
    assert_eq!(login.user.role, UserRole::Customer);
    assert_eq!(login.tokens.token_type, "bearer");

    let claims = auth_service::decode_token(
        &state.config.jwt_secret,
        &login.tokens.access_token,
        TokenKind::Access,
    )?;
    assert_eq!(claims.sub, login.user.id.to_string());

    let reused = auth_service::verify_otp(
        &state,
        VerifyOtpRequest {
            email: email.clone(),
            otp: "482913".into(),
        },
    )
    .await;
    assert!(matches!(reused, Err(AppError::BadRequest(_))));

    let refreshed = auth_service::refresh_tokens(
        &state,
        RefreshRequest {
            refresh_token: login.tokens.refresh_token.clone(),
        },
    )
    .await?
    .data
    .expect("tokens");
    assert!(!refreshed.access_token.is_empty());

    let wrong_kind = auth_service::refresh_tokens(
        &state,
        RefreshRequest {
            refresh_token: login.tokens.access_token,
        },
    )
    .await;
    assert!(matches!(wrong_kind, Err(AppError::Unauthorized(_))));

    Ok(())
}

#[tokio::test]
async fn expired_code_is_rejected_and_consumed() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let state = common::setup_state(&url).await?;
    let email = format!("{}@pranjay.test", common::unique("expired"));

    auth_service::request_otp(&state, RequestOtpRequest { email: email.clone() }).await?;
    plant_code(&state, &email, "111222", Duration::minutes(-1)).await?;

    let expired = auth_service::verify_otp(
        &state,
        VerifyOtpRequest {
            email: email.clone(),
            otp: "111222".into(),
        },
    )
    .await;
    assert!(matches!(expired, Err(AppError::BadRequest(msg)) if msg.starts_with("OTP has expired")));

    // The planted code is spent, so the lookup lands on the issued code.
    let retry = auth_service::verify_otp(
        &state,
        VerifyOtpRequest {
            email,
            otp: "111222".into(),
        },
    )
    .await;
    assert!(matches!(retry, Err(AppError::BadRequest(msg)) if msg.starts_with("Invalid OTP")));

    Ok(())
}
