use pranjay_storefront::{
    models::{User, UserRole, UserType},
    routes::params::ProductQuery,
    storefront::{ApiClient, CatalogSource, LocalStore, SessionStore},
};

// Nothing listens on port 9, so every call fails fast.
fn unreachable_client() -> ApiClient {
    ApiClient::new("http://127.0.0.1:9").unwrap()
}

#[tokio::test]
async fn api_errors_surface_from_the_client() {
    let client = unreachable_client();
    let err = client
        .list_products(&ProductQuery::default())
        .await
        .unwrap_err();
    assert!(err.status().is_none());
}

#[tokio::test]
async fn catalog_falls_back_to_bundled_products() {
    let catalog = CatalogSource::new(Some(unreachable_client()));

    assert_eq!(catalog.products(None).await.len(), 8);
    assert_eq!(catalog.products(Some("serum")).await.len(), 1);
    assert_eq!(catalog.featured().await.len(), 4);
    assert_eq!(catalog.categories().await.len(), 4);
    assert_eq!(catalog.by_category("skincare").await.len(), 2);

    let mist = catalog.product("rose-face-mist").await.unwrap();
    assert_eq!(mist.min_order_quantity, 12);
    assert!(catalog.product("no-such-thing").await.is_none());
}

#[tokio::test]
async fn failed_refresh_signs_out() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = SessionStore::load(LocalStore::open(dir.path()).unwrap());
    session
        .set_tokens(&pranjay_storefront::dto::auth::TokenPair {
            access_token: "stale".into(),
            refresh_token: "stale-refresh".into(),
            token_type: "bearer".into(),
            expires_in: 1800,
        })
        .unwrap();

    let mut client = unreachable_client().with_token(Some("stale".into()));
    assert!(!client.refresh_tokens(&mut session).await.unwrap());
    assert_eq!(session.refresh_token(), None);
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn refresh_without_stored_token_keeps_the_session() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::open(dir.path()).unwrap();
    let mut session = SessionStore::load(store.clone());
    let now = chrono::Utc::now();
    session
        .set_user(User {
            id: uuid::Uuid::new_v4(),
            email: "asha@pranjay.test".into(),
            phone: None,
            full_name: Some("Asha Rao".into()),
            business_name: None,
            gst_number: None,
            user_type: UserType::B2C,
            role: UserRole::Customer,
            is_active: true,
            is_verified: true,
            created_at: now,
            updated_at: now,
        })
        .unwrap();

    let mut client = unreachable_client();
    assert!(!client.refresh_tokens(&mut session).await.unwrap());
    assert!(session.is_authenticated());

    let reloaded = SessionStore::load(store);
    assert!(reloaded.is_authenticated());
    assert_eq!(
        reloaded.session().user.as_ref().map(|u| u.email.as_str()),
        Some("asha@pranjay.test")
    );
}
