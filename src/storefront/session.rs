use serde::{Deserialize, Serialize};

use super::{
    error::StorefrontResult,
    store::{AUTH_KEY, LocalStore},
};
use crate::{dto::auth::TokenPair, models::User};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user: Option<User>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub is_authenticated: bool,
}

/// Signed-in state, persisted across runs.
#[derive(Debug)]
pub struct SessionStore {
    store: LocalStore,
    session: Session,
}

impl SessionStore {
    pub fn load(store: LocalStore) -> Self {
        let session = store.load(AUTH_KEY).unwrap_or_default();
        Self { store, session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated
    }

    pub fn access_token(&self) -> Option<&str> {
        self.session.access_token.as_deref()
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.session.refresh_token.as_deref()
    }

    pub fn set_user(&mut self, user: User) -> StorefrontResult<()> {
        self.session.user = Some(user);
        self.session.is_authenticated = true;
        self.store.save(AUTH_KEY, &self.session)
    }

    pub fn set_tokens(&mut self, tokens: &TokenPair) -> StorefrontResult<()> {
        self.session.access_token = Some(tokens.access_token.clone());
        self.session.refresh_token = Some(tokens.refresh_token.clone());
        self.store.save(AUTH_KEY, &self.session)
    }

    pub fn logout(&mut self) -> StorefrontResult<()> {
        self.session = Session::default();
        self.store.remove(AUTH_KEY)
    }
}
