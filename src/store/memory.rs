/// In-memory store using a Tokio mutex; single-process only.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{Account, AuthStore, NewRefreshToken, RefreshTokenRecord};
use crate::error::StoreError;

#[derive(Debug, Default)]
struct InnerState {
    accounts: HashMap<Uuid, Account>,
    /// Keyed by token hash.
    refresh_tokens: HashMap<String, RefreshTokenRecord>,
}

/// Store holding everything in process memory.
///
/// Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<InnerState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuthStore for InMemoryStore {
    async fn create_account(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> Result<Account, StoreError> {
        let mut state = self.state.lock().await;

        if state.accounts.values().any(|a| a.email == email) {
            return Err(StoreError::DuplicateEmail);
        }

        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
            is_chirpy_red: false,
        };
        state.accounts.insert(account.id, account.clone());

        Ok(account)
    }

    async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.accounts.values().find(|a| a.email == email).cloned())
    }

    async fn get_account_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.accounts.get(&id).cloned())
    }

    async fn create_refresh_token(&self, token: NewRefreshToken) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;

        if !state.accounts.contains_key(&token.account_id) {
            return Err(StoreError::Database(
                "refresh token references unknown account".to_string(),
            ));
        }
        if state.refresh_tokens.contains_key(&token.token_hash) {
            return Err(StoreError::Database(
                "duplicate refresh token".to_string(),
            ));
        }

        let record = RefreshTokenRecord {
            token_hash: token.token_hash.clone(),
            account_id: token.account_id,
            created_at: token.created_at,
            updated_at: token.created_at,
            expires_at: token.expires_at,
            revoked_at: None,
        };
        state.refresh_tokens.insert(token.token_hash, record);

        Ok(())
    }

    async fn get_refresh_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshTokenRecord>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.refresh_tokens.get(token_hash).cloned())
    }

    async fn revoke_refresh_token(
        &self,
        token_hash: &str,
        revoked_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;

        if let Some(record) = state.refresh_tokens.get_mut(token_hash) {
            if record.revoked_at.is_none() {
                record.revoked_at = Some(revoked_at);
                record.updated_at = revoked_at;
            }
        }

        Ok(())
    }

    async fn upgrade_account(&self, id: Uuid) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;

        let account = state
            .accounts
            .get_mut(&id)
            .ok_or(StoreError::AccountNotFound)?;
        account.is_chirpy_red = true;
        account.updated_at = Utc::now();

        Ok(())
    }

    async fn reset(&self) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.accounts.clear();
        state.refresh_tokens.clear();
        Ok(())
    }
}
