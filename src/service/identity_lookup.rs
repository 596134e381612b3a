use std::sync::Arc;

use crate::error::StoreError;
use crate::models::account::Account;
use crate::store::AccountStore;

/// Read-only resolution of a Discord identity to its linked account.
#[derive(Clone)]
pub struct IdentityLookup {
    accounts: Arc<dyn AccountStore>,
}

impl IdentityLookup {
    pub fn new(accounts: Arc<dyn AccountStore>) -> Self {
        Self { accounts }
    }

    pub async fn find_link(&self, discord_user_id: &str) -> Result<Option<Account>, StoreError> {
        self.accounts.find_by_discord_id(discord_user_id).await
    }

    pub async fn exists(&self, discord_user_id: &str) -> Result<bool, StoreError> {
        Ok(self.find_link(discord_user_id).await?.is_some())
    }
}
