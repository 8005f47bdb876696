//! Shared request state, handed to handlers as an `Extension`.

use std::sync::Arc;

use canigo_core::access::AccessEngine;
use canigo_core::accounts::AccountService;
use canigo_core::config::AuthConfig;
use canigo_core::ports::{Clock, EmailSender, Stores};
use canigo_core::token::TokenService;

#[derive(Clone)]
pub struct AppState {
    pub engine: AccessEngine,
    pub accounts: Arc<AccountService>,
    pub stores: Stores,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(
        auth: &AuthConfig,
        stores: Stores,
        mailer: Arc<dyn EmailSender>,
        clock: Arc<dyn Clock>,
        public_url: &str,
    ) -> Self {
        let tokens = Arc::new(TokenService::new(auth, Arc::clone(&clock)));
        let accounts = AccountService::new(
            auth,
            stores.clone(),
            Arc::clone(&tokens),
            mailer,
            Arc::clone(&clock),
            public_url,
        );
        Self {
            engine: AccessEngine::new(tokens, stores.clone()),
            accounts: Arc::new(accounts),
            stores,
            clock,
        }
    }
}
