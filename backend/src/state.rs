use std::sync::Arc;

use crate::{
    config::Config, db::connection::DbPool, repositories::UserRepository,
    services::PasswordResetService, utils::jwt::TokenService,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<Config>,
    pub tokens: TokenService,
    pub users: Arc<dyn UserRepository>,
    pub password_resets: PasswordResetService,
}

impl AppState {
    pub fn new(
        pool: DbPool,
        config: Config,
        users: Arc<dyn UserRepository>,
        password_resets: PasswordResetService,
    ) -> Self {
        let tokens = TokenService::new(&config.jwt_secret, config.jwt_expiration_hours);
        Self {
            pool,
            config: Arc::new(config),
            tokens,
            users,
            password_resets,
        }
    }
}
