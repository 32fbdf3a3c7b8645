use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AdminUserService, AuthService, SeaOrmAdminUserService, SeaOrmAuthService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub auth_service: Arc<dyn AuthService>,

    pub admin_user_service: Arc<dyn AdminUserService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let security = config.security.clone();
        let config_arc = Arc::new(RwLock::new(config));

        let auth_service = Arc::new(SeaOrmAuthService::new(store.clone(), security.clone()))
            as Arc<dyn AuthService + Send + Sync + 'static>;

        let admin_user_service =
            Arc::new(SeaOrmAdminUserService::new(store.clone(), security))
                as Arc<dyn AdminUserService + Send + Sync + 'static>;

        Ok(Self {
            config: config_arc,
            store,
            auth_service,
            admin_user_service,
        })
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
