use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::auth::repo::{PgUserStore, UserStore};
use crate::config::AppConfig;
use crate::prediction::Model;

/// Everything a handler needs, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub model: Arc<Model>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let model = Model::load(&config.model_path).context("load model artifact")?;

        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;
        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .context("run migrations")?;

        let users = Arc::new(PgUserStore::new(db)) as Arc<dyn UserStore>;
        Ok(Self::from_parts(users, Arc::new(model), config))
    }

    pub fn from_parts(users: Arc<dyn UserStore>, model: Arc<Model>, config: Arc<AppConfig>) -> Self {
        Self {
            users,
            model,
            config,
        }
    }

    /// In-memory users, fixed JWT settings, and a zero-weight logistic model.
    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::prediction::{
            features::FEATURE_COUNT,
            model::{LinearWeights, ModelArtifact},
        };

        let model = Model::from_artifact(ModelArtifact::Logistic(LinearWeights {
            coefficients: vec![0.0; FEATURE_COUNT],
            intercept: 0.0,
        }))
        .expect("zero-weight logistic model is valid");
        Self::fake_with_model(model)
    }

    #[cfg(test)]
    pub fn fake_with_model(model: Model) -> Self {
        use crate::auth::repo::MemoryUserStore;
        use crate::config::JwtConfig;

        let config = Arc::new(AppConfig {
            database_url: "postgres://unused".into(),
            jwt: JwtConfig {
                secret: "test-secret".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 15,
            },
            model_path: "./model/model.json".into(),
            cors_allowed_origin: None,
            listen_addr: ([127, 0, 0, 1], 0).into(),
        });

        Self::from_parts(Arc::new(MemoryUserStore::default()), Arc::new(model), config)
    }
}
