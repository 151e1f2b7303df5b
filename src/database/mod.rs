pub mod memory;
pub mod models;
pub mod postgres;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::config::DatabaseConfig;
use crate::types::CaseStatus;
use models::*;

pub use memory::MemoryStore;
pub use models::ValidationErrors;
pub use postgres::PgStore;

/// Errors from the persistence layer
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence for users, cases and the records nested under cases.
///
/// Every record returned carries the usernames of the users it references.
/// Deleting a case removes its actuaciones, alertas and notas; deleting a
/// user leaves their records in place with the reference cleared.
#[async_trait]
pub trait Store: Send + Sync {
    async fn ping(&self) -> StoreResult<()>;

    // Users
    async fn create_user(&self, new: NewUser) -> StoreResult<User>;
    async fn user_by_id(&self, id: i64) -> StoreResult<Option<User>>;
    async fn user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    /// All users ordered by id
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    async fn update_user(&self, id: i64, patch: UserPatch) -> StoreResult<User>;
    async fn delete_user(&self, id: i64) -> StoreResult<()>;
    async fn count_users(&self) -> StoreResult<i64>;

    // Cases
    /// Insert a case, assigning its internal code from the current case count
    async fn create_case(&self, input: CaseInput, actor: i64) -> StoreResult<LawCase>;
    async fn case_by_id(&self, id: i64) -> StoreResult<Option<LawCase>>;
    /// Cases matching `filter`, most recently updated first
    async fn list_cases(&self, filter: &CaseFilter) -> StoreResult<Vec<LawCase>>;
    async fn update_case(&self, id: i64, patch: CasePatch, actor: i64) -> StoreResult<LawCase>;
    async fn delete_case(&self, id: i64) -> StoreResult<()>;
    async fn count_cases(&self) -> StoreResult<i64>;
    async fn count_cases_by_status(&self, estado: CaseStatus) -> StoreResult<i64>;
    async fn recent_cases(&self, limit: usize) -> StoreResult<Vec<LawCase>>;

    // Actuaciones
    async fn create_actuacion(&self, new: NewActuacion, actor: i64) -> StoreResult<Actuacion>;
    async fn actuacion_by_id(&self, id: i64) -> StoreResult<Option<Actuacion>>;
    async fn list_actuaciones(&self, caso: Option<i64>) -> StoreResult<Vec<Actuacion>>;
    async fn update_actuacion(&self, id: i64, patch: ActuacionPatch) -> StoreResult<Actuacion>;
    async fn delete_actuacion(&self, id: i64) -> StoreResult<()>;

    // Alertas
    async fn create_alerta(&self, new: NewAlerta, actor: i64) -> StoreResult<Alerta>;
    async fn alerta_by_id(&self, id: i64) -> StoreResult<Option<Alerta>>;
    async fn list_alertas(&self, filter: &AlertaFilter) -> StoreResult<Vec<Alerta>>;
    async fn update_alerta(&self, id: i64, patch: AlertaPatch) -> StoreResult<Alerta>;
    async fn toggle_alerta(&self, id: i64, actor: i64) -> StoreResult<Alerta>;
    async fn delete_alerta(&self, id: i64) -> StoreResult<()>;

    // Notas
    async fn create_nota(&self, new: NewNota, actor: i64) -> StoreResult<Nota>;
    async fn nota_by_id(&self, id: i64) -> StoreResult<Option<Nota>>;
    async fn list_notas(&self, caso: Option<i64>) -> StoreResult<Vec<Nota>>;
    async fn update_nota(&self, id: i64, patch: NotaPatch) -> StoreResult<Nota>;
    async fn delete_nota(&self, id: i64) -> StoreResult<()>;
}

/// Open the configured store: Postgres when a URL is set, memory otherwise
pub async fn connect(config: &DatabaseConfig) -> StoreResult<Arc<dyn Store>> {
    match &config.url {
        Some(url) => {
            let store = PgStore::connect(url, config).await?;
            store.migrate().await?;
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, data will be kept in memory only");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
