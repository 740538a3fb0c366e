use configs::AppConfig;
use sea_orm::DatabaseConnection;

/// Shared request state. Constructed once at startup and injected into
/// handlers; nothing here lives in a module-level singleton.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
}
