use crate::config::Config;
use crate::database::PostgreDatabase;

/// State shared by every handler behind an `Arc`
pub struct AppState {
    pub db: PostgreDatabase,
    pub config: Config,
}

impl AppState {
    pub fn new(db: PostgreDatabase, config: Config) -> Self {
        AppState { db, config }
    }
}
