use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::config::Config;
use crate::db::DbPool;

/// Server-side session store mapping session tokens to user ids.
pub type SessionStore = Arc<Mutex<HashMap<String, i64>>>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Arc<Config>,
    pub sessions: SessionStore,
}
