// src/state.rs
use std::sync::Arc;

use sqlx::PgPool;

use crate::notify::{Notifier, SharedNotifier, TracingNotifier};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub notifier: SharedNotifier,
}

impl AppState {
    pub fn new(db_pool: PgPool) -> Self {
        Self::with_notifier(db_pool, Arc::new(TracingNotifier))
    }

    pub fn with_notifier(db_pool: PgPool, notifier: Arc<dyn Notifier>) -> Self {
        Self { db_pool, notifier }
    }
}
