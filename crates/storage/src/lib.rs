use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use bml_core::{BookingSession, ConversationContext};
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::Serialize;

/// Per-user conversation memory (language preference and query count).
pub trait ContextRepository: Send + Sync {
    async fn load_context(&self, user_id: &str) -> Result<Option<ConversationContext>>;
    async fn upsert_context(&self, context: &ConversationContext) -> Result<()>;
}

/// At most one in-flight booking per user.
pub trait BookingRepository: Send + Sync {
    async fn load_booking(&self, user_id: &str) -> Result<Option<BookingSession>>;
    async fn upsert_booking(&self, session: &BookingSession) -> Result<()>;
    async fn remove_booking(&self, user_id: &str) -> Result<Option<BookingSession>>;
    async fn purge_expired(&self, now: DateTime<Utc>, ttl: Duration) -> Result<u64>;
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct StoreStats {
    pub contexts: usize,
    pub bookings: usize,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    contexts: Arc<RwLock<HashMap<String, ConversationContext>>>,
    bookings: Arc<RwLock<HashMap<String, BookingSession>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            contexts: self.contexts.read().len(),
            bookings: self.bookings.read().len(),
        }
    }
}

impl ContextRepository for MemoryStore {
    async fn load_context(&self, user_id: &str) -> Result<Option<ConversationContext>> {
        Ok(self.contexts.read().get(user_id).cloned())
    }

    async fn upsert_context(&self, context: &ConversationContext) -> Result<()> {
        self.contexts
            .write()
            .insert(context.user_id.clone(), context.clone());
        Ok(())
    }
}

impl BookingRepository for MemoryStore {
    async fn load_booking(&self, user_id: &str) -> Result<Option<BookingSession>> {
        Ok(self.bookings.read().get(user_id).cloned())
    }

    async fn upsert_booking(&self, session: &BookingSession) -> Result<()> {
        self.bookings
            .write()
            .insert(session.user_id.clone(), session.clone());
        Ok(())
    }

    async fn remove_booking(&self, user_id: &str) -> Result<Option<BookingSession>> {
        Ok(self.bookings.write().remove(user_id))
    }

    async fn purge_expired(&self, now: DateTime<Utc>, ttl: Duration) -> Result<u64> {
        let mut removed = 0_u64;
        self.bookings.write().retain(|_, session| {
            let keep = !session.is_expired(now, ttl);
            if !keep {
                removed += 1;
            }
            keep
        });

        Ok(removed)
    }
}
