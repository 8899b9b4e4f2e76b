//! Notification store
//!
//! Owned by the application state and handed out by `Arc`; never a process
//! global. Oldest entries are dropped once `capacity` is reached.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::PersistenceError;

const DEFAULT_CAPACITY: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    TicketCreated,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NotificationStore {
    items: RwLock<Vec<Notification>>,
    capacity: usize,
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: RwLock::new(Vec::new()),
            capacity: capacity.max(1),
        }
    }

    /// All notifications, oldest first
    pub fn read(&self) -> Vec<Notification> {
        self.items.read().clone()
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    pub fn append(
        &self,
        kind: NotificationKind,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Notification {
        let notification = Notification {
            id: Uuid::new_v4(),
            kind,
            title: title.into(),
            body: body.into(),
            created_at: Utc::now(),
        };

        let mut items = self.items.write();
        if items.len() >= self.capacity {
            let overflow = items.len() + 1 - self.capacity;
            items.drain(..overflow);
        }
        items.push(notification.clone());

        tracing::debug!(id = %notification.id, kind = ?kind, "Notification appended");
        notification
    }

    pub fn remove(&self, id: Uuid) -> Result<Notification, PersistenceError> {
        let mut items = self.items.write();
        let index = items
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| PersistenceError::NotFound(format!("notification {}", id)))?;
        Ok(items.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_read_remove() {
        let store = NotificationStore::new();
        let first = store.append(NotificationKind::System, "Hello", "First");
        let second = store.append(NotificationKind::TicketCreated, "Ticket", "Second");

        let all = store.read();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, first.id);
        assert_eq!(all[1].id, second.id);

        let removed = store.remove(first.id).unwrap();
        assert_eq!(removed.title, "Hello");
        assert_eq!(store.len(), 1);

        assert!(matches!(
            store.remove(first.id),
            Err(PersistenceError::NotFound(_))
        ));
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let store = NotificationStore::with_capacity(2);
        store.append(NotificationKind::System, "a", "");
        store.append(NotificationKind::System, "b", "");
        store.append(NotificationKind::System, "c", "");

        let titles: Vec<_> = store.read().into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["b", "c"]);
    }

    #[test]
    fn test_stores_are_independent() {
        let a = NotificationStore::new();
        let b = NotificationStore::new();
        a.append(NotificationKind::System, "only in a", "");
        assert!(b.is_empty());
    }
}
