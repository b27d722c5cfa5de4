//! Per-room post mutex.
//!
//! At most one post or edit may be in flight against a room. Waiters are
//! served in the order they arrived (`tokio::sync::Mutex` is FIFO-fair), so a
//! burst of plugin replies cannot starve an older post.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use jeeves_common::Room;

/// Held for the whole of one post/edit, including retries and recovery.
pub type RoomGuard = OwnedMutexGuard<()>;

/// Lazily created async lock per room.
///
/// Entries are never evicted: the map holds one lock for every room ever
/// posted to. The bot only joins a handful of rooms.
#[derive(Debug, Default)]
pub struct RoomLocks {
    // std Mutex: only touched for the map lookup, never held across `.await`.
    rooms: Mutex<HashMap<Room, Arc<AsyncMutex<()>>>>,
}

impl RoomLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `room`.
    pub async fn lock(&self, room: &Room) -> RoomGuard {
        let lock = {
            let mut rooms = self.rooms.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(rooms.entry(room.clone()).or_default())
        };
        lock.lock_owned().await
    }

    /// Whether some task currently holds the lock for `room`.
    #[must_use]
    pub fn is_locked(&self, room: &Room) -> bool {
        let rooms = self.rooms.lock().unwrap_or_else(|e| e.into_inner());
        rooms.get(room).is_some_and(|lock| lock.try_lock().is_err())
    }
}
