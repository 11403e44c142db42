use std::collections::HashMap;

use crate::board::Mark;
use crate::error::JoinError;
use crate::types::User;

/// Most connections a room holds at once.
pub const ROOM_CAPACITY: usize = 2;

/// Every joined user, in join order. A room is the set of users sharing a
/// room name; it has no record of its own.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    users: Vec<User>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join_room(
        &mut self,
        connection_id: &str,
        username: &str,
        room: &str,
    ) -> Result<User, JoinError> {
        if self.occupancy(room) >= ROOM_CAPACITY {
            return Err(JoinError::RoomFull);
        }

        let user = User {
            connection_id: connection_id.to_string(),
            username: username.to_string(),
            room: room.to_string(),
        };
        self.users.push(user.clone());
        Ok(user)
    }

    /// Removes the connection's earliest membership, if it has one.
    pub fn leave(&mut self, connection_id: &str) -> Option<User> {
        let index = self
            .users
            .iter()
            .position(|u| u.connection_id == connection_id)?;
        Some(self.users.remove(index))
    }

    pub fn list_users(&self, room: &str) -> impl Iterator<Item = &User> {
        self.users.iter().filter(move |u| u.room == room)
    }

    pub fn occupancy(&self, room: &str) -> usize {
        self.list_users(room).count()
    }

    pub fn is_empty(&self, room: &str) -> bool {
        self.occupancy(room) == 0
    }

    pub fn is_member(&self, connection_id: &str, room: &str) -> bool {
        self.list_users(room).any(|u| u.connection_id == connection_id)
    }

    pub fn connection_ids(&self, room: &str) -> Vec<String> {
        self.list_users(room)
            .map(|u| u.connection_id.clone())
            .collect()
    }
}

#[derive(Debug, Clone)]
struct Assignment {
    mark: Mark,
    room: String,
}

/// Marks handed out per connection. A mark is fixed for the life of the
/// connection, across restarts.
#[derive(Debug, Default)]
pub struct SymbolTable {
    marks: HashMap<String, Assignment>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The room's first occupant plays O and anyone after plays X. Must be
    /// called after the connection has joined `room`.
    pub fn assign_if_absent(
        &mut self,
        connection_id: &str,
        room: &str,
        registry: &RoomRegistry,
    ) -> Mark {
        if let Some(existing) = self.marks.get(connection_id) {
            return existing.mark;
        }

        let mark = if registry.occupancy(room) == 1 {
            Mark::O
        } else {
            Mark::X
        };
        self.marks.insert(
            connection_id.to_string(),
            Assignment {
                mark,
                room: room.to_string(),
            },
        );
        mark
    }

    pub fn mark_of(&self, connection_id: &str) -> Option<Mark> {
        self.marks.get(connection_id).map(|a| a.mark)
    }

    pub fn release(&mut self, connection_id: &str) {
        self.marks.remove(connection_id);
    }

    /// Drops every mark that was handed out in `room`.
    pub fn release_room(&mut self, room: &str) {
        self.marks.retain(|_, a| a.room != room);
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }
}
