use chrono::{DateTime, Utc};
use huddle_shared::{
    ConnID,
    server_event::{MemberView, RoomSummary, UserSummary},
};

/// Stable identity of a member entry inside a room. Survives reconnects, unlike the
/// connection id.
pub type MemberID = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Camera,
    Screen,
}

#[derive(Debug, Clone)]
pub struct User {
    pub member_id: MemberID,
    pub conn_id: ConnID,
    pub name: String,
    pub is_streaming: bool,
    pub is_screen_sharing: bool,
    pub disconnected: bool,
}

impl User {
    pub fn new(member_id: MemberID, conn_id: &str, name: &str) -> Self {
        Self {
            member_id,
            conn_id: conn_id.to_string(),
            name: name.to_string(),
            is_streaming: false,
            is_screen_sharing: false,
            disconnected: false,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.disconnected
    }

    pub fn set_stream_flag(&mut self, kind: StreamKind, value: bool) {
        match kind {
            StreamKind::Camera => self.is_streaming = value,
            StreamKind::Screen => self.is_screen_sharing = value,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Room {
    pub name: String,
    pub persistent: bool,
    pub created_at: DateTime<Utc>,
    creator: MemberID,
    users: Vec<User>,
}

impl Room {
    /// Builds a room whose creator is its first and only member.
    pub fn new(name: &str, creator: User) -> Self {
        Self {
            name: name.to_string(),
            persistent: true,
            created_at: Utc::now(),
            creator: creator.member_id,
            users: vec![creator],
        }
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn is_creator(&self, user: &User) -> bool {
        user.member_id == self.creator
    }

    pub fn active_users(&self) -> impl Iterator<Item = &User> {
        self.users.iter().filter(|user| user.is_active())
    }

    pub fn active_count(&self) -> usize {
        self.active_users().count()
    }

    pub fn disconnected_count(&self) -> usize {
        self.users.len() - self.active_count()
    }

    pub fn active_connections(&self) -> Vec<ConnID> {
        self.active_users().map(|user| user.conn_id.clone()).collect()
    }

    pub fn find_active_by_conn(&self, conn_id: &str) -> Option<&User> {
        self.active_users().find(|user| user.conn_id == conn_id)
    }

    pub fn find_active_by_conn_mut(&mut self, conn_id: &str) -> Option<&mut User> {
        self.users
            .iter_mut()
            .find(|user| user.is_active() && user.conn_id == conn_id)
    }

    pub fn has_active_name(&self, name: &str) -> bool {
        self.active_users().any(|user| user.name == name)
    }

    /// The tombstoned entry a returning user with this name would take over.
    pub fn reconnect_candidate_mut(&mut self, name: &str) -> Option<&mut User> {
        self.users
            .iter_mut()
            .find(|user| user.disconnected && user.name == name)
    }

    pub fn push_user(&mut self, user: User) {
        self.users.push(user);
    }

    pub fn remove_active_by_conn(&mut self, conn_id: &str) -> Option<User> {
        let index = self
            .users
            .iter()
            .position(|user| user.is_active() && user.conn_id == conn_id)?;

        Some(self.users.remove(index))
    }

    pub fn member_views(&self) -> Vec<MemberView> {
        self.active_users()
            .map(|user| MemberView {
                id: user.conn_id.clone(),
                name: user.name.clone(),
                is_creator: self.is_creator(user),
                is_streaming: user.is_streaming,
                is_screen_sharing: user.is_screen_sharing,
            })
            .collect()
    }

    pub fn summary(&self, id: &str) -> RoomSummary {
        RoomSummary {
            id: id.to_string(),
            name: self.name.clone(),
            persistent: self.persistent,
            created_at: self.created_at.to_rfc3339(),
            users: self
                .active_users()
                .map(|user| UserSummary {
                    name: user.name.clone(),
                    is_creator: self.is_creator(user),
                    is_streaming: user.is_streaming,
                    is_screen_sharing: user.is_screen_sharing,
                })
                .collect(),
            disconnected_users: self.disconnected_count(),
            total_users: self.users.len(),
        }
    }
}
