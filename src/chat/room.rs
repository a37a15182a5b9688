//! Room membership and fan-out

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::config::ChatConfig;
use super::error::ChatError;

struct Member {
    username: String,
    tx: mpsc::Sender<String>,
}

/// Handle identifying one joined connection
///
/// Returned by [`ChatRoomBroadcaster::join`]; pass it back to `publish` and
/// `leave`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMembership {
    room: String,
    member_id: u64,
    username: String,
}

impl ChatMembership {
    /// Room joined
    pub fn room(&self) -> &str {
        &self.room
    }

    /// Name given at join
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Server-assigned member id, unique per process
    pub fn member_id(&self) -> u64 {
        self.member_id
    }
}

/// Outcome of one broadcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Members the message was queued for
    pub delivered: usize,
    /// Members whose queue was full or closed
    pub failed: usize,
}

/// Room table shared by all chat connections
///
/// Rooms are created on first join and removed when the last member leaves.
/// Each member gets a bounded queue; a member that cannot keep up loses
/// messages instead of stalling the room.
pub struct ChatRoomBroadcaster {
    rooms: DashMap<String, HashMap<u64, Member>>,
    next_member: AtomicU64,
    config: ChatConfig,
}

impl ChatRoomBroadcaster {
    pub fn new() -> Self {
        Self::with_config(ChatConfig::default())
    }

    pub fn with_config(config: ChatConfig) -> Self {
        Self {
            rooms: DashMap::new(),
            next_member: AtomicU64::new(1),
            config,
        }
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Add a connection to a room, creating the room if needed
    ///
    /// Returns the membership handle and the receiver the connection's
    /// writer drains.
    pub fn join(
        &self,
        room: Option<&str>,
        username: Option<&str>,
    ) -> Result<(ChatMembership, mpsc::Receiver<String>), ChatError> {
        let room = non_blank(room).ok_or(ChatError::MissingRoom)?;
        let username = non_blank(username).ok_or(ChatError::MissingUsername)?;

        let member_id = self.next_member.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.config.outbound_capacity);

        let members = {
            let mut entry = self.rooms.entry(room.to_string()).or_default();
            entry.insert(
                member_id,
                Member {
                    username: username.to_string(),
                    tx,
                },
            );
            entry.len()
        };

        tracing::info!(room, username, member_id, members, "Joined chat room");

        Ok((
            ChatMembership {
                room: room.to_string(),
                member_id,
                username: username.to_string(),
            },
            rx,
        ))
    }

    /// Forward a message, unmodified, to every member of the sender's room
    pub fn publish(&self, from: &ChatMembership, message: &str) -> BroadcastReport {
        let mut report = BroadcastReport::default();

        let Some(members) = self.rooms.get(&from.room) else {
            return report;
        };

        for (&id, member) in members.iter() {
            if id == from.member_id && !self.config.echo_to_sender {
                continue;
            }
            match member.tx.try_send(message.to_owned()) {
                Ok(()) => report.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    report.failed += 1;
                    tracing::warn!(
                        room = %from.room,
                        username = %member.username,
                        "Chat queue full, message dropped"
                    );
                }
                Err(TrySendError::Closed(_)) => {
                    report.failed += 1;
                    tracing::debug!(
                        room = %from.room,
                        username = %member.username,
                        "Chat member gone, message dropped"
                    );
                }
            }
        }

        tracing::trace!(
            room = %from.room,
            from = %from.username,
            delivered = report.delivered,
            failed = report.failed,
            "Chat message relayed"
        );
        report
    }

    /// Remove a member; the room goes away with its last member
    pub fn leave(&self, membership: &ChatMembership) -> bool {
        let removed = match self.rooms.get_mut(&membership.room) {
            Some(mut members) => members.remove(&membership.member_id).is_some(),
            None => false,
        };

        let room_closed = self
            .rooms
            .remove_if(&membership.room, |_, members| members.is_empty())
            .is_some();

        if removed {
            tracing::info!(
                room = %membership.room,
                username = %membership.username,
                room_closed,
                "Left chat room"
            );
        }
        removed
    }

    /// Number of live rooms
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Number of members in a room (0 if it does not exist)
    pub fn member_count(&self, room: &str) -> usize {
        self.rooms.get(room).map(|members| members.len()).unwrap_or(0)
    }
}

impl Default for ChatRoomBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Present and not just whitespace; the value itself is kept as sent
fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_requires_room_and_username() {
        let chat = ChatRoomBroadcaster::new();

        assert_eq!(chat.join(None, Some("a")).unwrap_err(), ChatError::MissingRoom);
        assert_eq!(chat.join(Some(" "), Some("a")).unwrap_err(), ChatError::MissingRoom);
        assert_eq!(
            chat.join(Some("alpha"), Some("")).unwrap_err(),
            ChatError::MissingUsername
        );
        assert_eq!(chat.join(Some("alpha"), None).unwrap_err().close_reason().code, 1007);
        assert_eq!(chat.room_count(), 0);
    }

    #[test]
    fn test_rooms_are_isolated() {
        let chat = ChatRoomBroadcaster::new();
        let (a1, mut rx_a1) = chat.join(Some("alpha"), Some("ann")).unwrap();
        let (a2, mut rx_a2) = chat.join(Some("alpha"), Some("al")).unwrap();
        let (_b, mut rx_b) = chat.join(Some("beta"), Some("bob")).unwrap();

        let report = chat.publish(&a1, "hello");
        assert_eq!(report, BroadcastReport { delivered: 2, failed: 0 });
        chat.publish(&a2, "hi back");

        assert_eq!(rx_a1.try_recv().unwrap(), "hello");
        assert_eq!(rx_a1.try_recv().unwrap(), "hi back");
        assert_eq!(rx_a2.try_recv().unwrap(), "hello");
        assert_eq!(rx_a2.try_recv().unwrap(), "hi back");
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn test_sender_receives_own_message() {
        let chat = ChatRoomBroadcaster::new();
        let (me, mut rx) = chat.join(Some("alpha"), Some("ann")).unwrap();

        chat.publish(&me, "{\"text\":\"hi\"}");
        assert_eq!(rx.try_recv().unwrap(), "{\"text\":\"hi\"}");
    }

    #[test]
    fn test_echo_can_be_disabled() {
        let chat = ChatRoomBroadcaster::with_config(ChatConfig::default().echo_to_sender(false));
        let (me, mut rx_me) = chat.join(Some("alpha"), Some("ann")).unwrap();
        let (_other, mut rx_other) = chat.join(Some("alpha"), Some("al")).unwrap();

        let report = chat.publish(&me, "hi");
        assert_eq!(report.delivered, 1);
        assert!(rx_me.try_recv().is_err());
        assert_eq!(rx_other.try_recv().unwrap(), "hi");
    }

    #[test]
    fn test_failed_recipient_does_not_stop_broadcast() {
        let chat = ChatRoomBroadcaster::with_config(ChatConfig::default().outbound_capacity(1));
        let (sender, _rx_sender) = chat.join(Some("alpha"), Some("ann")).unwrap();
        let (_gone, rx_gone) = chat.join(Some("alpha"), Some("gone")).unwrap();
        let (_slow, _rx_slow) = chat.join(Some("alpha"), Some("slow")).unwrap();
        let (_ok, mut rx_ok) = chat.join(Some("alpha"), Some("ok")).unwrap();
        drop(rx_gone);

        // First message fills every queue of depth 1
        let first = chat.publish(&sender, "one");
        assert_eq!(first, BroadcastReport { delivered: 3, failed: 1 });

        assert_eq!(rx_ok.try_recv().unwrap(), "one");
        let second = chat.publish(&sender, "two");
        // sender and slow are still full, gone is closed
        assert_eq!(second, BroadcastReport { delivered: 1, failed: 3 });
        assert_eq!(rx_ok.try_recv().unwrap(), "two");
    }

    #[test]
    fn test_empty_room_removed() {
        let chat = ChatRoomBroadcaster::new();
        let (a, _rx_a) = chat.join(Some("alpha"), Some("ann")).unwrap();
        let (b, _rx_b) = chat.join(Some("alpha"), Some("al")).unwrap();
        assert_eq!(chat.member_count("alpha"), 2);

        assert!(chat.leave(&a));
        assert_eq!(chat.room_count(), 1);
        assert!(!chat.leave(&a));

        assert!(chat.leave(&b));
        assert_eq!(chat.room_count(), 0);
        assert_eq!(chat.member_count("alpha"), 0);
    }

    #[test]
    fn test_padded_room_is_distinct() {
        let chat = ChatRoomBroadcaster::new();
        let (padded, _rx_padded) = chat.join(Some(" alpha"), Some("ann")).unwrap();
        let (_plain, mut rx_plain) = chat.join(Some("alpha"), Some(" al ")).unwrap();

        assert_eq!(padded.room(), " alpha");
        assert_eq!(chat.room_count(), 2);

        chat.publish(&padded, "hi");
        assert!(rx_plain.try_recv().is_err());
    }

    #[test]
    fn test_publish_after_room_gone() {
        let chat = ChatRoomBroadcaster::new();
        let (a, _rx) = chat.join(Some("alpha"), Some("ann")).unwrap();
        chat.leave(&a);

        assert_eq!(chat.publish(&a, "late"), BroadcastReport::default());
    }
}
