//! Local view of room participants and optimistic agent edits.
//!
//! The editor renames or re-icons the agent before the room confirms it. Those
//! edits are mirrored into the matching participant so the chat shows them at
//! once; real membership events later overwrite the whole list.

use crate::types::{CollaboratorsInfo, SenderType};

/// A local change to the agent's room presence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberEdit {
    Nickname(String),
    Avatar(String),
}

/// Find the participant that represents the agent being edited.
///
/// An empty `editing_id` means an unsaved draft, which appears in the room as
/// the anonymous agent.
pub fn locate_editable(members: &[CollaboratorsInfo], editing_id: &str) -> Option<usize> {
    if editing_id.is_empty() {
        members
            .iter()
            .position(|m| m.role == SenderType::AnonymousAgent)
    } else {
        members.iter().position(|m| m.id == editing_id)
    }
}

/// Copy-on-write update of the entry at `index`.
///
/// A `None` index returns the list unchanged; the room simply has no entry
/// for the agent yet.
pub fn apply_local_edit(
    members: &[CollaboratorsInfo],
    index: Option<usize>,
    edit: &MemberEdit,
) -> Vec<CollaboratorsInfo> {
    let mut next = members.to_vec();
    if let Some(member) = index.and_then(|i| next.get_mut(i)) {
        match edit {
            MemberEdit::Nickname(name) => member.nickname = name.clone(),
            MemberEdit::Avatar(avatar) => member.avatar = avatar.clone(),
        }
    }
    next
}

/// Owns the participant list shown alongside the chat.
#[derive(Debug, Clone, Default)]
pub struct RoomMembershipTracker {
    members: Vec<CollaboratorsInfo>,
}

impl RoomMembershipTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn members(&self) -> &[CollaboratorsInfo] {
        &self.members
    }

    /// Replace the whole list with what the room reported.
    pub fn replace(&mut self, members: Vec<CollaboratorsInfo>) {
        self.members = members;
    }

    /// Mirror a local edit onto the agent's entry, if present.
    ///
    /// Returns whether an entry was updated.
    pub fn mirror_edit(&mut self, editing_id: &str, edit: &MemberEdit) -> bool {
        let index = locate_editable(&self.members, editing_id);
        if index.is_none() {
            tracing::debug!(editing_id, "no room entry for edited agent; edit not mirrored");
            return false;
        }
        self.members = apply_local_edit(&self.members, index, edit);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: &str, role: SenderType, nickname: &str) -> CollaboratorsInfo {
        CollaboratorsInfo {
            id: id.into(),
            role,
            nickname: nickname.into(),
            avatar: String::new(),
        }
    }

    fn room() -> Vec<CollaboratorsInfo> {
        vec![
            member("u1", SenderType::User, "ada"),
            member("", SenderType::AnonymousAgent, "draft"),
            member("a7", SenderType::Agent, "helper"),
        ]
    }

    #[test]
    fn empty_id_locates_anonymous_agent() {
        assert_eq!(locate_editable(&room(), ""), Some(1));
    }

    #[test]
    fn persisted_id_locates_by_id() {
        assert_eq!(locate_editable(&room(), "a7"), Some(2));
        assert_eq!(locate_editable(&room(), "missing"), None);
    }

    #[test]
    fn edit_touches_only_the_located_entry() {
        let before = room();
        let after = apply_local_edit(&before, Some(2), &MemberEdit::Nickname("renamed".into()));
        assert_eq!(after[2].nickname, "renamed");
        assert_eq!(after[0], before[0]);
        assert_eq!(after[1], before[1]);
        assert_eq!(before[2].nickname, "helper");
    }

    #[test]
    fn edit_without_index_is_dropped() {
        let before = room();
        let after = apply_local_edit(&before, None, &MemberEdit::Avatar("data:x".into()));
        assert_eq!(after, before);
    }

    #[test]
    fn tracker_mirrors_avatar_for_draft_agent() {
        let mut tracker = RoomMembershipTracker::new();
        assert!(!tracker.mirror_edit("", &MemberEdit::Nickname("x".into())));

        tracker.replace(room());
        assert!(tracker.mirror_edit("", &MemberEdit::Avatar("data:image/png;base64,AA==".into())));
        assert_eq!(tracker.members()[1].avatar, "data:image/png;base64,AA==");
        assert!(tracker.members()[2].avatar.is_empty());
    }
}
