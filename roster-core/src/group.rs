//! Group member rosters.
//!
//! A [`GroupRoster`] is the member list of one group. It is kept apart from
//! the friend roster: members are not friends, and the friend/blacklist
//! rules do not apply to them.

use thiserror::Error;

use roster_types::{GroupId, GroupMember, Uid};

/// Errors from editing a group roster.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GroupRosterError {
    /// The member belongs to another group.
    #[error("member of group {got} cannot join roster of group {expected}")]
    ForeignMember {
        /// This roster's group.
        expected: GroupId,
        /// The member's group.
        got: GroupId,
    },
}

/// Members of a single group, one entry per uid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRoster {
    group_id: GroupId,
    members: Vec<GroupMember>,
}

impl GroupRoster {
    /// Create an empty roster for `group_id`.
    pub fn new(group_id: GroupId) -> Self {
        Self {
            group_id,
            members: Vec::new(),
        }
    }

    /// The group this roster belongs to.
    pub fn group_id(&self) -> &GroupId {
        &self.group_id
    }

    /// Insert or replace a member. Returns `true` if the member is new.
    pub fn upsert(&mut self, member: GroupMember) -> Result<bool, GroupRosterError> {
        if member.group_id != self.group_id {
            return Err(GroupRosterError::ForeignMember {
                expected: self.group_id.clone(),
                got: member.group_id,
            });
        }
        match self.members.iter_mut().find(|m| m.uid == member.uid) {
            Some(existing) => {
                *existing = member;
                Ok(false)
            }
            None => {
                self.members.push(member);
                Ok(true)
            }
        }
    }

    /// Remove a member, returning it if present.
    pub fn remove(&mut self, uid: &Uid) -> Option<GroupMember> {
        let index = self.members.iter().position(|m| &m.uid == uid)?;
        Some(self.members.remove(index))
    }

    /// Look up a member.
    pub fn get(&self, uid: &Uid) -> Option<&GroupMember> {
        self.members.iter().find(|m| &m.uid == uid)
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// True when the group has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// The group owner, if known.
    pub fn owner(&self) -> Option<&GroupMember> {
        self.members
            .iter()
            .find(|m| m.role == roster_types::GroupRole::Owner)
    }

    /// Members ordered by role (owner first), then join time.
    /// Ties keep insertion order.
    pub fn members(&self) -> Vec<&GroupMember> {
        let mut sorted: Vec<&GroupMember> = self.members.iter().collect();
        sorted.sort_by_key(|m| (m.role, m.join_time));
        sorted
    }
}
