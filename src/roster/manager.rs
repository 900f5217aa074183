//! Roster manager implementation.

use crate::error::{Result, TallyError};
use crate::types::{ContributorId, RosterMember};
use parking_lot::RwLock;

/// Manages the ordered team roster.
///
/// Member ids are derived from the display name, so two members whose names
/// fold to the same slug cannot coexist.
pub struct RosterManager {
    members: RwLock<Vec<RosterMember>>,
}

impl RosterManager {
    /// Create an empty roster.
    pub fn new() -> Self {
        Self {
            members: RwLock::new(Vec::new()),
        }
    }

    /// Add a member. The id is derived from the name.
    pub fn add(&self, name: &str, description: &str) -> Result<RosterMember> {
        let id = ContributorId::derive(name);
        let mut members = self.members.write();

        if members.iter().any(|m| m.id == id) {
            return Err(TallyError::DuplicateName(name.to_string()));
        }

        let member = RosterMember {
            id,
            name: name.to_string(),
            description: description.to_string(),
        };
        members.push(member.clone());
        Ok(member)
    }

    /// Update a member's name and/or description.
    ///
    /// A new name re-derives the id; the slot keeps its roster position.
    pub fn edit(
        &self,
        id: &ContributorId,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<RosterMember> {
        let mut members = self.members.write();

        let position = members
            .iter()
            .position(|m| &m.id == id)
            .ok_or_else(|| TallyError::RosterMemberNotFound(id.to_string()))?;

        if let Some(new_name) = name {
            let new_id = ContributorId::derive(new_name);
            if members
                .iter()
                .enumerate()
                .any(|(i, m)| i != position && m.id == new_id)
            {
                return Err(TallyError::DuplicateName(new_name.to_string()));
            }
            members[position].id = new_id;
            members[position].name = new_name.to_string();
        }

        if let Some(new_description) = description {
            members[position].description = new_description.to_string();
        }

        Ok(members[position].clone())
    }

    /// Remove a member by id.
    pub fn remove(&self, id: &ContributorId) -> Result<()> {
        let mut members = self.members.write();
        let position = members
            .iter()
            .position(|m| &m.id == id)
            .ok_or_else(|| TallyError::RosterMemberNotFound(id.to_string()))?;
        members.remove(position);
        Ok(())
    }

    /// All members in insertion order.
    pub fn members(&self) -> Vec<RosterMember> {
        self.members.read().clone()
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.read().is_empty()
    }

    /// Deep copy of the roster for period snapshots.
    pub fn snapshot(&self) -> Vec<RosterMember> {
        self.members.read().clone()
    }

    /// Replace the roster with a previously taken snapshot.
    pub fn restore(&self, members: Vec<RosterMember>) {
        *self.members.write() = members;
    }
}

impl Default for RosterManager {
    fn default() -> Self {
        Self::new()
    }
}
