use serde::{Deserialize, Serialize};

use crate::types::{CustomerId, MembershipLevel};

/// customer snapshot handed over by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub is_member: bool,
    pub is_vip: bool,
}

impl Customer {
    pub fn guest(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_member: false,
            is_vip: false,
        }
    }

    pub fn member(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            is_member: true,
            ..Self::guest(id, name)
        }
    }

    pub fn vip(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            is_member: true,
            is_vip: true,
            ..Self::guest(id, name)
        }
    }

    /// VIP only counts for members
    pub fn membership(&self) -> MembershipLevel {
        match (self.is_member, self.is_vip) {
            (false, _) => MembershipLevel::NonMember,
            (true, false) => MembershipLevel::Member,
            (true, true) => MembershipLevel::Vip,
        }
    }
}
