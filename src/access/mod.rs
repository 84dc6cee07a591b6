//! Authorization rules for venues and procurement requests.
//!
//! Every decision takes an explicit [`Principal`]; there is no ambient
//! current-user state. Handlers and services call one capability function
//! per (entity, operation) pair so the rules can be tested without any
//! HTTP or database plumbing.

use serde::{Deserialize, Serialize};

/// Account role carried in the JWT and the `users` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum Role {
    User,
    Superadmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Superadmin => "superadmin",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "superadmin" => Ok(Role::Superadmin),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// The authenticated actor behind a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub id: i64,
    pub role: Role,
}

impl Principal {
    pub fn new(id: i64, role: Role) -> Self {
        Self { id, role }
    }

    pub fn is_superadmin(&self) -> bool {
        self.role == Role::Superadmin
    }

    /// Row visibility for procurement request reads.
    pub fn request_read_scope(&self) -> ReadScope {
        match self.role {
            Role::Superadmin => ReadScope::All,
            Role::User => ReadScope::OwnedBy(self.id),
        }
    }

    /// Venue mutations are superadmin-only; venue reads are open to every
    /// authenticated principal.
    pub fn can_create_venue(&self) -> bool {
        self.is_superadmin()
    }

    pub fn can_update_venue(&self) -> bool {
        self.is_superadmin()
    }

    pub fn can_delete_venue(&self) -> bool {
        self.is_superadmin()
    }

    /// Any authenticated principal may file a request; the creator becomes
    /// the owner.
    pub fn can_create_request(&self) -> bool {
        true
    }

    pub fn can_update_request(&self, owner_id: i64) -> bool {
        self.is_superadmin() || self.id == owner_id
    }

    pub fn can_delete_request(&self, owner_id: i64) -> bool {
        self.is_superadmin() || self.id == owner_id
    }
}

/// The subset of procurement request rows a read is permitted to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadScope {
    All,
    OwnedBy(i64),
}

impl ReadScope {
    pub fn permits(&self, owner_id: i64) -> bool {
        match self {
            ReadScope::All => true,
            ReadScope::OwnedBy(id) => *id == owner_id,
        }
    }

    /// Owner filter for SQL queries; `None` means unrestricted.
    pub fn owner_filter(&self) -> Option<i64> {
        match self {
            ReadScope::All => None,
            ReadScope::OwnedBy(id) => Some(*id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn superadmin() -> Principal {
        Principal::new(1, Role::Superadmin)
    }

    fn user(id: i64) -> Principal {
        Principal::new(id, Role::User)
    }

    #[test]
    fn superadmin_reads_everything() {
        assert_eq!(superadmin().request_read_scope(), ReadScope::All);
        assert!(superadmin().request_read_scope().permits(42));
        assert_eq!(superadmin().request_read_scope().owner_filter(), None);
    }

    #[test]
    fn regular_user_reads_only_own_rows() {
        let scope = user(7).request_read_scope();
        assert_eq!(scope, ReadScope::OwnedBy(7));
        assert!(scope.permits(7));
        assert!(!scope.permits(9));
        assert_eq!(scope.owner_filter(), Some(7));
    }

    #[test]
    fn venue_mutations_are_superadmin_only() {
        assert!(superadmin().can_create_venue());
        assert!(superadmin().can_update_venue());
        assert!(superadmin().can_delete_venue());

        assert!(!user(7).can_create_venue());
        assert!(!user(7).can_update_venue());
        assert!(!user(7).can_delete_venue());
    }

    #[test]
    fn anyone_authenticated_may_create_requests() {
        assert!(superadmin().can_create_request());
        assert!(user(7).can_create_request());
    }

    #[test]
    fn request_mutation_requires_ownership_or_superadmin() {
        assert!(user(7).can_update_request(7));
        assert!(user(7).can_delete_request(7));
        assert!(!user(7).can_update_request(9));
        assert!(!user(7).can_delete_request(9));

        assert!(superadmin().can_update_request(9));
        assert!(superadmin().can_delete_request(9));
    }

    #[test]
    fn role_round_trips_through_strings() {
        assert_eq!("superadmin".parse::<Role>().unwrap(), Role::Superadmin);
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert!("admin".parse::<Role>().is_err());
        assert_eq!(Role::Superadmin.as_str(), "superadmin");
    }
}
