//! Role-based capabilities.
//!
//! Each role grants a fixed set of capabilities. HTTP handlers ask for a
//! capability, never for a role, so the table below is the single place
//! where staff permissions are decided.

use serde::{Deserialize, Serialize};

use crate::error::{RoomkeepError, RoomkeepResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Receptionist,
    Cleaner,
    User,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Capability {
    ManageUsers,
    ManageRooms,
    UpdateHousekeeping,
    ManageReservations,
    DeleteReservations,
    ViewPayments,
    ManagePayments,
    ManageSchedules,
    ViewOwnSchedule,
    ViewDashboard,
    BookRooms,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Receptionist, Role::Cleaner, Role::User];

    /// Whether this role grants `capability`.
    pub fn can(self, capability: Capability) -> bool {
        use Capability::*;
        match self {
            Role::Admin => !matches!(capability, ViewOwnSchedule),
            Role::Receptionist => matches!(
                capability,
                UpdateHousekeeping
                    | ManageReservations
                    | ViewPayments
                    | ViewOwnSchedule
                    | ViewDashboard
                    | BookRooms
            ),
            Role::Cleaner => matches!(
                capability,
                UpdateHousekeeping | ViewOwnSchedule | ViewDashboard | BookRooms
            ),
            Role::User => matches!(capability, BookRooms),
        }
    }

    /// Like [`Role::can`] but returns an authorization error on denial.
    pub fn require(self, capability: Capability) -> RoomkeepResult<()> {
        if self.can(capability) {
            Ok(())
        } else {
            Err(RoomkeepError::AuthorizationDenied {
                reason: format!("role {} lacks {capability:?}", self.as_str()),
            })
        }
    }

    /// Staff roles appear on schedules and the staff dashboard.
    pub fn is_staff(self) -> bool {
        !matches!(self, Role::User)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Receptionist => "receptionist",
            Role::Cleaner => "cleaner",
            Role::User => "user",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        Role::ALL.into_iter().find(|r| r.as_str() == s)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Capability::*;

    #[test]
    fn admin_has_everything_but_own_schedule() {
        for cap in [
            ManageUsers,
            ManageRooms,
            UpdateHousekeeping,
            ManageReservations,
            DeleteReservations,
            ViewPayments,
            ManagePayments,
            ManageSchedules,
            ViewDashboard,
            BookRooms,
        ] {
            assert!(Role::Admin.can(cap), "admin should have {cap:?}");
        }
        assert!(!Role::Admin.can(ViewOwnSchedule));
    }

    #[test]
    fn receptionist_manages_reservations_but_cannot_delete() {
        assert!(Role::Receptionist.can(ManageReservations));
        assert!(Role::Receptionist.can(ViewPayments));
        assert!(!Role::Receptionist.can(DeleteReservations));
        assert!(!Role::Receptionist.can(ManagePayments));
        assert!(!Role::Receptionist.can(ManageRooms));
    }

    #[test]
    fn cleaner_only_touches_housekeeping() {
        assert!(Role::Cleaner.can(UpdateHousekeeping));
        assert!(Role::Cleaner.can(ViewOwnSchedule));
        assert!(!Role::Cleaner.can(ManageReservations));
        assert!(!Role::Cleaner.can(ViewPayments));
    }

    #[test]
    fn plain_user_can_only_book() {
        assert!(Role::User.can(BookRooms));
        assert!(!Role::User.can(ViewDashboard));
        assert!(Role::User.require(ManageRooms).is_err());
        assert!(!Role::User.is_staff());
    }

    #[test]
    fn parse_matches_as_str() {
        for role in Role::ALL {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("manager"), None);
    }
}
