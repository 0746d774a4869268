//! Role codes and the raw/display mapping.
//!
//! Roles exist in two representations in the surrounding system: the raw
//! stored form (`admin`, `maintainer`, `service_engineer`) carried on the
//! wire, and the human-readable display form (`Admin`, `Maintainer`,
//! `Service Engineer`) shown in the UI and returned by the login endpoint.
//! This module is the single authoritative mapping between them.
//!
//! Both directions are total: anything outside the closed set maps to the
//! [`RoleCode::Unassigned`] sentinel, never to an error. The mapping is
//! symmetric over the closed set:
//!
//! ```
//! use qrgate_core::RoleCode;
//!
//! for role in [RoleCode::Admin, RoleCode::Maintainer, RoleCode::ServiceEngineer] {
//!     assert_eq!(RoleCode::from_display(role.to_display()), role);
//!     assert_eq!(RoleCode::from_raw(role.as_raw()), role);
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Display text for a role that is not in the closed set.
///
/// Verbatim from the backend contract; treat as part of the wire format.
pub const UNASSIGNED_ROLE_DISPLAY: &str = "Role not assign to this user";

/// Capability level assigned both to users (at login) and to devices
/// (embedded in the encrypted QR payload).
///
/// Access is granted only when the two match. All comparisons inside the
/// workflow happen on this canonical form; raw and display strings are
/// converted at the boundary only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleCode {
    Admin,
    Maintainer,
    ServiceEngineer,

    /// Sentinel for any role outside the closed set, including an empty or
    /// missing role on a decrypted device record. A device with this role
    /// can never pass the role-match guard.
    #[default]
    #[serde(other)]
    Unassigned,
}

impl RoleCode {
    /// All roles in the closed set (excludes the sentinel).
    pub const KNOWN: [RoleCode; 3] = [
        RoleCode::Admin,
        RoleCode::Maintainer,
        RoleCode::ServiceEngineer,
    ];

    /// Map a raw stored code to a role. Unknown input maps to `Unassigned`.
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "admin" => RoleCode::Admin,
            "maintainer" => RoleCode::Maintainer,
            "service_engineer" => RoleCode::ServiceEngineer,
            _ => RoleCode::Unassigned,
        }
    }

    /// The raw stored form. The sentinel has no raw form and yields `""`.
    #[must_use]
    pub fn as_raw(&self) -> &'static str {
        match self {
            RoleCode::Admin => "admin",
            RoleCode::Maintainer => "maintainer",
            RoleCode::ServiceEngineer => "service_engineer",
            RoleCode::Unassigned => "",
        }
    }

    /// Map a display label back to a role. Unknown input maps to `Unassigned`.
    #[must_use]
    pub fn from_display(display: &str) -> Self {
        match display {
            "Admin" => RoleCode::Admin,
            "Maintainer" => RoleCode::Maintainer,
            "Service Engineer" => RoleCode::ServiceEngineer,
            _ => RoleCode::Unassigned,
        }
    }

    /// The human-readable display label.
    #[must_use]
    pub fn to_display(&self) -> &'static str {
        match self {
            RoleCode::Admin => "Admin",
            RoleCode::Maintainer => "Maintainer",
            RoleCode::ServiceEngineer => "Service Engineer",
            RoleCode::Unassigned => UNASSIGNED_ROLE_DISPLAY,
        }
    }

    /// Returns `true` for roles in the closed set.
    #[must_use]
    pub fn is_assigned(&self) -> bool {
        !matches!(self, RoleCode::Unassigned)
    }
}

impl fmt::Display for RoleCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display())
    }
}
