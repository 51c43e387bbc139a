// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

use crate::ids::UserId;
use crate::state::TabKind;

/// Who is signed in. Supplied by the deployment (the identity provider is
/// external); the portal only reads it to scope screens and stamp
/// attribution fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub user_id: UserId,
    pub role: Role,
    pub name: String,
    pub email: String,
}

impl CurrentUser {
    pub fn can_author_announcements(&self) -> bool {
        !matches!(self.role, Role::Student)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "student")]
    Student,
    #[serde(rename = "faculty")]
    Faculty,
    #[serde(rename = "warden")]
    Warden,
    #[serde(rename = "accountant")]
    Accountant,
    #[serde(rename = "hod")]
    Hod,
    #[serde(rename = "librarian")]
    Librarian,
    #[serde(rename = "placement_officer")]
    PlacementOfficer,
    #[serde(rename = "admin")]
    Admin,
}

impl Role {
    pub const ALL: [Self; 8] = [
        Self::Student,
        Self::Faculty,
        Self::Warden,
        Self::Accountant,
        Self::Hod,
        Self::Librarian,
        Self::PlacementOfficer,
        Self::Admin,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Faculty => "faculty",
            Self::Warden => "warden",
            Self::Accountant => "accountant",
            Self::Hod => "hod",
            Self::Librarian => "librarian",
            Self::PlacementOfficer => "placement_officer",
            Self::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "student" => Some(Self::Student),
            "faculty" => Some(Self::Faculty),
            "warden" => Some(Self::Warden),
            "accountant" => Some(Self::Accountant),
            "hod" => Some(Self::Hod),
            "librarian" => Some(Self::Librarian),
            "placement_officer" => Some(Self::PlacementOfficer),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    /// Tabs this role can open, in display order. Dashboard is always first.
    pub const fn tabs(self) -> &'static [TabKind] {
        match self {
            Self::Student => &[
                TabKind::Dashboard,
                TabKind::Fees,
                TabKind::Books,
                TabKind::Issuances,
                TabKind::Courses,
                TabKind::Timetable,
                TabKind::Credits,
                TabKind::Drives,
                TabKind::Announcements,
            ],
            Self::Faculty => &[
                TabKind::Dashboard,
                TabKind::Students,
                TabKind::Courses,
                TabKind::Timetable,
                TabKind::Credits,
                TabKind::Announcements,
            ],
            Self::Warden => &[
                TabKind::Dashboard,
                TabKind::Students,
                TabKind::Hostel,
                TabKind::Announcements,
            ],
            Self::Accountant => &[
                TabKind::Dashboard,
                TabKind::Students,
                TabKind::Fees,
                TabKind::Announcements,
            ],
            Self::Hod => &[
                TabKind::Dashboard,
                TabKind::Students,
                TabKind::Courses,
                TabKind::Timetable,
                TabKind::Credits,
                TabKind::Drives,
                TabKind::Announcements,
            ],
            Self::Librarian => &[
                TabKind::Dashboard,
                TabKind::Students,
                TabKind::Books,
                TabKind::Issuances,
                TabKind::Announcements,
            ],
            Self::PlacementOfficer => &[
                TabKind::Dashboard,
                TabKind::Students,
                TabKind::Companies,
                TabKind::Drives,
                TabKind::Announcements,
            ],
            Self::Admin => &[
                TabKind::Dashboard,
                TabKind::Students,
                TabKind::Fees,
                TabKind::Books,
                TabKind::Issuances,
                TabKind::Courses,
                TabKind::Timetable,
                TabKind::Credits,
                TabKind::Companies,
                TabKind::Drives,
                TabKind::Announcements,
                TabKind::Hostel,
            ],
        }
    }

    /// Whether records on a tab are restricted to the signed-in student's
    /// own rows (fees, issuances, credit awards).
    pub const fn sees_only_own_rows(self, tab: TabKind) -> bool {
        matches!(
            (self, tab),
            (
                Self::Student,
                TabKind::Fees | TabKind::Issuances | TabKind::Credits
            )
        )
    }
}
