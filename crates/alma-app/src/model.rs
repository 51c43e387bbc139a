// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime, Time};

use crate::ids::*;
use crate::timefmt;

/// Library loan period. `due_on` is always `issued_on + LOAN_PERIOD_DAYS`.
pub const LOAN_PERIOD_DAYS: i64 = 14;
/// Fine accrued per day a loan runs past `due_on`.
pub const FINE_PER_DAY_CENTS: i64 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StudentStatus {
    #[serde(rename = "active")]
    Active,
    #[serde(rename = "alumni")]
    Alumni,
    #[serde(rename = "suspended")]
    Suspended,
}

impl StudentStatus {
    pub const ALL: [Self; 3] = [Self::Active, Self::Alumni, Self::Suspended];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Alumni => "alumni",
            Self::Suspended => "suspended",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "alumni" => Some(Self::Alumni),
            "suspended" => Some(Self::Suspended),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeeCategory {
    #[serde(rename = "tuition")]
    Tuition,
    #[serde(rename = "hostel")]
    Hostel,
    #[serde(rename = "exam")]
    Exam,
    #[serde(rename = "library")]
    Library,
    #[serde(rename = "transport")]
    Transport,
}

impl FeeCategory {
    pub const ALL: [Self; 5] = [
        Self::Tuition,
        Self::Hostel,
        Self::Exam,
        Self::Library,
        Self::Transport,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tuition => "tuition",
            Self::Hostel => "hostel",
            Self::Exam => "exam",
            Self::Library => "library",
            Self::Transport => "transport",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "tuition" => Some(Self::Tuition),
            "hostel" => Some(Self::Hostel),
            "exam" => Some(Self::Exam),
            "library" => Some(Self::Library),
            "transport" => Some(Self::Transport),
            _ => None,
        }
    }
}

/// Settlement state of a fee record. Never stored: always derived from
/// `amount_cents`, `paid_cents`, and `due_date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeStatus {
    Pending,
    Partial,
    Paid,
    Overdue,
}

impl FeeStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Partial => "partial",
            Self::Paid => "paid",
            Self::Overdue => "overdue",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssuanceStatus {
    Issued,
    Overdue,
    Returned,
}

impl IssuanceStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Issued => "issued",
            Self::Overdue => "overdue",
            Self::Returned => "returned",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Weekday {
    #[serde(rename = "mon")]
    Mon,
    #[serde(rename = "tue")]
    Tue,
    #[serde(rename = "wed")]
    Wed,
    #[serde(rename = "thu")]
    Thu,
    #[serde(rename = "fri")]
    Fri,
    #[serde(rename = "sat")]
    Sat,
}

impl Weekday {
    pub const ALL: [Self; 6] = [
        Self::Mon,
        Self::Tue,
        Self::Wed,
        Self::Thu,
        Self::Fri,
        Self::Sat,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mon => "mon",
            Self::Tue => "tue",
            Self::Wed => "wed",
            Self::Thu => "thu",
            Self::Fri => "fri",
            Self::Sat => "sat",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "mon" => Some(Self::Mon),
            "tue" => Some(Self::Tue),
            "wed" => Some(Self::Wed),
            "thu" => Some(Self::Thu),
            "fri" => Some(Self::Fri),
            "sat" => Some(Self::Sat),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "D")]
    D,
    #[serde(rename = "F")]
    F,
}

impl Grade {
    pub const ALL: [Self; 7] = [
        Self::APlus,
        Self::A,
        Self::BPlus,
        Self::B,
        Self::C,
        Self::D,
        Self::F,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::APlus => "A+",
            Self::A => "A",
            Self::BPlus => "B+",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "A+" => Some(Self::APlus),
            "A" => Some(Self::A),
            "B+" => Some(Self::BPlus),
            "B" => Some(Self::B),
            "C" => Some(Self::C),
            "D" => Some(Self::D),
            "F" => Some(Self::F),
            _ => None,
        }
    }

    /// Ten-point scale, in tenths so grade math stays integral.
    pub const fn points_tenths(self) -> i64 {
        match self {
            Self::APlus => 100,
            Self::A => 90,
            Self::BPlus => 80,
            Self::B => 70,
            Self::C => 60,
            Self::D => 50,
            Self::F => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriveStatus {
    #[serde(rename = "scheduled")]
    Scheduled,
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "cancelled")]
    Cancelled,
}

impl DriveStatus {
    pub const ALL: [Self; 3] = [Self::Scheduled, Self::Completed, Self::Cancelled];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "scheduled" => Some(Self::Scheduled),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Audience {
    #[serde(rename = "everyone")]
    Everyone,
    #[serde(rename = "students")]
    Students,
    #[serde(rename = "faculty")]
    Faculty,
    #[serde(rename = "staff")]
    Staff,
}

impl Audience {
    pub const ALL: [Self; 4] = [Self::Everyone, Self::Students, Self::Faculty, Self::Staff];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Everyone => "everyone",
            Self::Students => "students",
            Self::Faculty => "faculty",
            Self::Staff => "staff",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "everyone" => Some(Self::Everyone),
            "students" => Some(Self::Students),
            "faculty" => Some(Self::Faculty),
            "staff" => Some(Self::Staff),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub roll_no: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub department: String,
    pub year: i64,
    pub status: StudentStatus,
    pub password_sha256: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeRecord {
    pub id: FeeRecordId,
    pub student_id: StudentId,
    pub student_name: String,
    pub category: FeeCategory,
    pub amount_cents: i64,
    pub paid_cents: i64,
    #[serde(with = "crate::timefmt::date")]
    pub due_date: Date,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl FeeRecord {
    pub const fn balance_cents(&self) -> i64 {
        self.amount_cents - self.paid_cents
    }

    pub fn status(&self, today: Date) -> FeeStatus {
        if self.paid_cents >= self.amount_cents {
            FeeStatus::Paid
        } else if self.due_date < today {
            FeeStatus::Overdue
        } else if self.paid_cents > 0 {
            FeeStatus::Partial
        } else {
            FeeStatus::Pending
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub category: String,
    pub total_copies: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookIssuance {
    pub id: BookIssuanceId,
    pub book_id: BookId,
    pub book_title: String,
    pub student_id: StudentId,
    pub student_name: String,
    #[serde(with = "crate::timefmt::date")]
    pub issued_on: Date,
    #[serde(with = "crate::timefmt::date")]
    pub due_on: Date,
    #[serde(with = "crate::timefmt::date_option")]
    pub returned_on: Option<Date>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl BookIssuance {
    pub fn is_active(&self) -> bool {
        self.returned_on.is_none()
    }

    pub fn status(&self, today: Date) -> IssuanceStatus {
        if self.returned_on.is_some() {
            IssuanceStatus::Returned
        } else if today > self.due_on {
            IssuanceStatus::Overdue
        } else {
            IssuanceStatus::Issued
        }
    }

    /// Fine accrued so far (or at return time), never negative.
    pub fn fine_cents(&self, today: Date) -> i64 {
        let settled_on = self.returned_on.unwrap_or(today);
        let days_late = (settled_on - self.due_on).whole_days();
        days_late.max(0) * FINE_PER_DAY_CENTS
    }
}

/// The due date a fresh issuance gets.
pub fn loan_due_date(issued_on: Date) -> Date {
    issued_on + time::Duration::days(LOAN_PERIOD_DAYS)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub code: String,
    pub title: String,
    pub department: String,
    pub credits: i64,
    pub semester: i64,
    pub faculty_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimetableEntry {
    pub id: TimetableEntryId,
    pub course_code: String,
    pub day: Weekday,
    #[serde(with = "crate::timefmt::clock")]
    pub starts_at: Time,
    #[serde(with = "crate::timefmt::clock")]
    pub ends_at: Time,
    pub room: String,
    pub faculty_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl TimetableEntry {
    pub fn slot_label(&self) -> String {
        format!(
            "{} {}-{}",
            self.day.as_str(),
            timefmt::format_clock(self.starts_at),
            timefmt::format_clock(self.ends_at),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditAward {
    pub id: CreditAwardId,
    pub student_id: StudentId,
    pub student_name: String,
    pub course_code: String,
    pub credits: i64,
    pub grade: Grade,
    #[serde(with = "crate::timefmt::date")]
    pub awarded_on: Date,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub industry: String,
    pub website: String,
    pub contact_email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementDrive {
    pub id: PlacementDriveId,
    pub company_id: CompanyId,
    pub company_name: String,
    pub role_title: String,
    pub package_cents: i64,
    #[serde(with = "crate::timefmt::date")]
    pub drive_date: Date,
    pub min_cgpa_tenths: i64,
    pub status: DriveStatus,
    pub offers_made: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    pub id: AnnouncementId,
    pub title: String,
    pub body: String,
    pub audience: Audience,
    pub author_id: UserId,
    pub author_name: String,
    #[serde(with = "crate::timefmt::date")]
    pub posted_on: Date,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub block: String,
    pub number: String,
    pub capacity: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Room {
    pub fn label(&self) -> String {
        format!("{}-{}", self.block, self.number)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomAllocation {
    pub id: RoomAllocationId,
    pub room_id: RoomId,
    pub room_label: String,
    pub student_id: StudentId,
    pub student_name: String,
    #[serde(with = "crate::timefmt::date")]
    pub allocated_on: Date,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
