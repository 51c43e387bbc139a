// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::{Date, Time};

use crate::ids::{BookId, CompanyId, CourseId, FeeRecordId, RoomId, StudentId};
use crate::model::{
    Audience, DriveStatus, FeeCategory, Grade, Room, RoomAllocation, StudentStatus, Weekday,
};
use crate::state::FormKind;

/// Pre-submission failure. Collects every offending field in one pass so
/// the dialog can mark all of them at once instead of one per retry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationError {
    pub missing: Vec<&'static str>,
    pub invalid: Vec<FieldProblem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldProblem {
    pub field: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut wrote = false;
        if !self.missing.is_empty() {
            write!(f, "missing required fields: {}", self.missing.join(", "))?;
            wrote = true;
        }
        for problem in &self.invalid {
            if wrote {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", problem.field, problem.message)?;
            wrote = true;
        }
        if !wrote {
            f.write_str("invalid form input")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if !self.missing.is_empty() {
            lines.push(format!(
                "missing required fields: {}",
                self.missing.join(", ")
            ));
        }
        for problem in &self.invalid {
            lines.push(format!("{}: {}", problem.field, problem.message));
        }
        lines
    }
}

#[derive(Debug, Default)]
struct FieldErrors {
    missing: Vec<&'static str>,
    invalid: Vec<FieldProblem>,
}

impl FieldErrors {
    fn require_text(&mut self, field: &'static str, value: &str) {
        if value.trim().is_empty() {
            self.missing.push(field);
        }
    }

    fn require_id(&mut self, field: &'static str, id: i64) {
        if id <= 0 {
            self.missing.push(field);
        }
    }

    fn require_date(&mut self, field: &'static str, value: Option<Date>) {
        if value.is_none() {
            self.missing.push(field);
        }
    }

    fn require_time(&mut self, field: &'static str, value: Option<Time>) {
        if value.is_none() {
            self.missing.push(field);
        }
    }

    fn require_positive(&mut self, field: &'static str, value: i64) {
        if value <= 0 {
            self.missing.push(field);
        }
    }

    fn invalid(&mut self, field: &'static str, message: impl Into<String>) {
        self.invalid.push(FieldProblem {
            field,
            message: message.into(),
        });
    }

    fn finish(self) -> Result<(), ValidationError> {
        if self.missing.is_empty() && self.invalid.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                missing: self.missing,
                invalid: self.invalid,
            })
        }
    }
}

fn email_is_plausible(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.')
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentFormInput {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub department: String,
    pub year: i64,
    pub status: StudentStatus,
}

impl StudentFormInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::default();
        errors.require_text("name", &self.name);
        errors.require_text("email", &self.email);
        errors.require_text("department", &self.department);
        if !self.email.trim().is_empty() && !email_is_plausible(self.email.trim()) {
            errors.invalid("email", "not a valid address");
        }
        if !(1..=4).contains(&self.year) {
            errors.invalid("year", "must be between 1 and 4");
        }
        errors.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeFormInput {
    pub student_id: StudentId,
    pub student_name: String,
    pub category: FeeCategory,
    pub amount_cents: i64,
    pub paid_cents: i64,
    pub due_date: Option<Date>,
}

impl FeeFormInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::default();
        errors.require_id("student", self.student_id.get());
        errors.require_positive("amount", self.amount_cents);
        errors.require_date("due_date", self.due_date);
        if self.paid_cents < 0 {
            errors.invalid("paid", "cannot be negative");
        } else if self.amount_cents > 0 && self.paid_cents > self.amount_cents {
            errors.invalid("paid", "cannot exceed the billed amount");
        }
        errors.finish()
    }
}

/// Recording a payment patches `paid_cents` on an existing fee; the balance
/// is carried so the cap can be checked without re-reading the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentFormInput {
    pub fee_id: FeeRecordId,
    pub amount_cents: i64,
    pub balance_cents: i64,
}

impl PaymentFormInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::default();
        errors.require_id("fee", self.fee_id.get());
        errors.require_positive("amount", self.amount_cents);
        if self.amount_cents > 0 && self.amount_cents > self.balance_cents {
            errors.invalid("amount", "exceeds the outstanding balance");
        }
        errors.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookFormInput {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub category: String,
    pub total_copies: i64,
}

impl BookFormInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::default();
        errors.require_text("title", &self.title);
        errors.require_text("author", &self.author);
        errors.require_text("isbn", &self.isbn);
        if self.total_copies < 1 {
            errors.invalid("copies", "must be at least 1");
        }
        errors.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookIssuanceFormInput {
    pub book_id: BookId,
    pub book_title: String,
    pub student_id: StudentId,
    pub student_name: String,
    pub issued_on: Option<Date>,
}

impl BookIssuanceFormInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::default();
        errors.require_id("book", self.book_id.get());
        errors.require_id("student", self.student_id.get());
        errors.require_date("issued_on", self.issued_on);
        errors.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseFormInput {
    pub code: String,
    pub title: String,
    pub department: String,
    pub credits: i64,
    pub semester: i64,
    pub faculty_name: String,
}

impl CourseFormInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::default();
        errors.require_text("code", &self.code);
        errors.require_text("title", &self.title);
        errors.require_text("department", &self.department);
        if !(1..=6).contains(&self.credits) {
            errors.invalid("credits", "must be between 1 and 6");
        }
        if !(1..=8).contains(&self.semester) {
            errors.invalid("semester", "must be between 1 and 8");
        }
        errors.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimetableEntryFormInput {
    pub course_code: String,
    pub day: Weekday,
    pub starts_at: Option<Time>,
    pub ends_at: Option<Time>,
    pub room: String,
    pub faculty_name: String,
}

impl TimetableEntryFormInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::default();
        errors.require_text("course", &self.course_code);
        errors.require_time("starts_at", self.starts_at);
        errors.require_time("ends_at", self.ends_at);
        errors.require_text("room", &self.room);
        if let (Some(starts), Some(ends)) = (self.starts_at, self.ends_at)
            && ends <= starts
        {
            errors.invalid("ends_at", "must be after the start time");
        }
        errors.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreditAwardFormInput {
    pub student_id: StudentId,
    pub student_name: String,
    pub course_id: CourseId,
    pub course_code: String,
    pub credits: i64,
    pub grade: Grade,
    pub awarded_on: Option<Date>,
}

impl CreditAwardFormInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::default();
        errors.require_id("student", self.student_id.get());
        errors.require_text("course", &self.course_code);
        errors.require_positive("credits", self.credits);
        errors.require_date("awarded_on", self.awarded_on);
        errors.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyFormInput {
    pub name: String,
    pub industry: String,
    pub website: String,
    pub contact_email: String,
}

impl CompanyFormInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::default();
        errors.require_text("name", &self.name);
        if !self.contact_email.trim().is_empty()
            && !email_is_plausible(self.contact_email.trim())
        {
            errors.invalid("contact_email", "not a valid address");
        }
        errors.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementDriveFormInput {
    pub company_id: CompanyId,
    pub company_name: String,
    pub role_title: String,
    pub package_cents: i64,
    pub drive_date: Option<Date>,
    pub min_cgpa_tenths: i64,
    pub status: DriveStatus,
    pub offers_made: i64,
}

impl PlacementDriveFormInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::default();
        errors.require_id("company", self.company_id.get());
        errors.require_text("role", &self.role_title);
        errors.require_date("drive_date", self.drive_date);
        if self.package_cents < 0 {
            errors.invalid("package", "cannot be negative");
        }
        if !(0..=100).contains(&self.min_cgpa_tenths) {
            errors.invalid("min_cgpa", "must be between 0.0 and 10.0");
        }
        if self.offers_made < 0 {
            errors.invalid("offers", "cannot be negative");
        }
        errors.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnouncementFormInput {
    pub title: String,
    pub body: String,
    pub audience: Audience,
    pub posted_on: Option<Date>,
}

impl AnnouncementFormInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::default();
        errors.require_text("title", &self.title);
        errors.require_text("body", &self.body);
        errors.require_date("posted_on", self.posted_on);
        errors.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomFormInput {
    pub block: String,
    pub number: String,
    pub capacity: i64,
}

impl RoomFormInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::default();
        errors.require_text("block", &self.block);
        errors.require_text("number", &self.number);
        if self.capacity < 1 {
            errors.invalid("capacity", "must be at least 1");
        }
        errors.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomAllocationFormInput {
    pub room_id: RoomId,
    pub room_label: String,
    pub student_id: StudentId,
    pub student_name: String,
    pub allocated_on: Option<Date>,
}

impl RoomAllocationFormInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::default();
        errors.require_id("room", self.room_id.get());
        errors.require_id("student", self.student_id.get());
        errors.require_date("allocated_on", self.allocated_on);
        errors.finish()
    }
}

/// Occupancy is derived from the live allocation collection, so the check
/// runs against it rather than a stored counter.
pub fn ensure_room_has_space(
    room: &Room,
    allocations: &[RoomAllocation],
) -> Result<(), ValidationError> {
    let occupied = allocations
        .iter()
        .filter(|allocation| allocation.room_id == room.id)
        .count() as i64;
    if occupied >= room.capacity {
        let mut errors = FieldErrors::default();
        errors.invalid(
            "room",
            format!("{} is full ({occupied}/{})", room.label(), room.capacity),
        );
        return errors.finish();
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPayload {
    Student(StudentFormInput),
    Fee(FeeFormInput),
    Payment(PaymentFormInput),
    Book(BookFormInput),
    BookIssuance(BookIssuanceFormInput),
    Course(CourseFormInput),
    TimetableEntry(TimetableEntryFormInput),
    CreditAward(CreditAwardFormInput),
    Company(CompanyFormInput),
    PlacementDrive(PlacementDriveFormInput),
    Announcement(AnnouncementFormInput),
    Room(RoomFormInput),
    RoomAllocation(RoomAllocationFormInput),
}

impl FormPayload {
    pub fn kind(&self) -> FormKind {
        match self {
            Self::Student(_) => FormKind::Student,
            Self::Fee(_) => FormKind::Fee,
            Self::Payment(_) => FormKind::Payment,
            Self::Book(_) => FormKind::Book,
            Self::BookIssuance(_) => FormKind::BookIssuance,
            Self::Course(_) => FormKind::Course,
            Self::TimetableEntry(_) => FormKind::TimetableEntry,
            Self::CreditAward(_) => FormKind::CreditAward,
            Self::Company(_) => FormKind::Company,
            Self::PlacementDrive(_) => FormKind::PlacementDrive,
            Self::Announcement(_) => FormKind::Announcement,
            Self::Room(_) => FormKind::Room,
            Self::RoomAllocation(_) => FormKind::RoomAllocation,
        }
    }

    pub fn blank_for(kind: FormKind) -> Option<Self> {
        match kind {
            FormKind::Student => Some(Self::Student(StudentFormInput {
                name: String::new(),
                email: String::new(),
                phone: String::new(),
                department: String::new(),
                year: 1,
                status: StudentStatus::Active,
            })),
            FormKind::Fee => Some(Self::Fee(FeeFormInput {
                student_id: StudentId::new(0),
                student_name: String::new(),
                category: FeeCategory::Tuition,
                amount_cents: 0,
                paid_cents: 0,
                due_date: None,
            })),
            FormKind::Book => Some(Self::Book(BookFormInput {
                title: String::new(),
                author: String::new(),
                isbn: String::new(),
                category: String::new(),
                total_copies: 1,
            })),
            FormKind::BookIssuance => Some(Self::BookIssuance(BookIssuanceFormInput {
                book_id: BookId::new(0),
                book_title: String::new(),
                student_id: StudentId::new(0),
                student_name: String::new(),
                issued_on: None,
            })),
            FormKind::Course => Some(Self::Course(CourseFormInput {
                code: String::new(),
                title: String::new(),
                department: String::new(),
                credits: 3,
                semester: 1,
                faculty_name: String::new(),
            })),
            FormKind::TimetableEntry => Some(Self::TimetableEntry(TimetableEntryFormInput {
                course_code: String::new(),
                day: Weekday::Mon,
                starts_at: None,
                ends_at: None,
                room: String::new(),
                faculty_name: String::new(),
            })),
            FormKind::CreditAward => Some(Self::CreditAward(CreditAwardFormInput {
                student_id: StudentId::new(0),
                student_name: String::new(),
                course_id: CourseId::new(0),
                course_code: String::new(),
                credits: 0,
                grade: Grade::A,
                awarded_on: None,
            })),
            FormKind::Company => Some(Self::Company(CompanyFormInput {
                name: String::new(),
                industry: String::new(),
                website: String::new(),
                contact_email: String::new(),
            })),
            FormKind::PlacementDrive => Some(Self::PlacementDrive(PlacementDriveFormInput {
                company_id: CompanyId::new(0),
                company_name: String::new(),
                role_title: String::new(),
                package_cents: 0,
                drive_date: None,
                min_cgpa_tenths: 0,
                status: DriveStatus::Scheduled,
                offers_made: 0,
            })),
            FormKind::Announcement => Some(Self::Announcement(AnnouncementFormInput {
                title: String::new(),
                body: String::new(),
                audience: Audience::Everyone,
                posted_on: None,
            })),
            FormKind::Room => Some(Self::Room(RoomFormInput {
                block: String::new(),
                number: String::new(),
                capacity: 2,
            })),
            FormKind::RoomAllocation => Some(Self::RoomAllocation(RoomAllocationFormInput {
                room_id: RoomId::new(0),
                room_label: String::new(),
                student_id: StudentId::new(0),
                student_name: String::new(),
                allocated_on: None,
            })),
            // Payments are opened from a fee row, never blank.
            FormKind::Payment => None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Student(input) => input.validate(),
            Self::Fee(input) => input.validate(),
            Self::Payment(input) => input.validate(),
            Self::Book(input) => input.validate(),
            Self::BookIssuance(input) => input.validate(),
            Self::Course(input) => input.validate(),
            Self::TimetableEntry(input) => input.validate(),
            Self::CreditAward(input) => input.validate(),
            Self::Company(input) => input.validate(),
            Self::PlacementDrive(input) => input.validate(),
            Self::Announcement(input) => input.validate(),
            Self::Room(input) => input.validate(),
            Self::RoomAllocation(input) => input.validate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{RoomAllocationId, RoomId};
    use time::macros::{date, datetime, time};

    #[test]
    fn student_with_empty_email_reports_exactly_that_field() {
        let input = StudentFormInput {
            name: "Meera Nair".to_owned(),
            email: String::new(),
            phone: "98400 12345".to_owned(),
            department: "Computer Science".to_owned(),
            year: 2,
            status: StudentStatus::Active,
        };
        let error = input.validate().expect_err("email is required");
        assert_eq!(error.missing, vec!["email"]);
        assert!(error.invalid.is_empty());
    }

    #[test]
    fn student_validation_collects_every_missing_field() {
        let input = StudentFormInput {
            name: String::new(),
            email: String::new(),
            phone: String::new(),
            department: String::new(),
            year: 1,
            status: StudentStatus::Active,
        };
        let error = input.validate().expect_err("all required fields empty");
        assert_eq!(error.missing, vec!["name", "email", "department"]);
    }

    #[test]
    fn student_email_shape_is_checked() {
        let input = StudentFormInput {
            name: "Meera Nair".to_owned(),
            email: "not-an-address".to_owned(),
            phone: String::new(),
            department: "Physics".to_owned(),
            year: 9,
            status: StudentStatus::Active,
        };
        let error = input.validate().expect_err("bad email and year");
        assert!(error.missing.is_empty());
        let fields: Vec<_> = error.invalid.iter().map(|p| p.field).collect();
        assert_eq!(fields, vec!["email", "year"]);
    }

    #[test]
    fn fee_paid_cannot_exceed_amount() {
        let input = FeeFormInput {
            student_id: StudentId::new(4),
            student_name: "Arjun Rao".to_owned(),
            category: FeeCategory::Hostel,
            amount_cents: 40_000,
            paid_cents: 50_000,
            due_date: Some(date!(2026 - 09 - 01)),
        };
        let error = input.validate().expect_err("overpaid fee");
        assert_eq!(error.invalid[0].field, "paid");
    }

    #[test]
    fn payment_cannot_exceed_outstanding_balance() {
        let ok = PaymentFormInput {
            fee_id: FeeRecordId::new(1),
            amount_cents: 25_000,
            balance_cents: 25_000,
        };
        assert!(ok.validate().is_ok());

        let over = PaymentFormInput {
            fee_id: FeeRecordId::new(1),
            amount_cents: 30_000,
            balance_cents: 25_000,
        };
        assert!(over.validate().is_err());
    }

    #[test]
    fn timetable_end_must_follow_start() {
        let input = TimetableEntryFormInput {
            course_code: "CS204".to_owned(),
            day: Weekday::Wed,
            starts_at: Some(time!(11:00)),
            ends_at: Some(time!(10:00)),
            room: "LH-2".to_owned(),
            faculty_name: "Prof. Iyer".to_owned(),
        };
        let error = input.validate().expect_err("inverted slot");
        assert_eq!(error.invalid[0].field, "ends_at");
    }

    #[test]
    fn drive_cgpa_is_bounded_to_the_ten_point_scale() {
        let input = PlacementDriveFormInput {
            company_id: CompanyId::new(2),
            company_name: "Trellis Systems".to_owned(),
            role_title: "Graduate Engineer".to_owned(),
            package_cents: 60_000_000,
            drive_date: Some(date!(2026 - 11 - 20)),
            min_cgpa_tenths: 120,
            status: DriveStatus::Scheduled,
            offers_made: 0,
        };
        let error = input.validate().expect_err("cgpa out of range");
        assert_eq!(error.invalid[0].field, "min_cgpa");
    }

    #[test]
    fn full_room_rejects_further_allocation() {
        let room = Room {
            id: RoomId::new(3),
            block: "B".to_owned(),
            number: "112".to_owned(),
            capacity: 1,
            created_at: datetime!(2026-01-01 00:00 UTC),
        };
        let allocations = vec![RoomAllocation {
            id: RoomAllocationId::new(9),
            room_id: RoomId::new(3),
            room_label: "B-112".to_owned(),
            student_id: StudentId::new(5),
            student_name: "Arjun Rao".to_owned(),
            allocated_on: date!(2026 - 06 - 01),
            created_at: datetime!(2026-06-01 00:00 UTC),
        }];

        let error = ensure_room_has_space(&room, &allocations).expect_err("room is full");
        assert_eq!(error.invalid[0].field, "room");

        let elsewhere = Room {
            id: RoomId::new(4),
            number: "113".to_owned(),
            ..room
        };
        assert!(ensure_room_has_space(&elsewhere, &allocations).is_ok());
    }

    #[test]
    fn blank_payloads_exist_for_every_creatable_form() {
        for kind in [
            FormKind::Student,
            FormKind::Fee,
            FormKind::Book,
            FormKind::BookIssuance,
            FormKind::Course,
            FormKind::TimetableEntry,
            FormKind::CreditAward,
            FormKind::Company,
            FormKind::PlacementDrive,
            FormKind::Announcement,
            FormKind::Room,
            FormKind::RoomAllocation,
        ] {
            let payload = FormPayload::blank_for(kind).expect("blank payload");
            assert_eq!(payload.kind(), kind);
        }
        assert!(FormPayload::blank_for(FormKind::Payment).is_none());
    }

    #[test]
    fn validation_error_display_lists_fields() {
        let error = ValidationError {
            missing: vec!["email", "department"],
            invalid: vec![FieldProblem {
                field: "year",
                message: "must be between 1 and 4".to_owned(),
            }],
        };
        let rendered = error.to_string();
        assert!(rendered.contains("email, department"));
        assert!(rendered.contains("year"));
        assert_eq!(error.lines().len(), 2);
    }
}
