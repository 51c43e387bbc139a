// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Table bindings for every portal entity. Field names here are the
//! serialized row keys, which is what the filter engine and required-field
//! checks operate on.

use alma_app::model::{
    Announcement, Book, BookIssuance, Company, Course, CreditAward, FeeRecord, PlacementDrive,
    Room, RoomAllocation, Student, TimetableEntry,
};

use crate::collection::Entity;

impl Entity for Student {
    const TABLE: &'static str = "students";
    const REQUIRED: &'static [&'static str] = &["roll_no", "name", "email", "department"];
    const SEARCH: &'static [&'static str] = &["roll_no", "name", "email", "department"];
    const FACETS: &'static [&'static str] = &["status", "department"];

    fn id(&self) -> i64 {
        self.id.get()
    }
}

impl Entity for FeeRecord {
    const TABLE: &'static str = "fees";
    const REQUIRED: &'static [&'static str] =
        &["student_id", "student_name", "category", "amount_cents", "due_date"];
    const SEARCH: &'static [&'static str] = &["student_name", "category"];
    const FACETS: &'static [&'static str] = &["category"];

    fn id(&self) -> i64 {
        self.id.get()
    }
}

impl Entity for Book {
    const TABLE: &'static str = "books";
    const REQUIRED: &'static [&'static str] = &["title", "author", "isbn"];
    const SEARCH: &'static [&'static str] = &["title", "author", "isbn", "category"];
    const FACETS: &'static [&'static str] = &["category"];

    fn id(&self) -> i64 {
        self.id.get()
    }
}

impl Entity for BookIssuance {
    const TABLE: &'static str = "book_issuances";
    const REQUIRED: &'static [&'static str] =
        &["book_id", "book_title", "student_id", "issued_on", "due_on"];
    const SEARCH: &'static [&'static str] = &["book_title", "student_name"];

    fn id(&self) -> i64 {
        self.id.get()
    }
}

impl Entity for Course {
    const TABLE: &'static str = "courses";
    const REQUIRED: &'static [&'static str] = &["code", "title", "department"];
    const SEARCH: &'static [&'static str] = &["code", "title", "department", "faculty_name"];
    const FACETS: &'static [&'static str] = &["department"];

    fn id(&self) -> i64 {
        self.id.get()
    }
}

impl Entity for TimetableEntry {
    const TABLE: &'static str = "timetable";
    const REQUIRED: &'static [&'static str] =
        &["course_code", "day", "starts_at", "ends_at", "room"];
    const SEARCH: &'static [&'static str] = &["course_code", "room", "faculty_name"];
    const FACETS: &'static [&'static str] = &["day"];

    fn id(&self) -> i64 {
        self.id.get()
    }
}

impl Entity for CreditAward {
    const TABLE: &'static str = "credit_awards";
    const REQUIRED: &'static [&'static str] =
        &["student_id", "student_name", "course_code", "credits", "grade"];
    const SEARCH: &'static [&'static str] = &["student_name", "course_code"];
    const FACETS: &'static [&'static str] = &["grade"];

    fn id(&self) -> i64 {
        self.id.get()
    }
}

impl Entity for Company {
    const TABLE: &'static str = "companies";
    const REQUIRED: &'static [&'static str] = &["name"];
    const SEARCH: &'static [&'static str] = &["name", "industry", "website"];
    const FACETS: &'static [&'static str] = &["industry"];

    fn id(&self) -> i64 {
        self.id.get()
    }
}

impl Entity for PlacementDrive {
    const TABLE: &'static str = "placement_drives";
    const REQUIRED: &'static [&'static str] =
        &["company_id", "company_name", "role_title", "drive_date"];
    const SEARCH: &'static [&'static str] = &["company_name", "role_title"];
    const FACETS: &'static [&'static str] = &["status"];

    fn id(&self) -> i64 {
        self.id.get()
    }
}

impl Entity for Announcement {
    const TABLE: &'static str = "announcements";
    const REQUIRED: &'static [&'static str] = &["title", "body", "author_id", "author_name"];
    const SEARCH: &'static [&'static str] = &["title", "body", "author_name"];
    const FACETS: &'static [&'static str] = &["audience"];

    fn id(&self) -> i64 {
        self.id.get()
    }
}

impl Entity for Room {
    const TABLE: &'static str = "rooms";
    const REQUIRED: &'static [&'static str] = &["block", "number", "capacity"];
    const SEARCH: &'static [&'static str] = &["block", "number"];
    const FACETS: &'static [&'static str] = &["block"];

    fn id(&self) -> i64 {
        self.id.get()
    }
}

impl Entity for RoomAllocation {
    const TABLE: &'static str = "room_allocations";
    const REQUIRED: &'static [&'static str] =
        &["room_id", "room_label", "student_id", "student_name", "allocated_on"];
    const SEARCH: &'static [&'static str] = &["room_label", "student_name"];

    fn id(&self) -> i64 {
        self.id.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::is_known_table;

    #[test]
    fn every_entity_table_is_in_the_gateway_allowlist() {
        for table in [
            Student::TABLE,
            FeeRecord::TABLE,
            Book::TABLE,
            BookIssuance::TABLE,
            Course::TABLE,
            TimetableEntry::TABLE,
            CreditAward::TABLE,
            Company::TABLE,
            PlacementDrive::TABLE,
            Announcement::TABLE,
            Room::TABLE,
            RoomAllocation::TABLE,
        ] {
            assert!(is_known_table(table), "{table} missing from TABLES");
        }
    }

    #[test]
    fn search_fields_never_include_the_id() {
        assert!(!Student::SEARCH.contains(&"id"));
        assert!(!FeeRecord::SEARCH.contains(&"id"));
    }
}
