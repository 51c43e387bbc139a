// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Deterministic campus sample data for `--demo` mode and tests. The same
//! seed always produces the same rows, so demo walkthroughs and assertions
//! stay stable.

use anyhow::{Context, Result};
use serde_json::{Value, json};
use time::macros::date;
use time::{Date, Duration};

use alma_app::credentials::issue_credentials;
use alma_app::model::loan_due_date;
use alma_app::timefmt::format_date;
use alma_store::{Gateway, Row};

const FIRST_NAMES: [&str; 16] = [
    "Meera", "Arjun", "Divya", "Rahul", "Ananya", "Vikram", "Sneha", "Karthik", "Priya", "Rohan",
    "Lakshmi", "Aditya", "Kavya", "Nikhil", "Ishita", "Sanjay",
];
const LAST_NAMES: [&str; 14] = [
    "Nair", "Rao", "Menon", "Sharma", "Iyer", "Patel", "Reddy", "Gupta", "Krishnan", "Verma",
    "Das", "Pillai", "Joshi", "Bose",
];
const DEPARTMENTS: [&str; 6] = [
    "Computer Science",
    "Electronics",
    "Mechanical",
    "Civil",
    "Physics",
    "Mathematics",
];

const BOOKS: [(&str, &str, &str, &str); 10] = [
    ("Introduction to Algorithms", "Cormen", "978-0262033848", "Core"),
    ("Operating System Concepts", "Silberschatz", "978-1118063330", "Core"),
    ("Computer Networks", "Tanenbaum", "978-0132126953", "Core"),
    ("Clean Code", "Martin", "978-0132350884", "Practice"),
    ("Database System Concepts", "Korth", "978-0078022159", "Core"),
    ("Structure and Interpretation", "Abelson", "978-0262510875", "Classics"),
    ("The C Programming Language", "Kernighan", "978-0131103627", "Classics"),
    ("Artificial Intelligence", "Russell", "978-0134610993", "Electives"),
    ("Digital Design", "Mano", "978-0134549897", "Electronics"),
    ("Engineering Mechanics", "Hibbeler", "978-0133918922", "Mechanical"),
];

const COURSES: [(&str, &str, &str, i64, i64); 8] = [
    ("CS201", "Data Structures", "Computer Science", 4, 3),
    ("CS204", "Operating Systems", "Computer Science", 4, 4),
    ("CS301", "Computer Networks", "Computer Science", 3, 5),
    ("EC202", "Digital Circuits", "Electronics", 4, 3),
    ("ME210", "Thermodynamics", "Mechanical", 3, 3),
    ("MA102", "Linear Algebra", "Mathematics", 2, 2),
    ("PH101", "Engineering Physics", "Physics", 3, 1),
    ("CE205", "Structural Analysis", "Civil", 4, 4),
];

const COMPANIES: [(&str, &str); 6] = [
    ("Trellis Systems", "Software"),
    ("Meridian Analytics", "Data"),
    ("Kestrel Semiconductors", "Hardware"),
    ("BlueFern Labs", "Biotech"),
    ("Northgate Infra", "Construction"),
    ("Paperbark Finance", "Fintech"),
];

const DRIVE_ROLES: [&str; 5] = [
    "Graduate Engineer",
    "Software Developer",
    "Data Analyst",
    "Design Trainee",
    "QA Engineer",
];

const ANNOUNCEMENTS: [(&str, &str, &str); 5] = [
    (
        "Mid-semester exam schedule",
        "Hall allocation is posted outside the registrar office.",
        "students",
    ),
    (
        "Library timings extended",
        "The reading hall stays open until 23:00 during exam weeks.",
        "everyone",
    ),
    (
        "Placement drive registrations open",
        "Final-year students can register on the placement portal.",
        "students",
    ),
    (
        "Faculty meeting rescheduled",
        "The departmental review moves to Friday 15:00.",
        "faculty",
    ),
    (
        "Hostel water maintenance",
        "Block B supply is off on Saturday morning.",
        "everyone",
    ),
];

const HOSTEL_BLOCKS: [&str; 3] = ["A", "B", "C"];

const REFERENCE_DATE: Date = date!(2026 - 07 - 01);

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DemoSummary {
    pub students: usize,
    pub fees: usize,
    pub books: usize,
    pub issuances: usize,
    pub courses: usize,
    pub timetable: usize,
    pub credit_awards: usize,
    pub companies: usize,
    pub drives: usize,
    pub announcements: usize,
    pub rooms: usize,
    pub allocations: usize,
}

fn object(value: Value) -> Row {
    value.as_object().expect("demo row is an object").clone()
}

fn inserted_id(row: &Row) -> i64 {
    row.get("id").and_then(Value::as_i64).unwrap_or(0)
}

/// Seeds a fresh gateway with a coherent campus: students with fees, a
/// library with live and overdue loans, a timetable, companies with
/// drives, and a part-occupied hostel.
pub fn seed_demo(gateway: &dyn Gateway) -> Result<DemoSummary> {
    let mut rng = DeterministicRng::new(2026);
    let mut summary = DemoSummary::default();

    let mut student_ids = Vec::new();
    let mut student_names = Vec::new();
    for index in 0..12 {
        let first = FIRST_NAMES[rng.int_n(FIRST_NAMES.len())];
        let last = LAST_NAMES[rng.int_n(LAST_NAMES.len())];
        let name = format!("{first} {last}");
        let department = DEPARTMENTS[rng.int_n(DEPARTMENTS.len())];
        let issued = issue_credentials(
            department,
            2026,
            index as i64 + 1,
            time::macros::datetime!(2026-07-01 09:00 UTC),
        )?;
        let row = gateway
            .insert(
                "students",
                object(json!({
                    "roll_no": issued.roll_no,
                    "name": name,
                    "email": format!(
                        "{}.{}@college.edu",
                        first.to_lowercase(),
                        last.to_lowercase()
                    ),
                    "phone": format!("98{:08}", rng.int_n(99_999_999)),
                    "department": department,
                    "year": (rng.int_n(4) + 1) as i64,
                    "status": "active",
                    "password_sha256": issued.password_sha256,
                })),
            )
            .context("seed student")?;
        student_ids.push(inserted_id(&row));
        student_names.push(name);
        summary.students += 1;
    }

    // Even split of pending, half-paid, and settled fees.
    for (index, student_id) in student_ids.iter().enumerate() {
        let amount = [40_000i64, 50_000, 65_000, 80_000][rng.int_n(4)];
        let paid = match index % 3 {
            0 => 0,
            1 => amount / 2,
            _ => amount,
        };
        let due = REFERENCE_DATE + Duration::days((rng.int_n(120) as i64) - 30);
        gateway
            .insert(
                "fees",
                object(json!({
                    "student_id": student_id,
                    "student_name": student_names[index],
                    "category": (["tuition", "hostel", "exam"][rng.int_n(3)]),
                    "amount_cents": amount,
                    "paid_cents": paid,
                    "due_date": format_date(due),
                })),
            )
            .context("seed fee")?;
        summary.fees += 1;
    }

    let mut book_ids = Vec::new();
    for (title, author, isbn, category) in BOOKS {
        let row = gateway
            .insert(
                "books",
                object(json!({
                    "title": title,
                    "author": author,
                    "isbn": isbn,
                    "category": category,
                    "total_copies": (rng.int_n(4) + 2) as i64,
                })),
            )
            .context("seed book")?;
        book_ids.push((inserted_id(&row), title));
        summary.books += 1;
    }

    // Mix of healthy loans, overdue loans, and completed returns.
    let loan_ages = [10i64, 8, 20, 5, 18, 3];
    for (index, days_ago) in loan_ages.into_iter().enumerate() {
        let (book_id, title) = book_ids[rng.int_n(book_ids.len())];
        let student = rng.int_n(student_ids.len());
        let issued_on = REFERENCE_DATE - Duration::days(days_ago);
        let returned = index < 2;
        gateway
            .insert(
                "book_issuances",
                object(json!({
                    "book_id": book_id,
                    "book_title": title,
                    "student_id": student_ids[student],
                    "student_name": student_names[student],
                    "issued_on": format_date(issued_on),
                    "due_on": format_date(loan_due_date(issued_on)),
                    "returned_on": if returned {
                        Value::String(format_date(issued_on + Duration::days(10)))
                    } else {
                        Value::Null
                    },
                })),
            )
            .context("seed issuance")?;
        summary.issuances += 1;
    }

    let mut course_codes = Vec::new();
    for (code, title, department, credits, semester) in COURSES {
        let faculty = format!(
            "Prof. {}",
            LAST_NAMES[rng.int_n(LAST_NAMES.len())]
        );
        gateway
            .insert(
                "courses",
                object(json!({
                    "code": code,
                    "title": title,
                    "department": department,
                    "credits": credits,
                    "semester": semester,
                    "faculty_name": faculty,
                })),
            )
            .context("seed course")?;
        course_codes.push((code, faculty.clone()));
        summary.courses += 1;
    }

    for (index, (code, faculty)) in course_codes.iter().enumerate() {
        let day = ["mon", "tue", "wed", "thu", "fri", "sat"][index % 6];
        let start_hour = 9 + (index % 4) as i64;
        gateway
            .insert(
                "timetable",
                object(json!({
                    "course_code": code,
                    "day": day,
                    "starts_at": format!("{start_hour:02}:00"),
                    "ends_at": format!("{:02}:00", start_hour + 1),
                    "room": format!("LH-{}", rng.int_n(6) + 1),
                    "faculty_name": faculty,
                })),
            )
            .context("seed timetable entry")?;
        summary.timetable += 1;
    }

    for student in 0..student_ids.len() {
        if student % 3 == 2 {
            continue;
        }
        let (code, _) = course_codes[rng.int_n(course_codes.len())];
        gateway
            .insert(
                "credit_awards",
                object(json!({
                    "student_id": student_ids[student],
                    "student_name": student_names[student],
                    "course_code": code,
                    "credits": (rng.int_n(3) + 2) as i64,
                    "grade": (["A+", "A", "B+", "B", "C"][rng.int_n(5)]),
                    "awarded_on": format_date(REFERENCE_DATE - Duration::days(30)),
                })),
            )
            .context("seed credit award")?;
        summary.credit_awards += 1;
    }

    let mut company_ids = Vec::new();
    for (name, industry) in COMPANIES {
        let row = gateway
            .insert(
                "companies",
                object(json!({
                    "name": name,
                    "industry": industry,
                    "website": format!(
                        "https://{}.example.com",
                        name.split_whitespace().next().unwrap_or("company").to_lowercase()
                    ),
                    "contact_email": format!(
                        "campus@{}.example.com",
                        name.split_whitespace().next().unwrap_or("company").to_lowercase()
                    ),
                })),
            )
            .context("seed company")?;
        company_ids.push((inserted_id(&row), name));
        summary.companies += 1;
    }

    for index in 0..5 {
        let (company_id, name) = company_ids[rng.int_n(company_ids.len())];
        let status = ["scheduled", "scheduled", "completed"][index % 3];
        gateway
            .insert(
                "placement_drives",
                object(json!({
                    "company_id": company_id,
                    "company_name": name,
                    "role_title": DRIVE_ROLES[rng.int_n(DRIVE_ROLES.len())],
                    "package_cents": ((rng.int_n(8) + 4) as i64) * 10_000_000,
                    "drive_date": format_date(REFERENCE_DATE + Duration::days((index as i64) * 14 - 21)),
                    "min_cgpa_tenths": ([60i64, 65, 70, 75][rng.int_n(4)]),
                    "status": status,
                    "offers_made": if status == "completed" { (rng.int_n(6) + 1) as i64 } else { 0 },
                })),
            )
            .context("seed placement drive")?;
        summary.drives += 1;
    }

    for (index, (title, body, audience)) in ANNOUNCEMENTS.iter().enumerate() {
        gateway
            .insert(
                "announcements",
                object(json!({
                    "title": title,
                    "body": body,
                    "audience": audience,
                    "author_id": 1,
                    "author_name": "Registrar Office",
                    "posted_on": format_date(REFERENCE_DATE - Duration::days(index as i64)),
                })),
            )
            .context("seed announcement")?;
        summary.announcements += 1;
    }

    let mut room_ids = Vec::new();
    for block in HOSTEL_BLOCKS {
        for number in 1..=4 {
            let row = gateway
                .insert(
                    "rooms",
                    object(json!({
                        "block": block,
                        "number": format!("10{number}"),
                        "capacity": if number % 2 == 0 { 3 } else { 2 },
                    })),
                )
                .context("seed room")?;
            room_ids.push((inserted_id(&row), format!("{block}-10{number}")));
            summary.rooms += 1;
        }
    }

    for student in 0..6 {
        let (room_id, label) = &room_ids[student % room_ids.len()];
        gateway
            .insert(
                "room_allocations",
                object(json!({
                    "room_id": room_id,
                    "room_label": label,
                    "student_id": student_ids[student],
                    "student_name": student_names[student],
                    "allocated_on": format_date(REFERENCE_DATE - Duration::days(60)),
                })),
            )
            .context("seed room allocation")?;
        summary.allocations += 1;
    }

    Ok(summary)
}

/// A stable demo sign-in used when the config does not supply one.
pub fn demo_user_row() -> Row {
    object(json!({
        "user_id": 1,
        "role": "admin",
        "name": "Registrar Office",
        "email": "registrar@college.edu",
    }))
}

#[cfg(test)]
mod tests {
    use super::seed_demo;
    use alma_store::{Gateway, ListFilter, LocalGateway};

    #[test]
    fn seeding_fills_every_table_deterministically() {
        let gateway = LocalGateway::open_memory().expect("open");
        gateway.bootstrap().expect("bootstrap");

        let summary = seed_demo(&gateway).expect("seed");
        assert_eq!(summary.students, 12);
        assert_eq!(summary.books, 10);
        assert_eq!(summary.courses, 8);
        assert!(summary.fees >= 12);
        assert!(summary.rooms == 12);

        for table in alma_store::TABLES {
            let rows = gateway.list(table, &ListFilter::new()).expect("list");
            assert!(!rows.is_empty(), "{table} should be seeded");
        }

        // Same seed, same data.
        let second = LocalGateway::open_memory().expect("open");
        second.bootstrap().expect("bootstrap");
        let again = seed_demo(&second).expect("seed");
        assert_eq!(summary, again);

        let first_students = gateway.list("students", &ListFilter::new()).expect("list");
        let second_students = second.list("students", &ListFilter::new()).expect("list");
        assert_eq!(first_students, second_students);
    }
}
