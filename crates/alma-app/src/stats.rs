// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Derived stat panels. Everything here is a pure function of the current
//! collections; nothing is cached or stored, so the panels can never drift
//! from the rows they summarize.

use time::Date;

use crate::model::{
    Book, BookIssuance, CreditAward, DriveStatus, FeeRecord, FeeStatus, PlacementDrive, Room,
    RoomAllocation, Student, StudentStatus,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeeStats {
    pub total_billed_cents: i64,
    pub total_collected_cents: i64,
    pub total_pending_cents: i64,
    pub paid: usize,
    pub partial: usize,
    pub pending: usize,
    pub overdue: usize,
}

pub fn fee_stats(records: &[FeeRecord], today: Date) -> FeeStats {
    let mut stats = FeeStats::default();
    for record in records {
        stats.total_billed_cents += record.amount_cents;
        stats.total_collected_cents += record.paid_cents;
        stats.total_pending_cents += record.balance_cents();
        match record.status(today) {
            FeeStatus::Paid => stats.paid += 1,
            FeeStatus::Partial => stats.partial += 1,
            FeeStatus::Pending => stats.pending += 1,
            FeeStatus::Overdue => stats.overdue += 1,
        }
    }
    stats
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LibraryStats {
    pub titles: usize,
    pub total_copies: i64,
    pub issued: usize,
    pub available: i64,
    pub overdue: usize,
    pub outstanding_fine_cents: i64,
}

/// Copies of `book` not currently out on loan.
pub fn available_copies(book: &Book, issuances: &[BookIssuance]) -> i64 {
    let out = issuances
        .iter()
        .filter(|issue| issue.book_id == book.id && issue.is_active())
        .count() as i64;
    book.total_copies - out
}

pub fn library_stats(books: &[Book], issuances: &[BookIssuance], today: Date) -> LibraryStats {
    let mut stats = LibraryStats {
        titles: books.len(),
        ..LibraryStats::default()
    };
    for book in books {
        stats.total_copies += book.total_copies;
        stats.available += available_copies(book, issuances);
    }
    for issue in issuances {
        if issue.is_active() {
            stats.issued += 1;
            if today > issue.due_on {
                stats.overdue += 1;
            }
        }
        stats.outstanding_fine_cents += issue.fine_cents(today);
    }
    stats
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlacementStats {
    pub drives: usize,
    pub scheduled: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub offers_made: i64,
    pub highest_package_cents: i64,
}

pub fn placement_stats(drives: &[PlacementDrive]) -> PlacementStats {
    let mut stats = PlacementStats {
        drives: drives.len(),
        ..PlacementStats::default()
    };
    for drive in drives {
        match drive.status {
            DriveStatus::Scheduled => stats.scheduled += 1,
            DriveStatus::Completed => {
                stats.completed += 1;
                stats.offers_made += drive.offers_made;
            }
            DriveStatus::Cancelled => stats.cancelled += 1,
        }
        if drive.status != DriveStatus::Cancelled {
            stats.highest_package_cents = stats.highest_package_cents.max(drive.package_cents);
        }
    }
    stats
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CreditStats {
    pub awards: usize,
    pub total_credits: i64,
    /// Credit-weighted grade average on the ten-point scale, in hundredths.
    pub gpa_hundredths: i64,
}

pub fn credit_stats(awards: &[CreditAward]) -> CreditStats {
    let mut stats = CreditStats {
        awards: awards.len(),
        ..CreditStats::default()
    };
    let mut weighted_tenths = 0i64;
    for award in awards {
        stats.total_credits += award.credits;
        weighted_tenths += award.grade.points_tenths() * award.credits;
    }
    if stats.total_credits > 0 {
        stats.gpa_hundredths = weighted_tenths * 10 / stats.total_credits;
    }
    stats
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HostelStats {
    pub rooms: usize,
    pub capacity: i64,
    pub occupied: i64,
    pub vacant: i64,
}

pub fn room_occupancy(room: &Room, allocations: &[RoomAllocation]) -> i64 {
    allocations
        .iter()
        .filter(|allocation| allocation.room_id == room.id)
        .count() as i64
}

pub fn hostel_stats(rooms: &[Room], allocations: &[RoomAllocation]) -> HostelStats {
    let mut stats = HostelStats {
        rooms: rooms.len(),
        ..HostelStats::default()
    };
    for room in rooms {
        let occupied = room_occupancy(room, allocations);
        stats.capacity += room.capacity;
        stats.occupied += occupied;
        stats.vacant += (room.capacity - occupied).max(0);
    }
    stats
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DashboardCounts {
    pub students_active: usize,
    pub fees_pending: usize,
    pub books_overdue: usize,
    pub drives_scheduled: usize,
}

pub fn dashboard_counts(
    students: &[Student],
    fees: &[FeeRecord],
    issuances: &[BookIssuance],
    drives: &[PlacementDrive],
    today: Date,
) -> DashboardCounts {
    DashboardCounts {
        students_active: students
            .iter()
            .filter(|student| student.status == StudentStatus::Active)
            .count(),
        fees_pending: fees
            .iter()
            .filter(|fee| fee.balance_cents() > 0)
            .count(),
        books_overdue: issuances
            .iter()
            .filter(|issue| issue.is_active() && today > issue.due_on)
            .count(),
        drives_scheduled: drives
            .iter()
            .filter(|drive| drive.status == DriveStatus::Scheduled)
            .count(),
    }
}
