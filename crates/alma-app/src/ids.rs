// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(i64);

        impl $name {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

entity_id!(StudentId);
entity_id!(FeeRecordId);
entity_id!(BookId);
entity_id!(BookIssuanceId);
entity_id!(CourseId);
entity_id!(TimetableEntryId);
entity_id!(CreditAwardId);
entity_id!(CompanyId);
entity_id!(PlacementDriveId);
entity_id!(AnnouncementId);
entity_id!(RoomId);
entity_id!(RoomAllocationId);
entity_id!(UserId);
