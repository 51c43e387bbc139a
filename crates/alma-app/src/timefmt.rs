// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Serde adapters for the wire formats the backend speaks: `YYYY-MM-DD`
//! dates and `HH:MM` times. Timestamps use `time::serde::rfc3339` directly.

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, Time};

pub const DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]");
pub const TIME_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[hour]:[minute]");

pub mod date {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};
    use time::Date;

    pub fn serialize<S: Serializer>(value: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        let formatted = value
            .format(super::DATE_FORMAT)
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Date::parse(&raw, super::DATE_FORMAT).map_err(D::Error::custom)
    }
}

pub mod date_option {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};
    use time::Date;

    pub fn serialize<S: Serializer>(
        value: &Option<Date>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(date) => {
                let formatted = date
                    .format(super::DATE_FORMAT)
                    .map_err(serde::ser::Error::custom)?;
                serializer.serialize_some(&formatted)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Date>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw {
            Some(raw) if !raw.is_empty() => Date::parse(&raw, super::DATE_FORMAT)
                .map(Some)
                .map_err(D::Error::custom),
            _ => Ok(None),
        }
    }
}

pub mod clock {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};
    use time::Time;

    pub fn serialize<S: Serializer>(value: &Time, serializer: S) -> Result<S::Ok, S::Error> {
        let formatted = value
            .format(super::TIME_FORMAT)
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Time, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Time::parse(&raw, super::TIME_FORMAT).map_err(D::Error::custom)
    }
}

pub fn format_date(value: Date) -> String {
    value.format(DATE_FORMAT).expect("date format is valid")
}

pub fn format_clock(value: Time) -> String {
    value.format(TIME_FORMAT).expect("time format is valid")
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use time::{Date, Month, Time};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Probe {
        #[serde(with = "super::date")]
        on: Date,
        #[serde(with = "super::date_option")]
        maybe: Option<Date>,
        #[serde(with = "super::clock")]
        at: Time,
    }

    #[test]
    fn date_and_clock_round_trip() {
        let probe = Probe {
            on: Date::from_calendar_date(2026, Month::July, 4).expect("valid date"),
            maybe: None,
            at: Time::from_hms(9, 30, 0).expect("valid time"),
        };
        let encoded = serde_json::to_string(&probe).expect("encode probe");
        assert!(encoded.contains("2026-07-04"));
        assert!(encoded.contains("09:30"));
        let decoded: Probe = serde_json::from_str(&encoded).expect("decode probe");
        assert_eq!(decoded, probe);
    }

    #[test]
    fn empty_optional_date_decodes_as_none() {
        let decoded: Probe =
            serde_json::from_str(r#"{"on":"2026-01-02","maybe":"","at":"14:00"}"#)
                .expect("decode probe");
        assert_eq!(decoded.maybe, None);
    }
}
