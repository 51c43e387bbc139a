// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Roll-number and first-login credential issuance for the registrar flow.
//! Only the SHA-256 digest of the password is ever stored; the plaintext is
//! shown once at registration time.

use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

const PASSWORD_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCredentials {
    pub roll_no: String,
    pub password: String,
    pub password_sha256: String,
}

/// Builds the short department code used in roll numbers: the uppercase
/// initials of the department name ("Computer Science" -> "CS").
pub fn department_code(department: &str) -> String {
    let code: String = department
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .map(|ch| ch.to_ascii_uppercase())
        .collect();
    if code.is_empty() {
        "GEN".to_owned()
    } else {
        code
    }
}

/// Issues a roll number and a temporary password. Callers must validate the
/// registration form first; nothing here is reversible once shown.
pub fn issue_credentials(
    department: &str,
    admission_year: i32,
    sequence: i64,
    issued_at: OffsetDateTime,
) -> anyhow::Result<IssuedCredentials> {
    let roll_no = format!(
        "{}{:02}-{:03}",
        department_code(department),
        admission_year.rem_euclid(100),
        sequence.max(1),
    );

    let stamp = issued_at
        .format(&Rfc3339)
        .map_err(|error| anyhow::anyhow!("format issuance timestamp: {error}"))?;
    let seed = sha256_hex(&format!("{roll_no}|{stamp}"));
    let password = seed[..PASSWORD_LEN].to_owned();
    let password_sha256 = sha256_hex(&password);

    Ok(IssuedCredentials {
        roll_no,
        password,
        password_sha256,
    })
}

pub fn sha256_hex(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}
