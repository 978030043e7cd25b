// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use sha2::{Digest, Sha256};

use crate::record::{DomainRecord, EventTime, SyncHash};

/// Fingerprints the display-relevant content of a record.
///
/// Covers summary, description, location, start, end, the all-day flag and reminders, in that
/// fixed order. Bookkeeping, metadata and the uid do not participate, so pushing a record never
/// changes its own hash.
#[must_use]
pub fn compute_hash(record: &DomainRecord) -> SyncHash {
    let mut hasher = Sha256::new();
    field(&mut hasher, &record.summary);
    field(&mut hasher, &record.description);
    field(&mut hasher, &record.location);
    field(&mut hasher, &time(record.start.as_ref()));
    field(&mut hasher, &time(record.end.as_ref()));
    field(&mut hasher, if record.all_day { "1" } else { "0" });
    match &record.reminders {
        None => field(&mut hasher, "-"),
        Some(reminders) => {
            let minutes = reminders
                .iter()
                .map(|r| r.minutes.to_string())
                .collect::<Vec<_>>()
                .join(",");
            field(&mut hasher, &format!("[{minutes}]"));
        }
    }
    SyncHash::new(format!("{:x}", hasher.finalize()))
}

// Length-prefixed.
fn field(hasher: &mut Sha256, value: &str) {
    hasher.update((value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

fn time(t: Option<&EventTime>) -> String {
    t.map(ToString::to_string).unwrap_or_default()
}
