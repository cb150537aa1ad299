//! Pseudo-random field generation for synthetic records.
//!
//! Not cryptographically secure; the values only exist to produce write load.

use rand::distr::Alphanumeric;
use rand::Rng;

use crate::models::NewRecord;

pub const MIN_FIELD_LEN: usize = 8;
pub const MAX_FIELD_LEN: usize = 12;

/// Returns a string whose length is uniform in `[min_len, max_len]` and whose
/// characters are uniform over `A-Z`, `a-z` and `0-9`.
pub fn generate_field(min_len: usize, max_len: usize) -> String {
    let (lo, hi) = if min_len <= max_len {
        (min_len, max_len)
    } else {
        (max_len, min_len)
    };

    let mut rng = rand::rng();
    let len = rng.random_range(lo..=hi);
    (0..len)
        .map(|_| char::from(rng.sample(Alphanumeric)))
        .collect()
}

pub fn generate_default_field() -> String {
    generate_field(MIN_FIELD_LEN, MAX_FIELD_LEN)
}

/// Two independent fields per record; they may coincide.
pub fn generate_record() -> NewRecord {
    NewRecord::new(generate_default_field(), generate_default_field())
}

/// 供 [`RecordStore::insert_batch`](crate::RecordStore::insert_batch) 使用的随机记录源
pub fn random_record(_index: u64) -> NewRecord {
    generate_record()
}
