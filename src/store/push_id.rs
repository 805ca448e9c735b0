//! Chronologically ordered unique keys in the realtime database push-id format.
//!
//! A key is 8 characters of millisecond timestamp followed by 12 random
//! characters, all drawn from a 64-character alphabet whose ASCII order
//! matches digit order. Keys minted in the same millisecond reuse the random
//! part incremented by one so they still sort in creation order.
use chrono::Utc;
use std::sync::Mutex;
use uuid::Uuid;

const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";
const TIME_LEN: usize = 8;
const RANDOM_LEN: usize = 12;
// Bytes of a v4 UUID that carry no version/variant bits.
const RANDOM_BYTES: [usize; RANDOM_LEN] = [0, 1, 2, 3, 4, 5, 7, 9, 10, 11, 12, 13];

#[derive(Debug, Default)]
pub struct PushIdGenerator {
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    last_millis: Option<i64>,
    last_random: [u8; RANDOM_LEN],
}

impl PushIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> String {
        self.next_id_at(Utc::now().timestamp_millis())
    }

    pub fn next_id_at(&self, millis: i64) -> String {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.last_millis == Some(millis) {
            increment(&mut state.last_random);
        } else {
            state.last_random = fresh_random();
            state.last_millis = Some(millis);
        }

        let mut id = String::with_capacity(TIME_LEN + RANDOM_LEN);
        id.push_str(&encode_time(millis));
        for digit in state.last_random {
            id.push(PUSH_CHARS[digit as usize] as char);
        }
        id
    }
}

fn encode_time(millis: i64) -> String {
    let mut now = millis.max(0) as u64;
    let mut chars = [b'-'; TIME_LEN];
    for slot in chars.iter_mut().rev() {
        *slot = PUSH_CHARS[(now % 64) as usize];
        now /= 64;
    }
    chars.iter().map(|&c| c as char).collect()
}

fn fresh_random() -> [u8; RANDOM_LEN] {
    let bytes = *Uuid::new_v4().as_bytes();
    let mut digits = [0u8; RANDOM_LEN];
    for (digit, &idx) in digits.iter_mut().zip(RANDOM_BYTES.iter()) {
        *digit = bytes[idx] & 0x3f;
    }
    digits
}

/// Adds one to the random part. Wrapping needs 64^12 ids in one millisecond,
/// which would break the ordering, so it is asserted against.
fn increment(digits: &mut [u8; RANDOM_LEN]) {
    debug_assert!(
        digits.iter().any(|&d| d != 63),
        "push id random part would wrap within one millisecond"
    );
    for digit in digits.iter_mut().rev() {
        if *digit == 63 {
            *digit = 0;
        } else {
            *digit += 1;
            return;
        }
    }
}
