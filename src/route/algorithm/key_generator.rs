use std::sync::{
    Mutex,
    atomic::{AtomicI64, Ordering},
};

use chrono::Utc;
use uuid::Uuid;

use crate::{config::KeyGenerateType, statement::SqlValue};

/// 2016-11-01T00:00:00Z in epoch milliseconds.
pub const SNOWFLAKE_EPOCH_MILLIS: i64 = 1_477_958_400_000;
const SEQUENCE_BITS: u32 = 12;
const WORKER_ID_BITS: u32 = 10;
const SEQUENCE_MASK: i64 = (1 << SEQUENCE_BITS) - 1;
const WORKER_ID_MASK: u16 = (1 << WORKER_ID_BITS) - 1;

#[derive(Debug, Default)]
struct SnowflakeState {
    last_millis: i64,
    sequence: i64,
}

/// 41-bit milliseconds since [`SNOWFLAKE_EPOCH_MILLIS`], 10-bit worker id,
/// 12-bit sequence.
#[derive(Debug)]
pub struct SnowflakeKeyGenerator {
    worker_id: i64,
    state: Mutex<SnowflakeState>,
}

impl SnowflakeKeyGenerator {
    pub fn new(worker_id: u16) -> Self {
        Self { worker_id: i64::from(worker_id & WORKER_ID_MASK), state: Mutex::new(SnowflakeState::default()) }
    }

    /// Allocates `count` increasing ids under a single lock.
    pub fn next_ids(&self, count: usize) -> Vec<i64> {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        (0..count).map(|_| self.next_id(&mut state)).collect()
    }

    fn next_id(&self, state: &mut SnowflakeState) -> i64 {
        // Never step back when the wall clock does.
        let mut now = Utc::now().timestamp_millis().max(state.last_millis);
        if now == state.last_millis {
            state.sequence = (state.sequence + 1) & SEQUENCE_MASK;
            if state.sequence == 0 {
                now = wait_until_after(state.last_millis);
            }
        } else {
            state.sequence = 0;
        }
        state.last_millis = now;
        ((now - SNOWFLAKE_EPOCH_MILLIS) << (SEQUENCE_BITS + WORKER_ID_BITS))
            | (self.worker_id << SEQUENCE_BITS)
            | state.sequence
    }
}

fn wait_until_after(millis: i64) -> i64 {
    loop {
        let now = Utc::now().timestamp_millis();
        if now > millis {
            return now;
        }
        std::hint::spin_loop();
    }
}

/// Source of values for a key column the INSERT leaves out.
#[derive(Debug)]
pub enum KeyGenerator {
    Snowflake(SnowflakeKeyGenerator),
    Uuid,
    Increment(AtomicI64),
}

impl KeyGenerator {
    pub fn new(generate_type: KeyGenerateType) -> Self {
        match generate_type {
            KeyGenerateType::Snowflake { worker_id } => KeyGenerator::Snowflake(SnowflakeKeyGenerator::new(worker_id)),
            KeyGenerateType::Uuid => KeyGenerator::Uuid,
            KeyGenerateType::Increment { start } => KeyGenerator::Increment(AtomicI64::new(start)),
        }
    }

    /// `count` distinct keys, one per INSERT row, in row order.
    pub fn generate_keys(&self, count: usize) -> Vec<SqlValue> {
        match self {
            KeyGenerator::Snowflake(snowflake) => snowflake.next_ids(count).into_iter().map(SqlValue::Int).collect(),
            KeyGenerator::Uuid => (0..count).map(|_| SqlValue::Text(Uuid::new_v4().simple().to_string())).collect(),
            KeyGenerator::Increment(next) => {
                let first = next.fetch_add(count as i64, Ordering::SeqCst);
                (0..count as i64).map(|i| SqlValue::Int(first + i)).collect()
            }
        }
    }
}
