use serde::Deserialize;

/// Strategy used to fill a key column the INSERT left out.
///
/// - `Snowflake`: time-ordered 64-bit ids (default).
/// - `Uuid`: random UUID text without dashes.
/// - `Increment`: process-local counter starting at `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KeyGenerateType {
    /// Snowflake ids, `worker_id` must fit in 10 bits.
    Snowflake {
        #[serde(default)]
        worker_id: u16,
    },
    /// UUID v4 text values.
    Uuid,
    /// Integer ids generated sequentially.
    Increment {
        #[serde(default = "first_increment")]
        start: i64,
    },
}

fn first_increment() -> i64 {
    1
}

impl Default for KeyGenerateType {
    fn default() -> Self {
        KeyGenerateType::Snowflake { worker_id: 0 }
    }
}
