use std::convert::TryFrom;

use anyhow::{anyhow, Result};

pub fn to_u32(value: i64, field: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| anyhow!("{field} value {value} does not fit in u32"))
}

pub fn to_i32(value: i64, field: &str) -> Result<i32> {
    i32::try_from(value).map_err(|_| anyhow!("{field} value {value} does not fit in i32"))
}

pub fn parse_optional_u32(value: Option<i64>, field: &str) -> Result<Option<u32>> {
    value.map(|raw| to_u32(raw, field)).transpose()
}

pub fn parse_optional_i32(value: Option<i64>, field: &str) -> Result<Option<i32>> {
    value.map(|raw| to_i32(raw, field)).transpose()
}

/// SQLite stores booleans as integers; anything non-zero is true.
pub fn parse_optional_flag(value: Option<i64>) -> Option<bool> {
    value.map(|raw| raw != 0)
}
