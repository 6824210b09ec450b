//! Registration fee schedule.
//!
//! The tiers must agree with the fee the registry contract expects for
//! `register`; the client has no way to detect a disagreement.

use shared::domain::Wei;

use crate::error::WorkflowError;

pub const MIN_NAME_LEN: usize = 3;

const THREE_CHAR_PRICE: Wei = Wei::from_milli(500);
const FOUR_CHAR_PRICE: Wei = Wei::from_milli(300);
const LONG_NAME_PRICE: Wei = Wei::from_milli(100);

/// Length of a name as the fee schedule counts it (Unicode scalar values).
pub fn name_len(name: &str) -> usize {
    name.chars().count()
}

pub fn price(name: &str) -> Result<Wei, WorkflowError> {
    match name_len(name) {
        len if len < MIN_NAME_LEN => Err(WorkflowError::InvalidInput(format!(
            "name too short to register: '{name}' has {len} characters, minimum is {MIN_NAME_LEN}"
        ))),
        3 => Ok(THREE_CHAR_PRICE),
        4 => Ok(FOUR_CHAR_PRICE),
        _ => Ok(LONG_NAME_PRICE),
    }
}
