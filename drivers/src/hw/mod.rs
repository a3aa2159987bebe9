//! Peripheral register descriptions.

pub mod iob_timer;
pub mod regmap;
pub mod test_counter;
