//! Peripheral Drivers
//!
//! Each peripheral is a static description handed to the register driver
//! core, plus a module `init`.
//!
//! # Available Peripherals
//!
//! - `test_counter`: counter device, up to two instances (feature `test-counter`)
//! - `iob_timer`: IOb timer, single instance (feature `iob-timer`)

// Peripheral selection based on Cargo features
cfg_if::cfg_if! {
    if #[cfg(all(feature = "test-counter", feature = "iob-timer"))] {
        pub mod iob_timer;
        pub mod test_counter;
    } else if #[cfg(feature = "test-counter")] {
        pub mod test_counter;
    } else if #[cfg(feature = "iob-timer")] {
        pub mod iob_timer;
    } else {
        compile_error!(
            "No peripheral selected!\n\
            Use: cargo build --features test-counter\n\
            Or:  cargo build --features iob-timer"
        );
    }
}
