#![forbid(unsafe_code)]
//! certo-core library: domain model, execution gate engine, and the SQLite
//! project store.
//!
//! # Conventions
//!
//! - **Errors**: `anyhow::Result` at I/O seams, typed [`error::CertoError`]
//!   for domain failures the CLI maps to stable codes.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `error!`, `debug!`).

pub mod checklist;
pub mod config;
pub mod db;
pub mod error;
pub mod gate;
pub mod model;

/// Current time in microseconds since the epoch, the store's clock unit.
#[must_use]
pub fn now_us() -> i64 {
    chrono::Utc::now().timestamp_micros()
}

#[cfg(test)]
mod tests {
    #[test]
    fn now_us_is_monotonic_enough() {
        let a = super::now_us();
        let b = super::now_us();
        assert!(b >= a);
    }
}
