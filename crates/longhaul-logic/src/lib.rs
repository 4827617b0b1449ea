//! Pure progression logic for Longhaul.
//!
//! This crate contains all progression rules that are independent of any
//! clock, store, or runtime. Functions take plain data and return results,
//! making them unit-testable and portable between the headless harness and
//! any future engine integration.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`accrual`] | Fractional accumulator converting a rate into unit drops |
//! | [`boost`] | Timed speed-boost record, phase derivation, value math |
//! | [`constants`] | Tuning values: clamps, caps, throttles, epsilon |
//! | [`drops`] | Drop candidates, unlock filtering, weighted selection |
//! | [`goals`] | Mission goals: kinds, tiers, mutation and claim rules |

pub mod accrual;
pub mod boost;
pub mod constants;
pub mod drops;
pub mod goals;
