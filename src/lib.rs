//! Payroll Liquidation Engine
//!
//! This crate aggregates employee attendance into worked hours and overtime,
//! computes gross salary, statutory deductions and net salary, drives each
//! liquidation through its approval/rejection/payment lifecycle, and settles
//! payroll runs together with their pension and health remittances.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod notify;
pub mod store;
