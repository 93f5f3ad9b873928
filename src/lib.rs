//! Inflation explorer: projects how inflation, investment returns and monthly
//! contributions change a sum of money over time.
//!
//! [`core::project`] is the pure projection engine. [`api`] serves it over HTTP
//! and from the command line.

pub mod api;
pub mod core;
pub mod error;

pub use error::{Error, Result};
