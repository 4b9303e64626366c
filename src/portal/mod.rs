//! Campus gateway (Dr.COM ePortal) access
//!
//! `urls` knows where each endpoint lives; `eportal` drives the requests and
//! turns responses into outcome records.

pub mod eportal;
pub mod urls;

pub use eportal::EPortal;
