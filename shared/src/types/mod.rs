//! Shared type definitions used across the intake workspace

pub mod error;

pub use error::CommonError;
