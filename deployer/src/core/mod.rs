//! Pure pipeline logic: stages, failure policies, and command descriptions.

pub mod command;
pub mod types;
