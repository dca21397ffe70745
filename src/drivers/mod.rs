//! Fixture-side drivers: indicator LED choreography and trigger buttons.

pub mod button;
pub mod indicator;
