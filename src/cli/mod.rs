//! Terminal front end for the `propval` commands

pub mod analyze;
pub mod invest;
pub mod quota;
pub mod setup;
pub mod ui;
