//! Tests for the trigger engine
//!
//! Organized by feature area

mod delay_tests;
mod dispatcher_tests;
mod helpers;
mod walk_tests;
