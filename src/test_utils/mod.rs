//! Test doubles and fixtures for the notifier and its collaborators.

pub mod fakes;
pub mod fixtures;
pub mod http;
