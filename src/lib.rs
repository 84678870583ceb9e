#![forbid(unsafe_code)]

pub mod catalog;
pub mod config;
pub mod datamodel;
pub mod http;
pub mod images;
pub mod location;
pub mod notifications;
pub mod notifier;
pub mod storage;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
