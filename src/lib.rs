//! Library entry for langsync exposing the translation store for the binary and integration tests.

pub mod config;
pub mod i18n;
pub mod paths;
