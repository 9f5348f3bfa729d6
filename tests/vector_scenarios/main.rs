//! End-to-end vector behavior across storage styles, stores and reloads

mod common;

mod bulk_access;
mod laws;
mod persistence;
mod plugins;
mod scenarios;
