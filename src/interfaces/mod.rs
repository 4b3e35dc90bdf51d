//! Presentation adapters. Only CSV for now.

pub mod csv;
