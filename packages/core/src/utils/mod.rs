//! Utility functions for Tekst Core
//!
//! This module provides common utility functions used across the codebase.

mod html;

pub use html::html_text;
