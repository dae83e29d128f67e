//! # Utilities Module
//!
//! ## Purpose
//! Common utility functions and helpers used throughout the sunspot lookup
//! service for coordinate formatting, log-safe text handling and timing.
//!
//! ## Input/Output Specification
//! - **Input**: Various data types requiring common operations
//! - **Output**: Formatted labels, truncated text, elapsed durations
//! - **Functions**: Geographic formatting, text utilities, performance helpers

use crate::Coordinate;
use std::time::Instant;

/// Performance timer for measuring operation duration
pub struct Timer {
    start: Instant,
    name: String,
}

/// Text processing utilities
pub struct TextUtils;

/// Geographic formatting utilities
pub struct GeoUtils;

impl Timer {
    /// Start a new timer with a name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    /// Get elapsed time in milliseconds
    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    /// Stop timer and log duration
    pub fn stop(self) -> u64 {
        let elapsed = self.elapsed_ms();
        tracing::debug!("Timer '{}' completed in {}ms", self.name, elapsed);
        elapsed
    }
}

impl TextUtils {
    /// Truncate text to specified length with ellipsis; upstream error
    /// bodies go through this before landing in logs
    pub fn truncate(text: &str, max_length: usize) -> String {
        if text.len() <= max_length {
            text.to_string()
        } else {
            let cut = max_length.saturating_sub(3);
            let mut end = cut;
            while end > 0 && !text.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}...", &text[..end])
        }
    }
}

impl GeoUtils {
    /// Human-readable label for a coordinate pair, used when reverse
    /// geocoding cannot name the place
    pub fn coordinate_label(coord: Coordinate) -> String {
        format!("{:.4}, {:.4}", coord.lat, coord.lon)
    }
}
