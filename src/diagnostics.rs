//! Render statistics and a ring buffer of recent warnings.
//!
//! Warnings are emitted through `tracing` like everything else. The card also
//! keeps the most recent ones in a [`DiagnosticsLog`] so a host without a
//! subscriber can still show why the card is degraded.

use heapless::{Deque, String};

use crate::render::RenderReport;

// =============================================================================
// Diagnostics Log Configuration
// =============================================================================

/// Maximum number of lines kept.
pub const LOG_BUFFER_SIZE: usize = 8;

/// Maximum characters per line.
pub const LOG_LINE_LENGTH: usize = 96;

// =============================================================================
// Render Statistics
// =============================================================================

/// Counters over the card's lifetime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Updates that rebuilt the view state.
    pub cycles_rendered: u64,
    /// Updates throttled by the scheduler.
    pub cycles_skipped: u64,
    /// Attribute writes applied by renders.
    pub patches_applied: u64,
    /// Fields compared equal and not written.
    pub fields_unchanged: u64,
    /// Patches of the most recent render.
    pub last_patch_count: usize,
    /// Animation frames advanced.
    pub frames_ticked: u64,
}

impl RenderStats {
    pub const fn new() -> Self {
        Self {
            cycles_rendered: 0,
            cycles_skipped: 0,
            patches_applied: 0,
            fields_unchanged: 0,
            last_patch_count: 0,
            frames_ticked: 0,
        }
    }

    pub const fn record_render(
        &mut self,
        report: &RenderReport,
    ) {
        self.cycles_rendered += 1;
        self.patches_applied += report.patches as u64;
        self.fields_unchanged += report.unchanged as u64;
        self.last_patch_count = report.patches;
    }

    pub const fn record_skip(&mut self) { self.cycles_skipped += 1; }

    pub const fn record_frame(&mut self) { self.frames_ticked += 1; }

    /// Share of compared fields that needed a write, in percent.
    pub fn write_ratio_percent(&self) -> f32 {
        let total = self.patches_applied + self.fields_unchanged;
        if total == 0 { 0.0 } else { self.patches_applied as f32 * 100.0 / total as f32 }
    }
}

// =============================================================================
// Diagnostics Log
// =============================================================================

/// Ring buffer of recent warnings, oldest first.
pub struct DiagnosticsLog {
    buffer: Deque<String<LOG_LINE_LENGTH>, LOG_BUFFER_SIZE>,
}

impl DiagnosticsLog {
    pub const fn new() -> Self { Self { buffer: Deque::new() } }

    /// Push a line. When full, the oldest line is dropped; long lines are
    /// truncated.
    pub fn push(
        &mut self,
        msg: &str,
    ) {
        if self.buffer.is_full() {
            self.buffer.pop_front();
        }

        let mut line: String<LOG_LINE_LENGTH> = String::new();
        for c in msg.chars() {
            if line.push(c).is_err() {
                break;
            }
        }

        self.buffer.push_back(line).ok();
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> { self.buffer.iter().map(|line| line.as_str()) }

    /// Most recent line.
    pub fn last(&self) -> Option<&str> { self.buffer.back().map(|line| line.as_str()) }

    #[inline]
    pub fn len(&self) -> usize { self.buffer.len() }

    #[inline]
    pub fn is_empty(&self) -> bool { self.buffer.is_empty() }

    pub fn clear(&mut self) { self.buffer.clear(); }
}

impl Default for DiagnosticsLog {
    fn default() -> Self { Self::new() }
}

impl std::fmt::Debug for DiagnosticsLog {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Log Tests
    // =========================================================================

    #[test]
    fn test_log_new_is_empty() {
        let log = DiagnosticsLog::new();
        assert!(log.is_empty());
        assert_eq!(log.len(), 0);
        assert_eq!(log.last(), None);
    }

    #[test]
    fn test_log_push_and_iter() {
        let mut log = DiagnosticsLog::new();
        log.push("first");
        log.push("second");
        assert_eq!(log.iter().collect::<Vec<_>>(), ["first", "second"]);
        assert_eq!(log.last(), Some("second"));
    }

    #[test]
    fn test_log_drops_oldest_when_full() {
        let mut log = DiagnosticsLog::new();
        for i in 0..LOG_BUFFER_SIZE + 2 {
            log.push(&format!("line {i}"));
        }
        assert_eq!(log.len(), LOG_BUFFER_SIZE);
        assert_eq!(log.iter().next(), Some("line 2"), "two oldest lines dropped");
    }

    #[test]
    fn test_log_truncates_long_lines() {
        let mut log = DiagnosticsLog::new();
        log.push(&"x".repeat(LOG_LINE_LENGTH * 2));
        assert_eq!(log.last().map(str::len), Some(LOG_LINE_LENGTH));
    }

    #[test]
    fn test_log_clear() {
        let mut log = DiagnosticsLog::default();
        log.push("a");
        log.clear();
        assert!(log.is_empty());
    }

    // =========================================================================
    // Stats Tests
    // =========================================================================

    #[test]
    fn test_stats_record_render() {
        let mut stats = RenderStats::new();
        stats.record_render(&RenderReport { patches: 30, unchanged: 0, full: true });
        stats.record_render(&RenderReport { patches: 2, unchanged: 98, full: false });
        stats.record_skip();

        assert_eq!(stats.cycles_rendered, 2);
        assert_eq!(stats.cycles_skipped, 1);
        assert_eq!(stats.patches_applied, 32);
        assert_eq!(stats.last_patch_count, 2);
        assert!((stats.write_ratio_percent() - 24.615_385).abs() < 1e-3);
    }

    #[test]
    fn test_stats_ratio_without_renders() {
        assert_eq!(RenderStats::default().write_ratio_percent(), 0.0);
    }
}
