//! Core data types for one aggregation run.
//!
//! Records are kept as [`serde_json::Value`], a tagged recursive value
//! (object / array / scalar), because the study schema is not fixed here.

use serde_json::Value;

/// A 1-indexed, inclusive range of result positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankWindow {
    pub min_rank: u64,
    pub max_rank: u64,
}

impl RankWindow {
    /// The first window, `(1, page_size)`.
    pub fn first(page_size: u64) -> Self {
        Self {
            min_rank: 1,
            max_rank: page_size,
        }
    }

    pub fn size(&self) -> u64 {
        self.max_rank - self.min_rank + 1
    }

    /// Shift both bounds forward by one full window.
    pub fn advance(&mut self) {
        let size = self.size();
        self.min_rank += size;
        self.max_rank += size;
    }
}

/// One decoded API reply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseEnvelope {
    pub total_found: u64,
    pub records: Vec<Value>,
}

/// The API reported a total that differs from the first one seen this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InconsistentTotal {
    pub window: RankWindow,
    pub expected: u64,
    pub reported: u64,
}

/// Records gathered across every window, in arrival order.
#[derive(Debug, Clone, Default)]
pub struct AccumulatedResult {
    pub records: Vec<Value>,
    /// First observed total; drives loop termination.
    pub total_found: u64,
    pub windows_fetched: u64,
    pub total_drift: Vec<InconsistentTotal>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_advances_by_its_size() {
        let mut w = RankWindow::first(100);
        assert_eq!(w.size(), 100);
        w.advance();
        assert_eq!(w, RankWindow { min_rank: 101, max_rank: 200 });
        w.advance();
        assert_eq!(w, RankWindow { min_rank: 201, max_rank: 300 });
    }
}
