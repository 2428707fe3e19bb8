// Copyright 2026 the Fabric Core Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-transaction phase timestamps.

use crate::time::{Duration, HostTime};

/// Timestamps of the phases that produced and mounted a transaction.
///
/// Unmeasured phases stay `None`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransactionTelemetry {
    /// Transaction function started.
    pub commit_start: Option<HostTime>,
    /// New revision swapped in.
    pub commit_end: Option<HostTime>,
    /// Layout started.
    pub layout_start: Option<HostTime>,
    /// Layout finished.
    pub layout_end: Option<HostTime>,
    /// Diff started.
    pub diff_start: Option<HostTime>,
    /// Diff finished.
    pub diff_end: Option<HostTime>,
    /// Consumer started applying.
    pub mount_start: Option<HostTime>,
    /// Consumer finished applying.
    pub mount_end: Option<HostTime>,
}

fn span(start: Option<HostTime>, end: Option<HostTime>) -> Option<Duration> {
    Some(end?.saturating_duration_since(start?))
}

fn earliest(a: Option<HostTime>, b: Option<HostTime>) -> Option<HostTime> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn latest(a: Option<HostTime>, b: Option<HostTime>) -> Option<HostTime> {
    a.max(b)
}

impl TransactionTelemetry {
    /// Time spent committing.
    #[must_use]
    pub fn commit_duration(&self) -> Option<Duration> {
        span(self.commit_start, self.commit_end)
    }

    /// Time spent in layout.
    #[must_use]
    pub fn layout_duration(&self) -> Option<Duration> {
        span(self.layout_start, self.layout_end)
    }

    /// Time spent diffing.
    #[must_use]
    pub fn diff_duration(&self) -> Option<Duration> {
        span(self.diff_start, self.diff_end)
    }

    /// Time spent mounting.
    #[must_use]
    pub fn mount_duration(&self) -> Option<Duration> {
        span(self.mount_start, self.mount_end)
    }

    /// Extends every phase to also cover `later`'s.
    pub fn widen(&mut self, later: &Self) {
        self.commit_start = earliest(self.commit_start, later.commit_start);
        self.commit_end = latest(self.commit_end, later.commit_end);
        self.layout_start = earliest(self.layout_start, later.layout_start);
        self.layout_end = latest(self.layout_end, later.layout_end);
        self.diff_start = earliest(self.diff_start, later.diff_start);
        self.diff_end = latest(self.diff_end, later.diff_end);
        self.mount_start = earliest(self.mount_start, later.mount_start);
        self.mount_end = latest(self.mount_end, later.mount_end);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_need_both_ends() {
        let t = TransactionTelemetry {
            commit_start: Some(HostTime(100)),
            commit_end: Some(HostTime(250)),
            layout_start: Some(HostTime(120)),
            ..TransactionTelemetry::default()
        };
        assert_eq!(t.commit_duration(), Some(Duration(150)));
        assert_eq!(t.layout_duration(), None);
        assert_eq!(t.mount_duration(), None);
    }

    #[test]
    fn widen_spans_both() {
        let mut first = TransactionTelemetry {
            commit_start: Some(HostTime(100)),
            commit_end: Some(HostTime(200)),
            ..TransactionTelemetry::default()
        };
        let second = TransactionTelemetry {
            commit_start: Some(HostTime(300)),
            commit_end: Some(HostTime(450)),
            diff_start: Some(HostTime(400)),
            diff_end: Some(HostTime(420)),
            ..TransactionTelemetry::default()
        };
        first.widen(&second);
        assert_eq!(first.commit_duration(), Some(Duration(350)));
        assert_eq!(first.diff_duration(), Some(Duration(20)));
    }
}
