//! RR 间期窗口与 HRV (SDNN) 计算
//!
//! 每接受一个新的 RR 间期都在当前窗口上从头重算统计量，
//! 不做增量更新，因此不存在累计误差。

use std::collections::VecDeque;

use serde::Serialize;

use crate::constants::MILLIS_PER_MINUTE;

/// 心率与 HRV 统计
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HrvStats {
    /// 平均 RR 间期（毫秒）
    pub mean_rr_ms: f64,
    /// 心率（次/分钟）
    pub heart_rate: f64,
    /// SDNN（毫秒）
    pub sdnn_ms: f64,
    /// 参与计算的间期数
    pub count: usize,
}

/// 在给定间期序列上计算统计量，空序列返回 None
pub fn compute_stats<'a, I>(intervals: I) -> Option<HrvStats>
where
    I: IntoIterator<Item = &'a u64>,
    I::IntoIter: Clone,
{
    let iter = intervals.into_iter();
    let count = iter.clone().count();
    if count == 0 {
        return None;
    }

    let mean_rr_ms = iter.clone().map(|&rr| rr as f64).sum::<f64>() / count as f64;
    if mean_rr_ms <= 0.0 {
        return None;
    }
    let variance = iter
        .map(|&rr| (rr as f64 - mean_rr_ms).powi(2))
        .sum::<f64>()
        / count as f64;

    Some(HrvStats {
        mean_rr_ms,
        heart_rate: MILLIS_PER_MINUTE / mean_rr_ms,
        sdnn_ms: variance.sqrt(),
        count,
    })
}

/// push_interval 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RrOutcome {
    Accepted,
    /// 超出生理合理范围，窗口保持不变
    Rejected,
}

/// 最近 M 个 RR 间期的 FIFO 窗口
#[derive(Debug, Clone)]
pub struct RrWindow {
    intervals: VecDeque<u64>,
    capacity: usize,
    min_ms: u64,
    max_ms: u64,
    min_for_stats: usize,
    stats: Option<HrvStats>,
}

impl RrWindow {
    pub fn new(capacity: usize, min_ms: u64, max_ms: u64, min_for_stats: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            intervals: VecDeque::with_capacity(capacity),
            capacity,
            min_ms,
            max_ms,
            min_for_stats,
            stats: None,
        }
    }

    pub fn push_interval(&mut self, rr_ms: u64) -> RrOutcome {
        if rr_ms < self.min_ms || rr_ms > self.max_ms {
            return RrOutcome::Rejected;
        }

        self.intervals.push_back(rr_ms);
        while self.intervals.len() > self.capacity {
            self.intervals.pop_front();
        }

        self.stats = if self.intervals.len() >= self.min_for_stats {
            compute_stats(&self.intervals)
        } else {
            None
        };
        RrOutcome::Accepted
    }

    /// 最近一次接受间期后计算的统计量，不足 min_for_stats 时为 None
    pub fn stats(&self) -> Option<HrvStats> {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn intervals(&self) -> impl Iterator<Item = &u64> + Clone {
        self.intervals.iter()
    }

    pub fn clear(&mut self) {
        self.intervals.clear();
        self.stats = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> RrWindow {
        RrWindow::new(30, 300, 1500, 10)
    }

    #[test]
    fn constant_intervals_have_zero_sdnn() {
        let mut w = window();
        for _ in 0..12 {
            w.push_interval(800);
        }
        let stats = w.stats().expect("stats");
        assert_eq!(stats.mean_rr_ms, 800.0);
        assert_eq!(stats.heart_rate, 75.0);
        assert_eq!(stats.sdnn_ms, 0.0);
    }

    #[test]
    fn sdnn_is_population_std_dev() {
        let s = compute_stats(&[700_u64, 900]).unwrap();
        assert_eq!(s.mean_rr_ms, 800.0);
        assert_eq!(s.sdnn_ms, 100.0);
    }

    #[test]
    fn stats_withheld_until_minimum_count() {
        let mut w = window();
        for _ in 0..9 {
            w.push_interval(800);
        }
        assert!(w.stats().is_none());
        w.push_interval(800);
        assert!(w.stats().is_some());
    }

    #[test]
    fn implausible_intervals_leave_window_unchanged() {
        let mut w = window();
        for rr in [780, 820, 800, 790, 810, 805, 795, 800, 815, 785] {
            w.push_interval(rr);
        }
        let before: Vec<u64> = w.intervals().copied().collect();
        let stats_before = w.stats();

        assert_eq!(w.push_interval(100), RrOutcome::Rejected);
        assert_eq!(w.push_interval(2000), RrOutcome::Rejected);

        let after: Vec<u64> = w.intervals().copied().collect();
        assert_eq!(before, after);
        assert_eq!(stats_before, w.stats());
    }

    #[test]
    fn bounds_are_inclusive() {
        let mut w = window();
        assert_eq!(w.push_interval(300), RrOutcome::Accepted);
        assert_eq!(w.push_interval(1500), RrOutcome::Accepted);
        assert_eq!(w.push_interval(299), RrOutcome::Rejected);
        assert_eq!(w.push_interval(1501), RrOutcome::Rejected);
    }

    #[test]
    fn window_evicts_oldest() {
        let mut w = RrWindow::new(3, 300, 1500, 2);
        for rr in [400, 500, 600, 700] {
            w.push_interval(rr);
        }
        let kept: Vec<u64> = w.intervals().copied().collect();
        assert_eq!(kept, vec![500, 600, 700]);
        assert_eq!(w.stats().unwrap().mean_rr_ms, 600.0);
    }
}
