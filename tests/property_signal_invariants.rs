use proptest::prelude::*;

use stress_scan::scan::{BlinkThresholds, RppgConfig};
use stress_scan::signal::blink::{update_blink, BlinkState};
use stress_scan::signal::hrv::{compute_stats, RrOutcome, RrWindow};
use stress_scan::signal::rppg::{push_sample, GreenWindow, PulseState};
use stress_scan::signal::stress::{classify, StressLevel};

/// 参考实现：逐帧检查"上一帧高于 open、本帧不高于 close、距上次眨眼超过 debounce"
fn reference_blinks(ears: &[(f64, u64)], t: &BlinkThresholds) -> u32 {
    let mut last_ear = 1.0;
    let mut last_blink: Option<u64> = None;
    let mut count = 0;
    for &(ear, ts) in ears {
        let debounced = last_blink.map_or(true, |b| ts - b > t.debounce_ms);
        if last_ear > t.open && ear <= t.close && debounced {
            count += 1;
            last_blink = Some(ts);
        }
        last_ear = ear;
    }
    count
}

fn ear_sequence() -> impl Strategy<Value = Vec<(f64, u64)>> {
    prop::collection::vec((0.05_f64..0.40, 1_u64..200), 1..300).prop_map(|steps| {
        let mut ts = 0;
        steps
            .into_iter()
            .map(|(ear, dt)| {
                ts += dt;
                (ear, ts)
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn pt_blink_count_matches_crossings(ears in ear_sequence()) {
        let thresholds = BlinkThresholds::default();
        let mut state = BlinkState::default();
        let mut detected = 0;
        for &(ear, ts) in &ears {
            if update_blink(&mut state, &thresholds, ear, ts) {
                detected += 1;
            }
        }
        prop_assert_eq!(detected, state.blink_count);
        prop_assert_eq!(state.blink_count, reference_blinks(&ears, &thresholds));
    }

    #[test]
    fn pt_sustained_closure_counts_once(closed_frames in 1_usize..120) {
        let thresholds = BlinkThresholds::default();
        let mut state = BlinkState::default();
        let mut ts = 0;
        update_blink(&mut state, &thresholds, 0.30, ts);
        for _ in 0..closed_frames {
            ts += 33;
            update_blink(&mut state, &thresholds, 0.10, ts);
        }
        prop_assert_eq!(state.blink_count, 1);
    }

    #[test]
    fn pt_sdnn_matches_recomputation(intervals in prop::collection::vec(100_u64..2_000, 1..120)) {
        let mut window = RrWindow::new(30, 300, 1_500, 10);
        let mut accepted: Vec<u64> = Vec::new();
        for rr in intervals {
            let before = window.stats();
            match window.push_interval(rr) {
                RrOutcome::Accepted => {
                    accepted.push(rr);
                    if accepted.len() > 30 {
                        accepted.remove(0);
                    }
                }
                RrOutcome::Rejected => {
                    prop_assert!(!(300..=1_500).contains(&rr));
                    prop_assert_eq!(window.stats(), before);
                }
            }
            prop_assert_eq!(window.len(), accepted.len());
            if accepted.len() >= 10 {
                let expected = compute_stats(accepted.iter()).unwrap();
                let actual = window.stats().unwrap();
                prop_assert!((actual.sdnn_ms - expected.sdnn_ms).abs() < 1e-9);
                prop_assert!((actual.heart_rate - expected.heart_rate).abs() < 1e-9);
            } else {
                prop_assert!(window.stats().is_none());
            }
        }
    }

    #[test]
    fn pt_green_window_is_bounded(values in prop::collection::vec(0.0_f64..255.0, 0..1_200)) {
        let config = RppgConfig::default();
        let mut window = GreenWindow::new(config.green_window_capacity);
        let mut pulse = PulseState::default();
        let mut rr = RrWindow::new(
            config.rr_window_capacity,
            config.rr_min_ms,
            config.rr_max_ms,
            config.min_rr_for_stats,
        );
        let mut last_peak: Option<u64> = None;
        for (i, v) in values.into_iter().enumerate() {
            let now = i as u64 * 33;
            if let Some(peak) = push_sample(&mut window, &mut pulse, &mut rr, &config, v, now) {
                if let Some(prev) = last_peak {
                    prop_assert!(peak.timestamp_ms - prev >= config.refractory_ms);
                }
                last_peak = Some(peak.timestamp_ms);
            }
            prop_assert!(window.len() <= config.green_window_capacity);
            prop_assert!(rr.len() <= config.rr_window_capacity);
        }
    }

    #[test]
    fn pt_classification_is_monotonic_without_hrv(a in 0.0_f64..80.0, b in 0.0_f64..80.0) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let rank = |l: StressLevel| match l {
            StressLevel::Low => 0,
            StressLevel::Moderate => 1,
            StressLevel::High => 2,
        };
        prop_assert!(rank(classify(lo, None)) <= rank(classify(hi, None)));
    }

    #[test]
    fn pt_high_hrv_never_changes_band(rate in 0.0_f64..80.0, hrv in 30.0_f64..200.0) {
        prop_assert_eq!(classify(rate, Some(hrv)), classify(rate, None));
    }
}
