//! Background sampler thread lifecycle: joined on drop, no leaks, fresh samples.

use std::time::{Duration, Instant};

use stepguard_core::mocks::{NoRanger, ScriptedRanger};
use stepguard_core::{BackgroundSampler, DistanceSample, DistanceSampler};
use stepguard_traits::clock::MonotonicClock;

fn sampler_for(ranger: impl stepguard_traits::Ranger + Send + 'static, period_ms: u64) -> BackgroundSampler {
    BackgroundSampler::spawn(
        DistanceSampler::new(ranger, Duration::from_millis(30), 2),
        Duration::from_millis(period_ms),
        MonotonicClock::new(),
    )
}

fn wait_for_sample(s: &BackgroundSampler) -> Option<DistanceSample> {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if let Some(x) = s.latest() {
            return Some(x);
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    None
}

#[test]
fn sampler_thread_exits_on_drop() {
    let sampler = sampler_for(NoRanger, 10);
    std::thread::sleep(Duration::from_millis(30));
    // Drop joins the thread; this would hang if the loop ignored shutdown
    drop(sampler);
}

#[test]
fn multiple_samplers_dont_leak_threads() {
    for _ in 0..10 {
        let sampler = sampler_for(NoRanger, 5);
        let _ = wait_for_sample(&sampler);
        drop(sampler);
    }
}

#[test]
fn publishes_normalized_samples() {
    let sampler = sampler_for(ScriptedRanger::new([Some(1)]).repeat_last(), 5);
    // below the minimum clamp, raised to 2
    assert_eq!(wait_for_sample(&sampler), Some(DistanceSample::Cm(2)));
    assert!(sampler.published() >= 1);
}

#[test]
fn faulty_ranger_reads_as_no_echo() {
    let sampler = sampler_for(ScriptedRanger::from_echoes(std::iter::empty()).then_fault(), 5);
    assert_eq!(wait_for_sample(&sampler), Some(DistanceSample::NoEcho));
}
