use std::time::Duration;
use std::thread;
use rand::Rng;
use log::info;

/// Length of the next failure cooldown: `base` plus up to `jitter` of random slack.
pub fn cooldown_duration(base: Duration, jitter: Duration) -> Duration {
    if jitter.is_zero() {
        return base;
    }
    let mut rng = rand::thread_rng();
    let extra_ms = rng.gen_range(0..=jitter.as_millis() as u64);
    base + Duration::from_millis(extra_ms)
}

pub fn failure_cooldown(base: Duration, jitter: Duration) {
    let delay = cooldown_duration(base, jitter);
    if delay.is_zero() {
        return;
    }
    info!("Waiting for {:.1} seconds (Failure Cooldown)...", delay.as_secs_f64());
    thread::sleep(delay);
}
