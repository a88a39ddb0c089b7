use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

/// Spaces out requests to the dictionary: every caller of [`wait`](Throttle::wait) leaves at
/// least `interval` after the previous one, whichever task that was.
pub struct Throttle {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self { interval, last: Mutex::new(None) }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub async fn wait(&self) {
        if self.interval.is_zero() {
            return;
        }
        let mut last = self.last.lock().await;
        if let Some(prev) = *last {
            sleep_until(prev + self.interval).await;
        }
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn first_call_is_free_then_spaced() {
        let t = Throttle::new(Duration::from_millis(40));
        let start = std::time::Instant::now();
        t.wait().await;
        assert!(start.elapsed() < Duration::from_millis(40));
        t.wait().await;
        t.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(80));
    }

    #[tokio::test]
    async fn shared_across_tasks() {
        let t = Arc::new(Throttle::new(Duration::from_millis(30)));
        let start = std::time::Instant::now();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let t = t.clone();
                tokio::spawn(async move { t.wait().await })
            })
            .collect();
        for h in handles {
            h.await.unwrap();
        }
        assert!(start.elapsed() >= Duration::from_millis(90));
    }

    #[tokio::test]
    async fn zero_interval_never_waits() {
        let t = Throttle::new(Duration::ZERO);
        let start = std::time::Instant::now();
        for _ in 0..5 {
            t.wait().await;
        }
        assert!(start.elapsed() < Duration::from_millis(20));
    }
}
