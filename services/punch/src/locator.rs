//! Location requests bounded by a timeout and a maximum fix age

use async_trait::async_trait;
use client::models::Coordinates;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::capabilities::{LocationError, Locator, PermissionStatus, PositionOptions};

/// Wraps a location provider, reusing a recent fix and giving up after the
/// requested timeout
pub struct BoundedLocator<L> {
    inner: L,
    last_fix: Mutex<Option<(Instant, Coordinates)>>,
}

impl<L: Locator> BoundedLocator<L> {
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            last_fix: Mutex::new(None),
        }
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }
}

#[async_trait]
impl<L: Locator> Locator for BoundedLocator<L> {
    async fn request_permission(&self) -> PermissionStatus {
        self.inner.request_permission().await
    }

    async fn current_position(
        &self,
        options: &PositionOptions,
    ) -> Result<Coordinates, LocationError> {
        let mut last_fix = self.last_fix.lock().await;

        if let Some((taken_at, coordinates)) = *last_fix {
            if taken_at.elapsed() <= options.maximum_age {
                debug!("Reusing location fix from {:?} ago", taken_at.elapsed());
                return Ok(coordinates);
            }
        }

        let coordinates =
            match tokio::time::timeout(options.timeout, self.inner.current_position(options)).await
            {
                Ok(result) => result?,
                Err(_) => {
                    warn!("Location request timed out after {:?}", options.timeout);
                    return Err(LocationError::Timeout(options.timeout));
                }
            };

        *last_fix = Some((Instant::now(), coordinates));
        Ok(coordinates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio_test::{assert_err, assert_ok};

    struct CountingLocator {
        calls: AtomicUsize,
        delay: Duration,
    }

    impl CountingLocator {
        fn new(delay: Duration) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                delay,
            }
        }
    }

    #[async_trait]
    impl Locator for CountingLocator {
        async fn request_permission(&self) -> PermissionStatus {
            PermissionStatus::Granted
        }

        async fn current_position(
            &self,
            _options: &PositionOptions,
        ) -> Result<Coordinates, LocationError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(Coordinates::new(10.0 + call as f64, 20.0))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_recent_fix_is_reused() {
        let locator = BoundedLocator::new(CountingLocator::new(Duration::ZERO));
        let options = PositionOptions::default();

        let first = assert_ok!(locator.current_position(&options).await);
        tokio::time::advance(Duration::from_secs(5)).await;
        let second = assert_ok!(locator.current_position(&options).await);

        assert_eq!(first, second);
        assert_eq!(locator.inner().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_fix_is_refreshed() {
        let locator = BoundedLocator::new(CountingLocator::new(Duration::ZERO));
        let options = PositionOptions::default();

        let first = assert_ok!(locator.current_position(&options).await);
        tokio::time::advance(Duration::from_secs(11)).await;
        let second = assert_ok!(locator.current_position(&options).await);

        assert_ne!(first, second);
        assert_eq!(locator.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_provider_times_out() {
        let locator = BoundedLocator::new(CountingLocator::new(Duration::from_secs(60)));
        let options = PositionOptions::default();

        let err = assert_err!(locator.current_position(&options).await);
        assert!(matches!(err, LocationError::Timeout(d) if d == Duration::from_secs(15)));
    }
}
