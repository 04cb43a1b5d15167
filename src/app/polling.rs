use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

/// Runs a task every `period` while visible.
///
/// The task runs once immediately, then on every tick while the page is
/// visible. Becoming visible again runs it at once and restarts the period.
/// Dropping the poller stops it.
pub struct Poller {
    visible: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Poller {
    pub fn spawn<F, Fut>(period: Duration, mut task: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (visible, mut visible_rx) = watch::channel(true);
        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if *visible_rx.borrow() {
                            task().await;
                        }
                    }
                    changed = visible_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        if *visible_rx.borrow_and_update() {
                            debug!("visible again, refreshing now");
                            task().await;
                            ticker.reset();
                        }
                    }
                }
            }
            debug!("poller stopped");
        });
        Self { visible, handle }
    }

    pub fn set_visible(&self, visible: bool) {
        self.visible.send_if_modified(|current| {
            let changed = *current != visible;
            *current = visible;
            changed
        });
    }

    pub fn is_visible(&self) -> bool {
        *self.visible.borrow()
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::time::sleep;

    fn counting_poller(period: Duration) -> (Poller, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let poller = Poller::spawn(period, move || {
            let seen = seen.clone();
            async move {
                seen.fetch_add(1, Ordering::SeqCst);
            }
        });
        (poller, count)
    }

    #[tokio::test(start_paused = true)]
    async fn polls_while_visible_and_stops_on_drop() {
        let (poller, count) = counting_poller(Duration::from_secs(30));
        sleep(Duration::from_secs(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        sleep(Duration::from_secs(30)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);

        poller.set_visible(false);
        sleep(Duration::from_secs(90)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);

        poller.set_visible(true);
        sleep(Duration::from_secs(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);

        drop(poller);
        sleep(Duration::from_secs(120)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }
}
