//! Generic value-settling utility: propagates the most recent input only
//! after it has stayed unchanged for a configured delay. Used by the city
//! suggestion flow to keep keystrokes from turning into search requests.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};

enum Input<T> {
    Value(T),
    Delay(Duration),
}

/// Feeding side of a debouncer. Dropping it cancels any pending window
/// without emitting.
#[derive(Debug, Clone)]
pub struct DebounceInput<T> {
    tx: mpsc::UnboundedSender<Input<T>>,
}

impl<T> DebounceInput<T> {
    /// Feed a new value, restarting the wait window. A value equal to the
    /// previous input is ignored and does not restart the window.
    pub fn update(&self, value: T) {
        let _ = self.tx.send(Input::Value(value));
    }

    /// Change the delay. A pending window restarts under the new delay.
    pub fn set_delay(&self, delay: Duration) {
        let _ = self.tx.send(Input::Delay(delay));
    }
}

/// Receiving side of a debouncer.
#[derive(Debug)]
pub struct DebounceOutput<T> {
    rx: mpsc::UnboundedReceiver<T>,
}

impl<T> DebounceOutput<T> {
    /// Wait for the next settled value. Returns `None` once the input side
    /// has been dropped and no further value can settle.
    pub async fn settled(&mut self) -> Option<T> {
        self.rx.recv().await
    }
}

/// Build a debouncer with the given delay, returning its two halves.
pub fn debouncer<T>(delay: Duration) -> (DebounceInput<T>, DebounceOutput<T>)
where
    T: Clone + PartialEq + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<Input<T>>();
    let (settled_tx, settled_rx) = mpsc::unbounded_channel::<T>();

    tokio::spawn(async move {
        let mut delay = delay;
        let mut last_input: Option<T> = None;
        let mut pending: Option<T> = None;
        let mut deadline = Instant::now();

        loop {
            tokio::select! {
                // Input wins ties so a teardown racing the timer never emits.
                biased;

                msg = rx.recv() => match msg {
                    None => break,
                    Some(Input::Value(value)) => {
                        if last_input.as_ref() == Some(&value) {
                            continue;
                        }
                        last_input = Some(value.clone());
                        pending = Some(value);
                        deadline = Instant::now() + delay;
                    }
                    Some(Input::Delay(new_delay)) => {
                        delay = new_delay;
                        if pending.is_some() {
                            deadline = Instant::now() + delay;
                        }
                    }
                },

                () = sleep_until(deadline), if pending.is_some() => {
                    if let Some(value) = pending.take() {
                        if settled_tx.send(value).is_err() {
                            break;
                        }
                    }
                }
            }
        }
    });

    (DebounceInput { tx }, DebounceOutput { rx: settled_rx })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{Instant, sleep, timeout};

    const DELAY: Duration = Duration::from_millis(300);

    #[tokio::test(start_paused = true)]
    async fn rapid_inputs_settle_once_to_last_value() {
        let (input, mut output) = debouncer::<String>(DELAY);

        input.update("T".to_string());
        sleep(Duration::from_millis(50)).await;
        input.update("Ta".to_string());
        sleep(Duration::from_millis(50)).await;
        input.update("Tai".to_string());
        let last_input_at = Instant::now();

        let settled = output.settled().await.unwrap();
        assert_eq!(settled, "Tai");
        assert!(last_input_at.elapsed() >= DELAY);

        // No second emission follows.
        let extra = timeout(Duration::from_millis(1000), output.settled()).await;
        assert!(extra.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn each_change_restarts_the_window() {
        let (input, mut output) = debouncer::<u32>(DELAY);

        input.update(1);
        sleep(Duration::from_millis(250)).await;
        input.update(2);
        sleep(Duration::from_millis(250)).await;
        input.update(3);
        let last_input_at = Instant::now();

        let settled = output.settled().await.unwrap();
        assert_eq!(settled, 3);
        assert!(last_input_at.elapsed() >= DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_identical_input_does_not_restart() {
        let (input, mut output) = debouncer::<&str>(DELAY);

        let first_input_at = Instant::now();
        input.update("same");
        sleep(Duration::from_millis(200)).await;
        input.update("same");

        let settled = output.settled().await.unwrap();
        assert_eq!(settled, "same");
        // Window ran from the first input, not the repeat.
        assert!(first_input_at.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn delay_change_restarts_pending_window() {
        let (input, mut output) = debouncer::<&str>(DELAY);

        input.update("value");
        sleep(Duration::from_millis(200)).await;
        input.set_delay(Duration::from_millis(600));
        let changed_at = Instant::now();

        let settled = output.settled().await.unwrap();
        assert_eq!(settled, "value");
        assert!(changed_at.elapsed() >= Duration::from_millis(600));
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_cancels_pending_window_without_emitting() {
        let (input, mut output) = debouncer::<&str>(DELAY);

        input.update("doomed");
        sleep(Duration::from_millis(100)).await;
        drop(input);

        assert_eq!(output.settled().await, None);
    }
}
