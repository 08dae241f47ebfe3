//! Tokio runtime glue.
//!
//! - Client sinks backed by bounded `mpsc` channels; a per-connection task
//!   drains the channel into the socket.
//! - The control loop: a periodic task running the reaping sweep and the
//!   output writes.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::info;

use ledlink_core::OutputSink;

use crate::connection::{ClientSink, SendError};
use crate::controller::Controller;

impl ClientSink for mpsc::Sender<String> {
    fn try_send_text(&mut self, text: &str) -> Result<(), SendError> {
        self.try_send(text.to_string()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SendError::Full,
            mpsc::error::TrySendError::Closed(_) => SendError::Closed,
        })
    }

    fn is_open(&self) -> bool {
        !self.is_closed()
    }
}

/// Shortest period the control loop runs at.
pub const MIN_LOOP_PERIOD: Duration = Duration::from_millis(1);

/// Run [`Controller::tick`] every `period` until the task is aborted.
///
/// Periods below [`MIN_LOOP_PERIOD`] are raised to it.
pub fn spawn_control_loop<S, O>(
    controller: Arc<Controller<S>>,
    mut outputs: O,
    period: Duration,
) -> JoinHandle<()>
where
    S: ClientSink + 'static,
    O: OutputSink + Send + 'static,
{
    let period = period.max(MIN_LOOP_PERIOD);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!("Control loop running every {:?}", period);

        loop {
            interval.tick().await;
            controller.tick(&mut outputs);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ClientId;
    use ledlink_core::{Channel, PinMap};
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct SharedPins(Arc<Mutex<Vec<(u8, bool)>>>);

    impl OutputSink for SharedPins {
        type Error = std::convert::Infallible;

        fn set_level(&mut self, _: Channel, pin: u8, level: bool) -> Result<(), Self::Error> {
            self.0.lock().unwrap().push((pin, level));
            Ok(())
        }
    }

    #[test]
    fn test_mpsc_sink_full_and_closed() {
        let (mut tx, rx) = mpsc::channel::<String>(1);
        assert!(tx.is_open());
        assert_eq!(tx.try_send_text("a"), Ok(()));
        assert_eq!(tx.try_send_text("b"), Err(SendError::Full));

        drop(rx);
        assert!(!tx.is_open());
        assert_eq!(tx.try_send_text("c"), Err(SendError::Closed));
    }

    #[tokio::test]
    async fn test_dropped_receiver_reaped_by_loop() {
        let controller = Arc::new(Controller::new(PinMap::default()));
        let (tx, rx) = mpsc::channel::<String>(8);
        controller.on_connect(ClientId(1), None, tx);
        assert_eq!(controller.client_count(), 1);

        // session task died without a disconnect event
        drop(rx);

        let pins = SharedPins::default();
        let handle = spawn_control_loop(controller.clone(), pins.clone(), Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.abort();

        assert_eq!(controller.client_count(), 0);
        let writes = pins.0.lock().unwrap();
        assert!(writes.len() >= 3);
        assert_eq!(writes[..3], [(2, false), (4, false), (16, false)]);
    }

    #[tokio::test]
    async fn test_zero_period_keeps_running() {
        let controller: Arc<Controller<mpsc::Sender<String>>> =
            Arc::new(Controller::new(PinMap::default()));
        let pins = SharedPins::default();

        let handle = spawn_control_loop(controller, pins.clone(), Duration::ZERO);
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(!handle.is_finished());
        handle.abort();
        assert!(pins.0.lock().unwrap().len() >= 3);
    }
}
