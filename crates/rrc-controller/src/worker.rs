use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use rrc_transport::TransportError;
use tracing::{debug, info, trace, warn};

use crate::controller::RobotController;
use crate::error::{ControllerError, Result};

/// Why a [`TelemetryWorker`] stopped.
#[derive(Debug)]
pub enum WorkerExit {
    /// [`TelemetryWorker::stop`] was called.
    Stopped,
    /// The robot closed the telemetry channel.
    Shutdown,
    /// Polling failed with a transport error.
    Failed(ControllerError),
    /// The worker thread panicked.
    Panicked,
}

/// Background thread that keeps a controller's telemetry buffers fresh.
///
/// Calls [`RobotController::poll_once`] in a loop and sleeps for the
/// configured poll interval whenever nothing was pending. The stop flag is
/// checked between polls.
#[derive(Debug)]
pub struct TelemetryWorker {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<WorkerExit>>,
}

impl TelemetryWorker {
    /// Start polling `controller` on a new thread.
    pub fn spawn(controller: Arc<RobotController>) -> Result<Self> {
        if !controller.has_telemetry() {
            return Err(ControllerError::NoTelemetryChannel);
        }

        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let handle = thread::Builder::new()
            .name("rrc-telemetry".to_string())
            .spawn(move || run(&controller, &flag))
            .map_err(ControllerError::Spawn)?;

        debug!("telemetry worker started");
        Ok(Self {
            running,
            handle: Some(handle),
        })
    }

    /// Whether the polling thread is still alive.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Ask the thread to stop and wait for it.
    pub fn stop(mut self) -> WorkerExit {
        self.shutdown()
    }

    fn shutdown(&mut self) -> WorkerExit {
        self.running.store(false, Ordering::SeqCst);
        match self.handle.take() {
            Some(handle) => handle.join().unwrap_or(WorkerExit::Panicked),
            None => WorkerExit::Stopped,
        }
    }
}

impl Drop for TelemetryWorker {
    fn drop(&mut self) {
        if self.handle.is_some() {
            let _ = self.shutdown();
        }
    }
}

fn run(controller: &RobotController, running: &AtomicBool) -> WorkerExit {
    let interval = controller.config().poll_interval;
    while running.load(Ordering::SeqCst) {
        match controller.poll_once() {
            Ok(0) => thread::sleep(interval),
            Ok(frames) => trace!(frames, "ingested telemetry"),
            Err(ControllerError::Transport(TransportError::Shutdown)) => {
                info!("telemetry channel closed by robot");
                return WorkerExit::Shutdown;
            }
            Err(err) => {
                warn!(%err, "telemetry polling failed");
                return WorkerExit::Failed(err);
            }
        }
    }
    debug!("telemetry worker stopped");
    WorkerExit::Stopped
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use bytes::BytesMut;
    use rrc_frame::{encode_frame, TelemetryType, WireFormat};
    use rrc_messages::RobotName;
    use rrc_transport::{MemoryTransport, Transport};

    use super::*;
    use crate::config::ControllerConfig;

    fn controller() -> (Arc<RobotController>, MemoryTransport, MemoryTransport) {
        let (command, robot_command) = MemoryTransport::pair();
        let (telemetry, robot_telemetry) = MemoryTransport::pair();
        let controller = RobotController::new(
            Box::new(command),
            Some(Box::new(telemetry)),
            ControllerConfig {
                poll_interval: Duration::from_millis(1),
                ..ControllerConfig::default()
            },
        )
        .expect("controller should build");
        (Arc::new(controller), robot_command, robot_telemetry)
    }

    fn wait_for(mut condition: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(Instant::now() < deadline, "condition not met in time");
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn worker_fills_buffers_and_stops_on_request() {
        let (controller, _command, mut robot) = controller();
        let worker = TelemetryWorker::spawn(Arc::clone(&controller)).expect("spawn");

        let name = RobotName {
            value: "rover".to_string(),
        };
        let payload = WireFormat::Postcard.encode(&name).expect("encode");
        let mut message = BytesMut::new();
        encode_frame(TelemetryType::RobotName.code(), &payload, &mut message);
        robot.send(&message).expect("send telemetry");

        wait_for(|| controller.robot_name().expect("read").is_some());
        assert!(worker.is_running());
        assert!(matches!(worker.stop(), WorkerExit::Stopped));
    }

    #[test]
    fn worker_ends_when_robot_disconnects() {
        let (controller, _command, robot) = controller();
        let worker = TelemetryWorker::spawn(controller).expect("spawn");

        drop(robot);
        wait_for(|| !worker.is_running());
        assert!(matches!(worker.stop(), WorkerExit::Shutdown));
    }

    #[test]
    fn command_only_controller_has_no_worker() {
        let (command, _robot) = MemoryTransport::pair();
        let controller =
            RobotController::new(Box::new(command), None, ControllerConfig::default())
                .expect("controller should build");
        assert!(matches!(
            TelemetryWorker::spawn(Arc::new(controller)),
            Err(ControllerError::NoTelemetryChannel)
        ));
    }
}
