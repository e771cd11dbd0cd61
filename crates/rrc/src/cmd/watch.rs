use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use rrc_controller::{RobotController, TelemetryWorker, WorkerExit};
use rrc_frame::{telemetry_name, TelemetryType, WireFormat};

use crate::cmd::WatchArgs;
use crate::config::{parse_duration, LinkSettings};
use crate::exit::{controller_error, CliError, CliResult, FAILURE, INTERNAL, SUCCESS};
use crate::output::{print_snapshot, OutputFormat, SnapshotRow};

pub fn run(args: WatchArgs, format: OutputFormat) -> CliResult<i32> {
    let interval = parse_duration(&args.interval)?;
    let settings = LinkSettings::resolve(&args.link)?;
    let controller = Arc::new(settings.connect(true)?);

    let worker = TelemetryWorker::spawn(Arc::clone(&controller))
        .map_err(|err| controller_error("telemetry worker failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut printed = 0;
    while running.load(Ordering::SeqCst) && worker.is_running() {
        sleep_while(&running, interval);
        print_snapshot(&snapshot(&controller), controller.stats(), format);
        printed += 1;
        if args.count.is_some_and(|count| printed >= count) {
            break;
        }
    }

    match worker.stop() {
        WorkerExit::Stopped => Ok(SUCCESS),
        WorkerExit::Shutdown => Err(CliError::new(FAILURE, "telemetry channel closed by robot")),
        WorkerExit::Failed(err) => Err(controller_error("telemetry polling failed", err)),
        WorkerExit::Panicked => Err(CliError::new(INTERNAL, "telemetry worker panicked")),
    }
}

/// Latest value of every buffered type and every active sensor.
fn snapshot(controller: &RobotController) -> Vec<SnapshotRow> {
    let buffers = controller.buffers();
    let mut rows: Vec<SnapshotRow> = buffers
        .type_codes()
        .into_iter()
        .map(|type_code| SnapshotRow {
            type_code,
            name: telemetry_name(type_code).to_string(),
            buffered: buffers.len(type_code).unwrap_or(0),
            latest: buffers.peek_json(type_code).ok().flatten(),
        })
        .collect();

    let sensors = controller.sensors();
    for id in sensors.active_ids() {
        rows.push(SnapshotRow {
            type_code: TelemetryType::SimpleSensorValue.code(),
            name: format!("SIMPLE_SENSOR[{id}]"),
            buffered: sensors.buffered(id),
            latest: sensors
                .peek_latest(id)
                .and_then(|reading| WireFormat::to_json(&reading).ok()),
        });
    }
    rows
}

fn sleep_while(running: &AtomicBool, total: Duration) {
    let deadline = Instant::now() + total;
    while running.load(Ordering::SeqCst) {
        let now = Instant::now();
        if now >= deadline {
            return;
        }
        thread::sleep((deadline - now).min(Duration::from_millis(50)));
    }
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
