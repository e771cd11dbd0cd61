//! In-process robot: drives a controller over in-memory channels.
//!
//! Run with:
//!   cargo run --example loopback

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use bytes::BytesMut;
use rrc::frame::{decode_frame, encode_frame, CommandType, TelemetryType, WireFormat};
use rrc::messages::{Orientation, Pose, RobotName, SimpleSensor, Vector3};
use rrc::transport::{MemoryTransport, ReceiveMode, Transport};
use rrc::{ControllerConfig, RobotController, TelemetryWorker};

fn framed<T: serde::Serialize>(code: u16, value: &T) -> rrc::frame::Result<Vec<u8>> {
    let payload = WireFormat::Postcard.encode(value)?;
    let mut buf = BytesMut::new();
    encode_frame(code, &payload, &mut buf);
    Ok(buf.to_vec())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (operator_cmd, mut robot_cmd) = MemoryTransport::pair();
    let (operator_tlm, mut robot_tlm) = MemoryTransport::pair();

    let controller = Arc::new(RobotController::new(
        Box::new(operator_cmd),
        Some(Box::new(operator_tlm)),
        ControllerConfig::default(),
    )?);
    let worker = TelemetryWorker::spawn(Arc::clone(&controller))?;

    // Robot side: acknowledge one command, then publish a few frames.
    let robot = thread::spawn(move || -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let request = robot_cmd
            .receive(ReceiveMode::Blocking)?
            .ok_or("command channel idle")?;
        let frame = decode_frame(request)?;
        eprintln!("robot received command code {}", frame.type_code);
        robot_cmd.send(&[])?;

        let name = framed(
            TelemetryType::RobotName.code(),
            &RobotName {
                value: "loopback".to_string(),
            },
        )?;
        robot_tlm.send(&name)?;

        for step in 0..3 {
            let pose = Pose::new(Vector3::new(f64::from(step), 0.0, 0.0), Orientation::IDENTITY);
            robot_tlm.send(&framed(TelemetryType::CurrentPose.code(), &pose)?)?;

            let reading = SimpleSensor::reading(0, vec![100.0 - step as f32]);
            robot_tlm.send(&framed(TelemetryType::SimpleSensorValue.code(), &reading)?)?;
        }
        Ok(())
    });

    let target = Pose::new(Vector3::new(2.0, 0.0, 0.0), Orientation::from_yaw(0.5));
    let reply = controller.set_target_pose(&target)?;
    eprintln!(
        "{} acknowledged with {} bytes",
        CommandType::TargetPoseCommand.name(),
        reply.len()
    );

    if let Err(err) = robot.join().map_err(|_| "robot thread panicked")? {
        return Err(err.to_string().into());
    }
    thread::sleep(Duration::from_millis(100));

    println!("robot name: {:?}", controller.robot_name()?);
    println!("current pose: {:?}", controller.current_pose()?);
    println!("battery: {:?}", controller.simple_sensor(0));
    println!("stats: {:?}", controller.stats());

    let exit = worker.stop();
    eprintln!("worker exit: {exit:?}");
    Ok(())
}
