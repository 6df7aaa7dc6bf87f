//! Example usage of the HSC-103 controller.

use simple_logger::SimpleLogger;
use skproto::hsc103::{Controller, Jog, Port};
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Enable logging
    SimpleLogger::new().init().unwrap();

    // Open the port. Initializing logs the controller's status.
    let port = Port::open_serial("/dev/ttyUSB0")?;
    let mut controller = Controller::initialize(port)?;

    // Move to (100 um, 50 um, 0 um) as fast as possible and wait.
    controller.set_speed_max()?;
    controller.move_abs([100.0, 50.0, 0.0])?;
    while controller.is_busy()?.contains(&1) {
        std::thread::sleep(Duration::from_millis(50));
    }
    println!("at {:?} pulses", controller.position()?);

    // Jog the first axis for a moment.
    controller.jog([Jog::Positive, Jog::Hold, Jog::Hold])?;
    std::thread::sleep(Duration::from_millis(500));
    controller.stop_emergency()?;
    Ok(())
}
