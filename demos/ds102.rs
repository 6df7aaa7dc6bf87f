//! Example usage of the DS102 controller.

use simple_logger::SimpleLogger;
use skproto::{
    axis::Axis,
    ds102::{Controller, Port},
};
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Enable logging
    SimpleLogger::new().init().unwrap();

    // Open the port. Initializing selects speed table 0 on both axes.
    let port = Port::open_serial_options()
        .timeout(Some(Duration::from_secs(1)))
        .open("/dev/ttyUSB0")?;
    let mut controller = Controller::initialize(port)?;
    if !controller.startup().all_ready() {
        return Err("the stage is not ready".into());
    }

    // Move X to 10 mm at full speed, then creep Y in the negative direction
    // until it reaches a limit.
    controller.set_velocity_max_all()?;
    controller.move_abs(Axis::X, 10.0)?;
    controller.move_velocity(Axis::Y, -500)?;
    while !controller.check_limit(Axis::Y)? {
        std::thread::sleep(Duration::from_millis(100));
    }
    controller.stop()?;

    let [x, y] = controller.position()?;
    println!("stopped at x = {x} um, y = {y} um");
    Ok(())
}
