//! A device family agnostic view of a stage controller.
//!
//! Code that only needs to read positions and stop a stage can be written
//! once against [`Stage`] and given either controller, with the family
//! chosen when the port is opened:
//!
//! ```rust
//! # use skproto::{error::Error, stage::{self, Model}};
//! # fn wrapper() -> Result<(), Error> {
//! let mut stage = stage::open_serial(Model::Hsc103, "/dev/ttyUSB0")?;
//! println!("{} at {:?} um", stage.model(), stage.positions()?);
//! stage.emergency_stop()?;
//! # Ok(())
//! # }
//! ```

use crate::{axis::Axis, backend::Backend, error::Error, protocol::Protocol};
#[cfg(feature = "ds102")]
use crate::ds102::{self, Ds102};
#[cfg(feature = "hsc103")]
use crate::hsc103::{self, Hsc103};

/// A family of stage controllers.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Model {
    /// The two axis DS102.
    #[cfg(feature = "ds102")]
    #[cfg_attr(all(doc, feature = "doc_cfg"), doc(cfg(feature = "ds102")))]
    Ds102,
    /// The three axis HSC-103.
    #[cfg(feature = "hsc103")]
    #[cfg_attr(all(doc, feature = "doc_cfg"), doc(cfg(feature = "hsc103")))]
    Hsc103,
}

impl Model {
    /// A human readable name of the family.
    pub const fn name(self) -> &'static str {
        match self {
            #[cfg(feature = "ds102")]
            Model::Ds102 => Ds102::NAME,
            #[cfg(feature = "hsc103")]
            Model::Hsc103 => Hsc103::NAME,
        }
    }

    /// The axes the family drives, in index order.
    pub const fn axes(self) -> &'static [Axis] {
        match self {
            #[cfg(feature = "ds102")]
            Model::Ds102 => Ds102::AXES,
            #[cfg(feature = "hsc103")]
            Model::Hsc103 => Hsc103::AXES,
        }
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The capabilities shared by every stage controller.
pub trait Stage: std::fmt::Debug {
    /// The family of the controller.
    fn model(&self) -> Model;

    /// The axes the controller drives, in index order.
    fn axes(&self) -> &'static [Axis] {
        self.model().axes()
    }

    /// The position of each axis, in whole micrometers, in the order of
    /// [`axes`](Stage::axes).
    ///
    /// Axes whose position cannot be read report the controller's fallback.
    fn positions(&mut self) -> Result<Vec<i64>, Error>;

    /// Stop every axis immediately.
    fn emergency_stop(&mut self) -> Result<(), Error>;
}

#[cfg(feature = "ds102")]
impl<B: Backend> Stage for ds102::Controller<B> {
    fn model(&self) -> Model {
        Model::Ds102
    }

    fn positions(&mut self) -> Result<Vec<i64>, Error> {
        Ok(self.position()?.to_vec())
    }

    fn emergency_stop(&mut self) -> Result<(), Error> {
        self.stop()
    }
}

#[cfg(feature = "hsc103")]
impl<B: Backend> Stage for hsc103::Controller<B> {
    fn model(&self) -> Model {
        Model::Hsc103
    }

    fn positions(&mut self) -> Result<Vec<i64>, Error> {
        let scale = self.scale();
        Ok(self
            .position()?
            .iter()
            .map(|&pulses| scale.to_micrometers(pulses) as i64)
            .collect())
    }

    fn emergency_stop(&mut self) -> Result<(), Error> {
        self.stop_emergency()
    }
}

/// Open the serial port at `path` with `model`'s defaults and initialize the
/// matching controller.
pub fn open_serial(model: Model, path: &str) -> Result<Box<dyn Stage>, Error> {
    Ok(match model {
        #[cfg(feature = "ds102")]
        Model::Ds102 => Box::new(ds102::Controller::initialize(ds102::Port::open_serial(
            path,
        )?)?),
        #[cfg(feature = "hsc103")]
        Model::Hsc103 => Box::new(hsc103::Controller::initialize(
            hsc103::Port::open_serial(path)?,
        )?),
    })
}

/// Initialize a `model` controller with no hardware attached.
pub fn open_offline(model: Model) -> Result<Box<dyn Stage>, Error> {
    Ok(match model {
        #[cfg(feature = "ds102")]
        Model::Ds102 => Box::new(ds102::Controller::initialize(ds102::Port::open_offline())?),
        #[cfg(feature = "hsc103")]
        Model::Hsc103 => Box::new(hsc103::Controller::initialize(
            hsc103::Port::open_offline(),
        )?),
    })
}

#[cfg(all(test, feature = "ds102", feature = "hsc103"))]
mod test {
    use super::*;
    use crate::backend::Mock;

    #[test]
    fn models() {
        assert_eq!(Model::Ds102.to_string(), "DS102");
        assert_eq!(Model::Hsc103.name(), "HSC-103");
        assert_eq!(Model::Ds102.axes(), &[Axis::X, Axis::Y]);
        assert_eq!(Model::Hsc103.axes().len(), 3);
    }

    #[test]
    fn offline_stages_use_fallbacks() {
        for model in [Model::Ds102, Model::Hsc103] {
            let mut stage = open_offline(model).unwrap();
            assert_eq!(stage.model(), model);
            assert_eq!(stage.positions().unwrap(), vec![0; model.axes().len()]);
            stage.emergency_stop().unwrap();
        }
    }

    #[test]
    fn hsc103_positions_are_micrometers() {
        let mut port = hsc103::Port::<Mock>::open_mock();
        port.backend_mut().append_data(b"100,-250,0\r\n");
        let mut controller = hsc103::Controller::new(port);
        let stage: &mut dyn Stage = &mut controller;
        assert_eq!(stage.positions().unwrap(), vec![1, -2, 0]);
        stage.emergency_stop().unwrap();
        assert_eq!(controller.port().backend().written_str(), "Q:\r\nL:E\r\n");
    }
}
