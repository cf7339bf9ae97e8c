mod cpal_backend;
pub use self::cpal_backend::CpalBackend;

use crate::error::AudioError;

pub trait AudioBackend {
    fn start(&mut self) -> Result<(), AudioError>;
    fn stop(&mut self) -> Result<(), AudioError>;
}
