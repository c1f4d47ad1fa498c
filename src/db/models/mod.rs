pub mod session;
pub mod temperature;
pub mod temperature_log;

pub use session::CookSession;
pub use temperature::{ManualTemperature, FLAMEBOSS_NOTE};
pub use temperature_log::TemperatureLogEntry;
