use crate::config::{Config, DeviceKind};
use crate::switcher::PowerCommand;

/// Decides what the plug behind `kind` should do for a sensor `reading`.
/// Readings strictly above the configured threshold turn the plug on.
pub fn command_for_reading(config: &Config, kind: DeviceKind, reading: f32) -> PowerCommand {
    let (thresh, label, unit) = match kind {
        DeviceKind::Temperature => (config.temp_thresh, "Temperature", " degrees"),
        DeviceKind::Humidity => (config.hum_thresh, "Humidity", "%"),
    };

    if reading > thresh {
        log::info!("{} is higher than {}{}, turning on", label, thresh, unit);
        PowerCommand::On
    } else {
        log::info!(
            "{} is lower than or equal to {}{}, turning off",
            label,
            thresh,
            unit
        );
        PowerCommand::Off
    }
}
