//! Loopback device resolution.

use crate::backend::{AudioBackend, DeviceInfo};
use crate::{Error, Result};

/// First device whose name contains both the default output device's name
/// and `marker`, in enumeration order. Matches on name alone.
pub fn resolve_loopback<'a>(
    devices: &'a [DeviceInfo],
    default_output: &DeviceInfo,
    marker: &str,
) -> Option<&'a DeviceInfo> {
    devices.iter().find(|device| {
        device.name.contains(default_output.name.as_str()) && device.name.contains(marker)
    })
}

/// Name of the loopback mirror of `output`, e.g. `"Speakers [Loopback]"`.
pub fn loopback_name(output: &str, marker: &str) -> String {
    format!("{} {}", output, marker)
}

/// Output device name behind a mirror produced by [`loopback_name`].
pub fn loopback_source<'a>(name: &'a str, marker: &str) -> Option<&'a str> {
    name.strip_suffix(marker)
        .and_then(|rest| rest.strip_suffix(' '))
        .filter(|output| !output.is_empty())
}

/// Append a capture entry mirroring each output device, for hosts that
/// record an output by opening it as an input. Hosts that already list a
/// mirror under that name keep theirs.
pub fn with_loopback_mirrors(mut devices: Vec<DeviceInfo>, marker: &str) -> Vec<DeviceInfo> {
    let mirrors: Vec<DeviceInfo> = devices
        .iter()
        .filter(|device| device.is_output())
        .map(|device| (device, loopback_name(&device.name, marker)))
        .filter(|(_, name)| !devices.iter().any(|d| &d.name == name))
        .enumerate()
        .map(|(i, (output, name))| {
            DeviceInfo::input(
                devices.len() + i,
                name,
                output.output_channels,
                output.default_sample_rate,
            )
        })
        .collect();
    devices.extend(mirrors);
    devices
}

/// Resolve the loopback mirror of the backend's default output device.
pub fn find_loopback_device(backend: &dyn AudioBackend, marker: &str) -> Result<DeviceInfo> {
    let output = backend
        .default_output_device()?
        .ok_or(Error::DeviceUnavailable)?;
    let devices = backend.devices()?;

    match resolve_loopback(&devices, &output, marker) {
        Some(device) => {
            tracing::debug!(
                "loopback device for '{}': {}: {}",
                output.name,
                device.index,
                device.name
            );
            Ok(device.clone())
        }
        None => {
            tracing::warn!("no '{}' device mirrors '{}'", marker, output.name);
            Err(Error::DeviceUnavailable)
        }
    }
}

/// Enumerate devices as `"{idx}: {name}"` lines.
pub fn list_devices(backend: &dyn AudioBackend) -> Result<Vec<String>> {
    Ok(backend
        .devices()?
        .iter()
        .map(|device| {
            let direction = match (device.is_input(), device.is_output()) {
                (true, true) => "in/out",
                (true, false) => "in",
                (false, true) => "out",
                (false, false) => "-",
            };
            format!(
                "{}: {} ({}, {} Hz)",
                device.index, device.name, direction, device.default_sample_rate
            )
        })
        .collect())
}
