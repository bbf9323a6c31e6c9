//! Device enumeration via cpal.

use crate::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Device, Host, SampleFormat, SupportedStreamConfigRange};

/// Sample rates checked when listing devices.
pub const PROBE_SAMPLE_RATES: [u32; 5] = [22050, 44100, 48000, 96000, 192000];

/// Extract device name via `description()` (cpal 0.17+).
pub(crate) fn device_name(device: &Device) -> std::result::Result<String, cpal::DeviceNameError> {
    device.description().map(|d| d.name().to_string())
}

/// Which side of a device to look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    /// Capture side.
    Input,
    /// Playback side.
    Output,
}

impl DeviceKind {
    fn label(self) -> &'static str {
        match self {
            DeviceKind::Input => "input",
            DeviceKind::Output => "output",
        }
    }
}

/// Audio device information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioDevice {
    /// Human-readable device name.
    pub name: String,
    /// Whether the device supports audio input.
    pub is_input: bool,
    /// Whether the device supports audio output.
    pub is_output: bool,
    /// Default sample rate in Hz.
    pub default_sample_rate: u32,
    /// Probed rates the capture side accepts as mono 16-bit.
    pub input_rates: Vec<u32>,
    /// Probed rates the playback side accepts as mono 16-bit.
    pub output_rates: Vec<u32>,
}

impl AudioDevice {
    /// Check whether this device can run a measurement side at `sample_rate`.
    pub fn supports_rate(&self, kind: DeviceKind, sample_rate: u32) -> bool {
        match kind {
            DeviceKind::Input => self.input_rates.contains(&sample_rate),
            DeviceKind::Output => self.output_rates.contains(&sample_rate),
        }
    }

    fn has(&self, kind: DeviceKind) -> bool {
        match kind {
            DeviceKind::Input => self.is_input,
            DeviceKind::Output => self.is_output,
        }
    }
}

/// Probed rates covered by any mono 16-bit config range.
fn mono_i16_rates<I>(configs: I) -> Vec<u32>
where
    I: IntoIterator<Item = SupportedStreamConfigRange>,
{
    let ranges: Vec<_> = configs
        .into_iter()
        .filter(|c| c.channels() == 1 && c.sample_format() == SampleFormat::I16)
        .collect();

    PROBE_SAMPLE_RATES
        .into_iter()
        .filter(|&rate| {
            ranges
                .iter()
                .any(|c| c.min_sample_rate() <= rate && rate <= c.max_sample_rate())
        })
        .collect()
}

fn describe(device: &Device, name: String) -> AudioDevice {
    let input_rates = device
        .supported_input_configs()
        .map(mono_i16_rates)
        .unwrap_or_default();
    let output_rates = device
        .supported_output_configs()
        .map(mono_i16_rates)
        .unwrap_or_default();
    let default_sample_rate = device
        .default_input_config()
        .or_else(|_| device.default_output_config())
        .map(|c| c.sample_rate())
        .unwrap_or(44100);

    AudioDevice {
        name,
        is_input: device.default_input_config().is_ok(),
        is_output: device.default_output_config().is_ok(),
        default_sample_rate,
        input_rates,
        output_rates,
    }
}

/// List all available audio devices with their mono 16-bit rates.
pub fn list_devices() -> Result<Vec<AudioDevice>> {
    let host = cpal::default_host();
    let mut devices: Vec<AudioDevice> = Vec::new();

    let inputs = host
        .input_devices()
        .map_err(|e| Error::Device(e.to_string()))?;
    let outputs = host
        .output_devices()
        .map_err(|e| Error::Device(e.to_string()))?;

    for device in inputs.chain(outputs) {
        if let Ok(name) = device_name(&device) {
            // Duplex devices show up on both lists
            if devices.iter().any(|d| d.name == name) {
                continue;
            }
            devices.push(describe(&device, name));
        }
    }

    tracing::debug!(count = devices.len(), "devices enumerated");
    Ok(devices)
}

/// Pick the position in `names` matching `query`.
///
/// The query can be a numeric index, an exact name, or a case-insensitive partial
/// name. With several partial matches the first one wins.
fn match_name(names: &[&str], query: &str, kind: DeviceKind) -> Result<usize> {
    if let Ok(index) = query.parse::<usize>() {
        return if index < names.len() {
            Ok(index)
        } else {
            Err(Error::DeviceNotFound(format!(
                "{} device index {} (only {} devices available)",
                kind.label(),
                index,
                names.len()
            )))
        };
    }

    if let Some(index) = names.iter().position(|n| *n == query) {
        return Ok(index);
    }

    let search_lower = query.to_lowercase();
    let matches: Vec<usize> = names
        .iter()
        .enumerate()
        .filter(|(_, n)| n.to_lowercase().contains(&search_lower))
        .map(|(i, _)| i)
        .collect();

    match matches.as_slice() {
        [] => Err(Error::DeviceNotFound(format!(
            "no {} device matching '{}'",
            kind.label(),
            query
        ))),
        [only] => Ok(*only),
        [first, ..] => {
            tracing::warn!(
                query,
                kind = kind.label(),
                chosen = names[*first],
                candidates = matches.len(),
                "ambiguous device name, using first match"
            );
            Ok(*first)
        }
    }
}

/// Find a device of the given kind in `devices` by index, exact name or partial name.
///
/// Indices count only devices of that kind, in list order.
pub fn find_device<'a>(
    devices: &'a [AudioDevice],
    query: &str,
    kind: DeviceKind,
) -> Result<&'a AudioDevice> {
    let candidates: Vec<&AudioDevice> = devices.iter().filter(|d| d.has(kind)).collect();
    let names: Vec<&str> = candidates.iter().map(|d| d.name.as_str()).collect();
    let index = match_name(&names, query, kind)?;
    Ok(candidates[index])
}

/// Open a cpal device of the given kind, or the host default when `query` is `None`.
pub(crate) fn open_device(host: &Host, kind: DeviceKind, query: Option<&str>) -> Result<Device> {
    let Some(query) = query else {
        let device = match kind {
            DeviceKind::Input => host.default_input_device(),
            DeviceKind::Output => host.default_output_device(),
        };
        return device.ok_or(Error::NoDevice);
    };

    let devices: Vec<Device> = match kind {
        DeviceKind::Input => host.input_devices(),
        DeviceKind::Output => host.output_devices(),
    }
    .map_err(|e| Error::Device(e.to_string()))?
    .collect();

    let names: Vec<String> = devices
        .iter()
        .map(|d| device_name(d).unwrap_or_default())
        .collect();
    let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let index = match_name(&name_refs, query, kind)?;
    Ok(devices[index].clone())
}
