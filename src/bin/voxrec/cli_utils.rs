use anyhow::Result;
use voxrec::audio::{CpalBackend, DeviceCatalog, InputDevice};

/// Comma-separated fake device names; replaces the host catalog when set.
const TEST_DEVICES_ENV: &str = "VOXREC_TEST_DEVICES";

fn devices_from_env(raw: &str) -> Vec<InputDevice> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .enumerate()
        .map(|(index, name)| InputDevice {
            id: name.to_string(),
            display_name: name.to_string(),
            is_default: index == 0,
        })
        .collect()
}

pub(crate) fn available_devices() -> Vec<InputDevice> {
    if let Ok(raw) = std::env::var(TEST_DEVICES_ENV) {
        return devices_from_env(&raw);
    }
    CpalBackend::new().list_devices().unwrap_or_else(|err| {
        eprintln!("Failed to list audio input devices: {err:#}");
        Vec::new()
    })
}

pub(crate) fn format_device_list(devices: &[InputDevice]) -> String {
    if devices.is_empty() {
        return "No audio input devices detected.\n".to_string();
    }
    let mut out = String::from("Available audio input devices:\n");
    for (index, device) in devices.iter().enumerate() {
        let marker = if device.is_default { " (default)" } else { "" };
        out.push_str(&format!("  [{index}] {}{marker}\n", device.display_name));
    }
    out
}

pub(crate) fn list_input_devices() -> Result<()> {
    print!("{}", format_device_list(&available_devices()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_devices_mark_first_as_default() {
        let devices = devices_from_env(" Built-in Mic , ,USB Mic");
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].id, "Built-in Mic");
        assert!(devices[0].is_default);
        assert_eq!(devices[1].display_name, "USB Mic");
        assert!(!devices[1].is_default);
    }

    #[test]
    fn empty_env_lists_nothing() {
        assert!(devices_from_env("  ").is_empty());
        assert_eq!(
            format_device_list(&[]),
            "No audio input devices detected.\n"
        );
    }

    #[test]
    fn device_list_shows_index_and_default() {
        let listing = format_device_list(&devices_from_env("A,B"));
        assert_eq!(
            listing,
            "Available audio input devices:\n  [0] A (default)\n  [1] B\n"
        );
    }
}
