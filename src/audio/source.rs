use anyhow::Result;

/// One entry from the device catalog. `id` is opaque to the recorder.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct InputDevice {
    pub id: String,
    pub display_name: String,
    pub is_default: bool,
}

/// Something that can enumerate input devices on demand.
pub trait DeviceCatalog {
    fn list_devices(&self) -> Result<Vec<InputDevice>>;
}

/// Shape of the frames a capture source must produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureFormat {
    pub sample_rate: u32,
    pub frame_size: usize,
}

/// An open input stream yielding fixed-size frames of mono i16 samples.
///
/// Sources are created and used on the capture thread only, so they do not
/// need to be `Send` (some platform streams are not).
pub trait CaptureSource {
    /// Block until the next full frame is available.
    ///
    /// Must return within a bounded time: an error once the device has gone
    /// quiet for too long, never an indefinite wait.
    fn read_frame(&mut self) -> Result<Vec<i16>>;

    /// Release the device. Called exactly once, after the last read.
    fn close(&mut self);
}

/// Opens capture sources. Shared between the caller and the capture thread.
pub trait CaptureBackend: Send + Sync {
    /// Open `device_id`, or the host default when `None`.
    fn open(&self, device_id: Option<&str>, format: CaptureFormat)
        -> Result<Box<dyn CaptureSource>>;

    fn name(&self) -> &'static str {
        "unknown_backend"
    }
}
