//! The config surface handed to `GpuContext::init` (spec.md §6). A handful
//! of named knobs with defaults, read the way the teacher reads
//! `config::Config` for `gfx.default_upload_buffer_size` /
//! `gfx.max_frames_in_flight` in `backend_gl/src/backend.rs`, rather than a
//! generic settings system.

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Platform {
    Xlib,
    Android,
    MacOs,
    Ios,
    Windows,
    Wayland,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum BackendKind {
    OpenGl,
    OpenGlEs,
    Vulkan,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum CaptureBufferType {
    Cpu,
    CoreVideo,
}

/// Opaque native handle (an `EGLDisplay`, `HWND`, `CVPixelBufferRef`, ...).
/// The GAL never interprets these beyond handing them to the platform glue
/// that created the context; it only moves the pointer around.
pub type NativeHandle = *mut std::ffi::c_void;

#[derive(Clone, Debug)]
pub struct Config {
    pub platform: Platform,
    pub backend: BackendKind,
    pub display: Option<usize>,
    pub window: Option<usize>,
    pub shared_ctx: Option<usize>,
    pub swap_interval: i32,
    pub offscreen: bool,
    pub external: bool,
    pub width: u32,
    pub height: u32,
    pub samples: u32,
    pub viewport: (i32, i32, u32, u32),
    pub clear_color: [f32; 4],
    pub capture_buffer: bool,
    pub capture_buffer_type: CaptureBufferType,
    pub debug: bool,
    pub hud: bool,
    /// Size in bytes of the shared dedicated-upload ring used for small,
    /// immutable buffer initial data (`gfx.default_upload_buffer_size` in
    /// the teacher). Default 4 MiB.
    pub default_upload_buffer_size: u64,
    /// `gfx.max_frames_in_flight` in the teacher. Default 2.
    pub max_frames_in_flight: u32,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            platform: Platform::Xlib,
            backend: BackendKind::OpenGl,
            display: None,
            window: None,
            shared_ctx: None,
            swap_interval: -1,
            offscreen: false,
            external: false,
            width: 0,
            height: 0,
            samples: 0,
            viewport: (0, 0, 0, 0),
            clear_color: [0.0, 0.0, 0.0, 1.0],
            capture_buffer: false,
            capture_buffer_type: CaptureBufferType::Cpu,
            debug: false,
            hud: false,
            default_upload_buffer_size: 4 * 1024 * 1024,
            max_frames_in_flight: 2,
        }
    }
}

impl Config {
    /// Loads overridable knobs (`gfx.default_upload_buffer_size`,
    /// `gfx.max_frames_in_flight`) from a `config::Config` source, falling
    /// back to the struct's current values when absent — same lookup the
    /// teacher performs in `OpenGlBackend::with_gl_window`.
    pub fn apply_overrides(&mut self, source: &config::Config) {
        if let Ok(size) = source.get::<u64>("gfx.default_upload_buffer_size") {
            self.default_upload_buffer_size = size;
        }
        if let Ok(n) = source.get::<u32>("gfx.max_frames_in_flight") {
            self.max_frames_in_flight = n;
        }
    }
}
