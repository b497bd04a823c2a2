//! Driver workarounds gated on `GL_RENDERER`/`GL_VENDOR` string probes, the
//! way `backend_gl/src/backend.rs`'s `with_gl_window` already reads those
//! strings at init for its version-banner log line (just not to gate
//! behavior) — this module extends that same probe to a real decision.

use crate::gl;
use std::ffi::CStr;
use std::os::raw::c_char;

/// Mesa's `radeonsi` driver has historically needed an extra client-side
/// wait after `glFenceSync` before the fence is safe to poll with
/// `glClientWaitSync(..., 0)` right away; skipping the first poll avoids a
/// spurious `GL_TIMEOUT_EXPIRED` on the very first check. Detected by
/// matching `GL_RENDERER` against the `radeonsi` substring Mesa reports.
pub fn workaround_radeonsi_sync(gl: &gl::Gl) -> bool {
    let renderer = unsafe {
        let ptr = gl.GetString(gl::RENDERER) as *const c_char;
        if ptr.is_null() {
            return false;
        }
        CStr::from_ptr(ptr).to_string_lossy()
    };
    renderer.to_ascii_lowercase().contains("radeonsi")
}
