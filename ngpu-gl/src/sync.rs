//! GL sync objects as the `Fence` primitive (spec.md §3 "Fence"). Grounded
//! directly on `backend_gl/src/sync.rs`'s `GpuSyncObject`, adapted to
//! implement `ngpu_core::resource::FenceObject` instead of wrapping an
//! arbitrary payload `T`.

use crate::gl::{self, types::GLsync};
use ngpu_core::error::Result;
use ngpu_core::resource::FenceObject;
use std::sync::Mutex;
use std::time::Duration;

/// A `GLsync` created right after the commands it guards were issued. Holds
/// its own clone of the function-pointer table (`gl_generator`'s
/// `StructGenerator` output is `Rc`-backed and cheap to clone) so `wait` can
/// call `glClientWaitSync` without a context argument.
pub struct GlFence {
    gl: gl::Gl,
    sync: Mutex<GLsync>,
}

unsafe impl Send for GlFence {}
unsafe impl Sync for GlFence {}

impl std::fmt::Debug for GlFence {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("GlFence").finish()
    }
}

impl GlFence {
    /// Must be called right after the batch of commands to be fenced has
    /// been issued to the driver.
    pub fn new(gl: &gl::Gl) -> GlFence {
        let sync = unsafe { gl.FenceSync(gl::SYNC_GPU_COMMANDS_COMPLETE, 0) };
        GlFence {
            gl: gl.clone(),
            sync: Mutex::new(sync),
        }
    }
}

impl Drop for GlFence {
    fn drop(&mut self) {
        let sync = *self.sync.lock().unwrap();
        unsafe {
            self.gl.DeleteSync(sync);
        }
    }
}

impl FenceObject for GlFence {
    fn wait(&self, timeout: Duration) -> Result<bool> {
        let sync = *self.sync.lock().unwrap();
        let timeout_ns = timeout.as_nanos().min(u64::max_value() as u128) as u64;
        let result = unsafe { self.gl.ClientWaitSync(sync, gl::SYNC_FLUSH_COMMANDS_BIT, timeout_ns) };
        if result == gl::CONDITION_SATISFIED || result == gl::ALREADY_SIGNALED {
            Ok(true)
        } else if result == gl::TIMEOUT_EXPIRED {
            Ok(false)
        } else {
            Err(ngpu_core::error::Error::graphics_generic("glClientWaitSync failed"))
        }
    }

    fn is_signaled(&self) -> bool {
        let sync = *self.sync.lock().unwrap();
        let result = unsafe { self.gl.ClientWaitSync(sync, 0, 0) };
        result == gl::CONDITION_SATISFIED || result == gl::ALREADY_SIGNALED
    }
}
