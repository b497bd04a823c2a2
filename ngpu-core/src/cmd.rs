//! The command buffer: a recorded, replayable sequence of GPU commands
//! (spec.md §3/§4.H). Grounded on `renderer/src/cmd.rs`'s `CommandInner`
//! tagged union and `CommandBuffer`, with the cross-buffer `sort_command_buffers`
//! reordering dropped — spec.md §5 requires recording order to equal
//! submission order to equal replay order, with no fusion across buffers.

use crate::descriptors::{IndexFormat, ScissorRect, Viewport};
use crate::error::{Error, Result};
use crate::resource::{BindGroup, Buffer, Fence, Pipeline, RenderTarget, RetainedHandle, Texture};
use std::time::Duration;

#[derive(Clone, Debug)]
pub enum Command {
    BeginPass { render_target: RenderTarget },
    EndPass,
    SetViewport(Viewport),
    SetScissor(ScissorRect),
    SetPipeline { pipeline: Pipeline },
    SetBindGroup { index: u32, bind_group: BindGroup, dynamic_offsets: Vec<u32> },
    SetVertexBuffer { binding: u32, buffer: Buffer, offset: u64 },
    SetIndexBuffer { buffer: Buffer, offset: u64, format: IndexFormat },
    Draw { vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32 },
    DrawIndexed {
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    },
    Dispatch { x: u32, y: u32, z: u32 },
    GenerateMipmap { texture: Texture },
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum CommandBufferState {
    Idle,
    Recording,
    Submitted,
}

/// Recorded commands plus the resource-retention list that keeps every
/// referenced resource alive until this buffer's fence signals (spec.md §9
/// "Resource retention to satisfy outlives submission").
#[derive(Debug, Default)]
pub struct CommandBuffer {
    commands: Vec<Command>,
    retained: Vec<RetainedHandle>,
    fence: Option<Fence>,
    state_: Option<CommandBufferState>,
}

impl CommandBuffer {
    pub fn new() -> CommandBuffer {
        CommandBuffer {
            commands: Vec::new(),
            retained: Vec::new(),
            fence: None,
            state_: Some(CommandBufferState::Idle),
        }
    }

    pub fn state(&self) -> CommandBufferState {
        self.state_.unwrap_or(CommandBufferState::Idle)
    }

    /// Idle -> Recording. Clears any previously recorded commands and
    /// releases the retention list of an abandoned (never-submitted)
    /// recording, per spec.md §5 Cancellation.
    pub fn begin(&mut self) {
        self.commands.clear();
        self.retained.clear();
        self.state_ = Some(CommandBufferState::Recording);
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    fn retain(&mut self, handle: impl Into<RetainedHandle>) {
        self.retained.push(handle.into());
    }

    fn push(&mut self, command: Command) -> Result<()> {
        if self.state() != CommandBufferState::Recording {
            return Err(Error::invalid_usage("command buffer is not in the recording state"));
        }
        self.commands.push(command);
        Ok(())
    }

    pub fn begin_pass(&mut self, render_target: RenderTarget) -> Result<()> {
        self.retain(render_target.clone());
        self.push(Command::BeginPass { render_target })
    }

    pub fn end_pass(&mut self) -> Result<()> {
        self.push(Command::EndPass)
    }

    pub fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.push(Command::SetViewport(viewport))
    }

    pub fn set_scissor(&mut self, scissor: ScissorRect) -> Result<()> {
        self.push(Command::SetScissor(scissor))
    }

    pub fn set_pipeline(&mut self, pipeline: Pipeline) -> Result<()> {
        self.retain(pipeline.clone());
        self.push(Command::SetPipeline { pipeline })
    }

    pub fn set_bind_group(&mut self, index: u32, bind_group: BindGroup, dynamic_offsets: &[u32]) -> Result<()> {
        self.retain(bind_group.clone());
        self.push(Command::SetBindGroup {
            index,
            bind_group,
            dynamic_offsets: dynamic_offsets.to_vec(),
        })
    }

    pub fn set_vertex_buffer(&mut self, binding: u32, buffer: Buffer, offset: u64) -> Result<()> {
        self.retain(buffer.clone());
        self.push(Command::SetVertexBuffer { binding, buffer, offset })
    }

    pub fn set_index_buffer(&mut self, buffer: Buffer, offset: u64, format: IndexFormat) -> Result<()> {
        self.retain(buffer.clone());
        self.push(Command::SetIndexBuffer { buffer, offset, format })
    }

    pub fn draw(&mut self, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32) -> Result<()> {
        self.push(Command::Draw {
            vertex_count,
            instance_count,
            first_vertex,
            first_instance,
        })
    }

    pub fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) -> Result<()> {
        self.push(Command::DrawIndexed {
            index_count,
            instance_count,
            first_index,
            vertex_offset,
            first_instance,
        })
    }

    pub fn dispatch(&mut self, x: u32, y: u32, z: u32) -> Result<()> {
        self.push(Command::Dispatch { x, y, z })
    }

    pub fn generate_mipmap(&mut self, texture: Texture) -> Result<()> {
        self.retain(texture.clone());
        self.push(Command::GenerateMipmap { texture })
    }

    /// Called by a backend's `GpuContext::submit` once replay has issued
    /// every command to the device and created a fence for the batch.
    pub fn attach_fence(&mut self, fence: Fence) {
        self.fence = Some(fence);
        self.state_ = Some(CommandBufferState::Submitted);
    }

    pub fn fence(&self) -> Option<&Fence> {
        self.fence.as_ref()
    }

    /// Blocks on the fence (if any), then releases the retention list and
    /// returns to Idle. Idempotent on an already-idle buffer.
    pub fn wait(&mut self, timeout: Duration) -> Result<()> {
        if let Some(fence) = self.fence.take() {
            fence.0.wait(timeout)?;
        }
        self.retained.clear();
        self.state_ = Some(CommandBufferState::Idle);
        Ok(())
    }

    pub fn retained_count(&self) -> usize {
        self.retained.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{FenceObject};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[derive(Debug)]
    struct ImmediateFence(AtomicBool);
    impl FenceObject for ImmediateFence {
        fn wait(&self, _timeout: Duration) -> Result<bool> {
            self.0.store(true, Ordering::SeqCst);
            Ok(true)
        }
        fn is_signaled(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    #[test]
    fn begin_twice_without_submit_discards_prior_recording() {
        let mut cb = CommandBuffer::new();
        cb.begin();
        cb.set_viewport(Viewport::default()).unwrap();
        cb.set_viewport(Viewport::default()).unwrap();
        assert_eq!(cb.commands().len(), 2);
        cb.begin();
        assert_eq!(cb.commands().len(), 0);
        assert_eq!(cb.retained_count(), 0);
    }

    #[test]
    fn wait_clears_retention_and_returns_to_idle() {
        let mut cb = CommandBuffer::new();
        cb.begin();
        cb.set_viewport(Viewport::default()).unwrap();
        cb.attach_fence(Fence(Arc::new(ImmediateFence(AtomicBool::new(false)))));
        assert_eq!(cb.state(), CommandBufferState::Submitted);
        cb.wait(Duration::from_secs(0)).unwrap();
        assert_eq!(cb.state(), CommandBufferState::Idle);
        assert_eq!(cb.retained_count(), 0);
    }

    #[test]
    fn recording_outside_recording_state_errors() {
        let mut cb = CommandBuffer::new();
        assert!(cb.set_viewport(Viewport::default()).is_err());
    }
}
