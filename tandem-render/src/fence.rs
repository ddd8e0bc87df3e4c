//! GPU completion fence over `Queue::on_submitted_work_done`.

use std::sync::Arc;

use tandem_core::{CompletionToken, SignalToken};

use crate::context::GpuDevice;

/// Signals once every command buffer submitted before [`GpuFence::submit`]
/// has finished executing.
pub struct GpuFence {
    gpu: Arc<GpuDevice>,
    token: SignalToken,
}

impl GpuFence {
    /// Insert a fence after the work submitted so far on `gpu`'s queue.
    pub fn submit(gpu: &Arc<GpuDevice>) -> Self {
        let token = SignalToken::new();
        let signal = token.clone();
        gpu.queue.on_submitted_work_done(move || signal.signal());
        Self {
            gpu: Arc::clone(gpu),
            token,
        }
    }
}

impl CompletionToken for GpuFence {
    /// Drives the device without blocking, then checks the callback flag.
    fn is_complete(&self) -> bool {
        if self.token.is_complete() {
            return true;
        }
        let _ = self.gpu.device.poll(wgpu::Maintain::Poll);
        self.token.is_complete()
    }
}
