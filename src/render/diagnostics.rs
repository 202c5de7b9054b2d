/// Scoped capture of GPU errors around a group of device operations.
///
/// Push installs one error scope per error class; `finish` drains every
/// pending error, logs each one, and hands the messages back so the caller
/// can decide which error kind the failure maps to. A scope that is dropped
/// without being finished (an early return) still pops its error scopes so
/// the device's scope stack stays balanced.
pub struct GpuErrorScope<'a> {
    device: &'a wgpu::Device,
    label: &'static str,
    finished: bool,
}

const ERROR_FILTERS: [wgpu::ErrorFilter; 3] = [
    wgpu::ErrorFilter::Validation,
    wgpu::ErrorFilter::OutOfMemory,
    wgpu::ErrorFilter::Internal,
];

impl<'a> GpuErrorScope<'a> {
    pub fn push(device: &'a wgpu::Device, label: &'static str) -> Self {
        for filter in ERROR_FILTERS {
            device.push_error_scope(filter);
        }

        Self {
            device,
            label,
            finished: false,
        }
    }

    /// Drains all pending errors captured by this scope, newest class first.
    pub fn finish(mut self) -> Vec<String> {
        self.finished = true;

        let mut messages = Vec::new();

        for _ in ERROR_FILTERS {
            cfg_if::cfg_if! {
                if #[cfg(target_arch = "wasm32")] {
                    // The browser reports captured errors through the device's
                    // uncaptured-error handler instead; popping keeps the
                    // scope stack balanced.
                    let error = {
                        let _ = self.device.pop_error_scope();
                        None::<wgpu::Error>
                    };
                } else {
                    let error = pollster::block_on(self.device.pop_error_scope());
                }
            }

            if let Some(error) = error {
                log::error!("GPU error during {}: {error}", self.label);
                messages.push(error.to_string());
            }
        }

        messages
    }
}

impl Drop for GpuErrorScope<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        for _ in ERROR_FILTERS {
            let _ = self.device.pop_error_scope();
        }
    }
}
