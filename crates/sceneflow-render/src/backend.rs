//! Rendering backend initialization.

use crate::{RenderError, Result};
use std::sync::Arc;
use tracing::info;

/// wgpu-based rendering backend
pub struct WgpuBackend {
    pub instance: Arc<wgpu::Instance>,
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    pub adapter_info: wgpu::AdapterInfo,
}

impl WgpuBackend {
    /// Create a new wgpu backend.
    ///
    /// Modern backends (Vulkan, Metal, DX12) are tried first; GL is only a
    /// fallback because initializing it eagerly panics on headless systems.
    pub async fn new() -> Result<Self> {
        let safe_backends = wgpu::Backends::all() & !wgpu::Backends::GL;
        let primary_result = Self::new_with_backends(safe_backends).await;

        if primary_result.is_ok() {
            return primary_result;
        }

        info!("Primary backend initialization failed, attempting GL fallback...");
        Self::new_with_backends(wgpu::Backends::GL).await
    }

    /// Create a new wgpu backend restricted to the given backends.
    pub async fn new_with_backends(backends: wgpu::Backends) -> Result<Self> {
        info!("Initializing wgpu backend");

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });

        // Manual selection to prioritize Discrete > Integrated > CPU
        let mut adapter = None;
        let mut best_score = -1;
        for a in instance.enumerate_adapters(backends) {
            let info = a.get_info();
            let score = match info.device_type {
                wgpu::DeviceType::DiscreteGpu => 3,
                wgpu::DeviceType::IntegratedGpu => 2,
                wgpu::DeviceType::VirtualGpu => 1,
                wgpu::DeviceType::Cpu | wgpu::DeviceType::Other => 0,
            };
            if score > best_score {
                best_score = score;
                adapter = Some(a);
            }
        }

        if adapter.is_none() {
            adapter = instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::HighPerformance,
                    compatible_surface: None,
                    force_fallback_adapter: false,
                })
                .await
                .ok();
        }

        let adapter =
            adapter.ok_or_else(|| RenderError::DeviceError("No adapter found".to_string()))?;

        let adapter_info = adapter.get_info();
        info!(
            "Selected adapter: {} ({:?})",
            adapter_info.name, adapter_info.backend
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("SceneFlow Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                ..Default::default()
            })
            .await
            .map_err(|e: wgpu::RequestDeviceError| RenderError::DeviceError(e.to_string()))?;

        info!("Device created successfully");

        Ok(Self {
            instance: Arc::new(instance),
            device: Arc::new(device),
            queue: Arc::new(queue),
            adapter_info,
        })
    }

    /// Create a surface using the backend's instance.
    ///
    /// # Safety
    /// The window must outlive the surface
    pub fn create_surface(
        &self,
        window: Arc<winit::window::Window>,
    ) -> Result<wgpu::Surface<'static>> {
        self.instance
            .create_surface(window)
            .map_err(|e| RenderError::DeviceError(format!("Failed to create surface: {}", e)))
    }

    /// Get device limits
    pub fn limits(&self) -> wgpu::Limits {
        self.device.limits()
    }

    /// Get adapter info
    pub fn adapter_info(&self) -> &wgpu::AdapterInfo {
        &self.adapter_info
    }

    /// Get the preferred surface format.
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        wgpu::TextureFormat::Bgra8UnormSrgb
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_creation() {
        pollster::block_on(async {
            let backend = WgpuBackend::new().await;
            match backend {
                Ok(b) => println!("Backend: {:?}", b.adapter_info),
                // Headless CI without any GPU backend.
                Err(e) => eprintln!("SKIP: backend init failed gracefully: {}", e),
            }
        });
    }
}
