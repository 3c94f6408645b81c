//! Texture management and pooling

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Handle to a GPU texture
#[derive(Clone)]
pub struct TextureHandle {
    pub id: u64,
    pub texture: Arc<wgpu::Texture>,
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
}

impl TextureHandle {
    /// Create a texture view
    pub fn create_view(&self) -> wgpu::TextureView {
        self.texture
            .create_view(&wgpu::TextureViewDescriptor::default())
    }

    /// Get texture size in bytes
    pub fn size_bytes(&self) -> u64 {
        // All formats used here are 4 bytes per pixel.
        (self.width * self.height * 4) as u64
    }
}

/// Texture pool keyed by name, for reusing allocations
pub struct TexturePool {
    device: Arc<wgpu::Device>,
    textures: RwLock<HashMap<String, TextureHandle>>,
    views: RwLock<HashMap<String, Arc<wgpu::TextureView>>>,
}

impl TexturePool {
    pub fn new(device: Arc<wgpu::Device>) -> Self {
        Self {
            device,
            textures: RwLock::new(HashMap::new()),
            views: RwLock::new(HashMap::new()),
        }
    }

    /// Create a new managed texture, replacing any previous one of this name.
    pub fn create(
        &self,
        name: &str,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        usage: wgpu::TextureUsages,
    ) -> TextureHandle {
        static COUNTER: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(0);
        let id = COUNTER.fetch_add(1, std::sync::atomic::Ordering::Relaxed);

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(name),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });

        let handle = TextureHandle {
            id,
            texture: Arc::new(texture),
            width,
            height,
            format,
        };

        let view = handle.create_view();

        // Insert view first so a concurrent get_view never sees a texture
        // without its view.
        self.views
            .write()
            .insert(name.to_string(), Arc::new(view));
        self.textures.write().insert(name.to_string(), handle.clone());

        handle
    }

    /// Get a texture handle by name.
    pub fn get(&self, name: &str) -> Option<TextureHandle> {
        self.textures.read().get(name).cloned()
    }

    /// Get a texture view by name.
    pub fn get_view(&self, name: &str) -> Option<Arc<wgpu::TextureView>> {
        self.views.read().get(name).cloned()
    }

    /// Check if a texture exists in the pool.
    pub fn has_texture(&self, name: &str) -> bool {
        self.textures.read().contains_key(name)
    }

    /// Resize a texture if its dimensions have changed. Returns the current
    /// handle.
    pub fn resize_if_needed(
        &self,
        name: &str,
        new_width: u32,
        new_height: u32,
    ) -> Option<TextureHandle> {
        let mut textures = self.textures.write();
        let handle = textures.get_mut(name)?;
        if handle.width != new_width || handle.height != new_height {
            let new_texture = self.device.create_texture(&wgpu::TextureDescriptor {
                label: Some(name),
                size: wgpu::Extent3d {
                    width: new_width,
                    height: new_height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: handle.format,
                usage: handle.texture.usage(),
                view_formats: &[],
            });

            handle.texture = Arc::new(new_texture);
            handle.width = new_width;
            handle.height = new_height;

            let new_view = handle.create_view();
            self.views
                .write()
                .insert(name.to_string(), Arc::new(new_view));
        }
        Some(handle.clone())
    }

    /// Release a texture, making its allocation reclaimable.
    pub fn release(&self, name: &str) {
        self.textures.write().remove(name);
        self.views.write().remove(name);
    }
}
