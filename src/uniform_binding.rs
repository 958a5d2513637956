//! # Uniform Binding
//!
//! A [`UniformBinding`] bundles the three `wgpu` objects needed to feed one uniform struct to
//! a shader: the buffer holding the bytes, a bind group layout describing a single uniform
//! entry at binding 0, and the bind group tying the two together.
//!
//! The binding is generic over the uniform type so the camera, lighting and per-mesh
//! uniforms all go through the same code path:
//!
//! ```rust,ignore
//! let camera = UniformBinding::<CameraUniform>::new(
//!     &device,
//!     "camera",
//!     wgpu::ShaderStages::VERTEX_FRAGMENT,
//! );
//! camera.update(&queue, &CameraUniform::from(&scene.camera));
//! ```

use std::marker::PhantomData;

/// A uniform buffer plus its bind group and layout.
///
/// # Fields
/// - `buffer`: GPU buffer sized for exactly one `T`.
/// - `bind_group`: bind group exposing `buffer` at binding 0.
/// - `bind_group_layout`: layout used when building pipeline layouts.
pub struct UniformBinding<T> {
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
    _uniform: PhantomData<T>,
}

impl<T: bytemuck::Pod + Default> UniformBinding<T> {
    /// Creates the buffer (initialized with `T::default()`), the layout and the bind group.
    ///
    /// # Parameters
    /// - `label`: prefix for the debug labels of the created objects.
    /// - `visibility`: shader stages allowed to read the uniform.
    pub fn new(device: &wgpu::Device, label: &str, visibility: wgpu::ShaderStages) -> Self {
        let buffer = wgpu::util::DeviceExt::create_buffer_init(
            device,
            &wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} Uniform Buffer")),
                contents: bytemuck::cast_slice(&[T::default()]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            },
        );

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some(&format!("{label}_bind_group_layout")),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some(&format!("{label}_bind_group")),
        });

        Self {
            buffer,
            bind_group,
            bind_group_layout,
            _uniform: PhantomData,
        }
    }

    /// Queues a write of `value` into the buffer. Takes effect at the next submit.
    pub fn update(&self, queue: &wgpu::Queue, value: &T) {
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(value));
    }

    /// Frees the GPU buffer immediately instead of waiting for the last reference to drop.
    pub fn destroy(&self) {
        self.buffer.destroy();
    }
}
