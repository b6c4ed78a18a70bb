use anyhow::Result;
use bytemuck::Pod;
use wgpu::util::DeviceExt;

/// GPU-resident buffer holding immutable data uploaded once at creation.
///
/// The contents are fixed for the lifetime of the buffer. [`Buffer::delete`]
/// frees the GPU memory right away; dropping the last handle does the same
/// once the GPU is done with it.
#[derive(Debug)]
pub struct Buffer {
    raw: wgpu::Buffer,
    label: String,
}

impl Buffer {
    /// Uploads `data` into a new buffer with the given usage.
    pub fn new<T: Pod>(
        device: &wgpu::Device,
        label: &str,
        data: &[T],
        usage: wgpu::BufferUsages,
    ) -> Result<Self> {
        let contents: &[u8] = bytemuck::cast_slice(data);
        check_contents(label, contents)?;

        let raw = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents,
            usage,
        });

        log::debug!("created buffer \"{label}\" ({} bytes)", contents.len());

        Ok(Self {
            raw,
            label: label.to_string(),
        })
    }

    /// Uploads `data` as a vertex buffer.
    pub fn vertex<T: Pod>(device: &wgpu::Device, label: &str, data: &[T]) -> Result<Self> {
        Self::new(device, label, data, wgpu::BufferUsages::VERTEX)
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.raw.size()
    }

    /// Debug label the buffer was created with.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn raw(&self) -> &wgpu::Buffer {
        &self.raw
    }

    /// Frees the GPU memory immediately.
    ///
    /// Any model still referencing this buffer must not be drawn afterwards.
    pub fn delete(self) {
        log::debug!("deleting buffer \"{}\"", self.label);
        self.raw.destroy();
    }
}

/// Rejects empty uploads.
pub(crate) fn check_contents(label: &str, contents: &[u8]) -> Result<()> {
    anyhow::ensure!(!contents.is_empty(), "buffer \"{label}\" created from empty data");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_data_is_rejected() {
        let empty: &[[f32; 2]] = &[];
        let err = check_contents("offsets", bytemuck::cast_slice(empty)).unwrap_err();
        assert!(err.to_string().contains("\"offsets\""));
    }

    #[test]
    fn single_element_is_accepted() {
        let one = [[0.5f32, 0.5, 0.5]];
        assert!(check_contents("colors", bytemuck::cast_slice(&one)).is_ok());
    }
}
