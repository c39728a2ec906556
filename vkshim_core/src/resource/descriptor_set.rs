//! Descriptor set layouts and immutable descriptor sets

use std::sync::Arc;
use crate::error::{Error, Result};
use crate::resource::{Buffer, ImageLayout, ImageView, NativeHandle, ObjectId, ShaderStageFlags};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorType {
    CombinedImageSampler,
    SampledImage,
    StorageImage,
    UniformBuffer,
    StorageBuffer,
    UniformBufferDynamic,
    StorageBufferDynamic,
    InputAttachment,
}

impl DescriptorType {
    pub fn is_buffer(self) -> bool {
        matches!(
            self,
            DescriptorType::UniformBuffer
                | DescriptorType::StorageBuffer
                | DescriptorType::UniformBufferDynamic
                | DescriptorType::StorageBufferDynamic
        )
    }

    /// Takes an offset from the dynamic offsets of a bind call
    pub fn is_dynamic(self) -> bool {
        matches!(self, DescriptorType::UniformBufferDynamic | DescriptorType::StorageBufferDynamic)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorSetLayoutBinding {
    pub binding: u32,
    pub descriptor_type: DescriptorType,
    pub descriptor_count: u32,
    pub stages: ShaderStageFlags,
}

#[derive(Debug)]
pub struct DescriptorSetLayout {
    id: ObjectId,
    bindings: Vec<DescriptorSetLayoutBinding>,
}

impl DescriptorSetLayout {
    pub fn new(mut bindings: Vec<DescriptorSetLayoutBinding>) -> Result<Arc<Self>> {
        bindings.sort_by_key(|binding| binding.binding);
        if let Some(pair) = bindings.windows(2).find(|pair| pair[0].binding == pair[1].binding) {
            return Err(Error::InvalidResource(format!("binding {} declared twice", pair[0].binding)));
        }
        if let Some(empty) = bindings.iter().find(|binding| binding.descriptor_count == 0) {
            return Err(Error::InvalidResource(format!("binding {} has zero descriptors", empty.binding)));
        }
        Ok(Arc::new(Self {
            id: ObjectId::next(),
            bindings,
        }))
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn bindings(&self) -> &[DescriptorSetLayoutBinding] {
        &self.bindings
    }

    pub fn binding(&self, binding: u32) -> Option<&DescriptorSetLayoutBinding> {
        self.bindings.iter().find(|description| description.binding == binding)
    }

    /// Number of native binding slots the set occupies
    pub fn binding_count(&self) -> u32 {
        self.bindings.iter()
            .map(|binding| binding.binding + binding.descriptor_count)
            .max()
            .unwrap_or(0)
    }
}

/// Resource written into one descriptor
#[derive(Debug, Clone)]
pub enum DescriptorResource {
    Buffer {
        buffer: Arc<Buffer>,
        offset: u64,
        range: u64,
    },
    Image {
        view: Arc<ImageView>,
        layout: ImageLayout,
        sampler: Option<NativeHandle>,
    },
}

#[derive(Debug, Clone)]
pub struct DescriptorWrite {
    pub binding: u32,
    pub array_element: u32,
    pub resources: Vec<DescriptorResource>,
}

/// One filled descriptor
#[derive(Debug, Clone)]
pub struct DescriptorEntry {
    pub binding: u32,
    pub array_element: u32,
    pub descriptor_type: DescriptorType,
    pub resource: DescriptorResource,
}

/// Immutable descriptor set
///
/// Entries are sorted by `(binding, array_element)`; dynamic offsets are consumed
/// in that order.
#[derive(Debug)]
pub struct DescriptorSet {
    id: ObjectId,
    layout: Arc<DescriptorSetLayout>,
    entries: Vec<DescriptorEntry>,
}

impl DescriptorSet {
    /// # Errors
    ///
    /// [`Error::InvalidResource`] when a write targets an undeclared binding, runs
    /// past the binding's descriptor count, or supplies a buffer for an image
    /// descriptor (or the reverse).
    pub fn new(layout: &Arc<DescriptorSetLayout>, writes: Vec<DescriptorWrite>) -> Result<Arc<Self>> {
        let mut entries: Vec<DescriptorEntry> = Vec::new();
        for write in writes {
            let description = layout.binding(write.binding).ok_or_else(|| {
                Error::InvalidResource(format!("binding {} is not in the set layout", write.binding))
            })?;
            if write.array_element + write.resources.len() as u32 > description.descriptor_count {
                return Err(Error::InvalidResource(format!(
                    "binding {} holds {} descriptors, write ends at {}",
                    write.binding,
                    description.descriptor_count,
                    write.array_element + write.resources.len() as u32
                )));
            }
            for (offset, resource) in write.resources.into_iter().enumerate() {
                let is_buffer = matches!(resource, DescriptorResource::Buffer { .. });
                if is_buffer != description.descriptor_type.is_buffer() {
                    return Err(Error::InvalidResource(format!(
                        "binding {} is {:?}, wrong resource kind written",
                        write.binding, description.descriptor_type
                    )));
                }
                let array_element = write.array_element + offset as u32;
                entries.retain(|entry| !(entry.binding == write.binding && entry.array_element == array_element));
                entries.push(DescriptorEntry {
                    binding: write.binding,
                    array_element,
                    descriptor_type: description.descriptor_type,
                    resource,
                });
            }
        }
        entries.sort_by_key(|entry| (entry.binding, entry.array_element));

        Ok(Arc::new(Self {
            id: ObjectId::next(),
            layout: Arc::clone(layout),
            entries,
        }))
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn layout(&self) -> &Arc<DescriptorSetLayout> {
        &self.layout
    }

    pub fn entries(&self) -> &[DescriptorEntry] {
        &self.entries
    }

    pub fn dynamic_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.descriptor_type.is_dynamic()).count()
    }
}
