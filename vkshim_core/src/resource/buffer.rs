//! Buffers

use std::sync::Arc;
use bitflags::bitflags;
use crate::error::{Error, Result};
use crate::resource::{NativeHandle, ObjectId};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsageFlags: u32 {
        const TRANSFER_SRC = 0x001;
        const TRANSFER_DST = 0x002;
        const UNIFORM_TEXEL_BUFFER = 0x004;
        const STORAGE_TEXEL_BUFFER = 0x008;
        const UNIFORM_BUFFER = 0x010;
        const STORAGE_BUFFER = 0x020;
        const INDEX_BUFFER = 0x040;
        const VERTEX_BUFFER = 0x080;
        const INDIRECT_BUFFER = 0x100;
    }
}

/// Whole-size sentinel for buffer ranges
pub const WHOLE_SIZE: u64 = u64::MAX;

/// Index element type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexType {
    #[default]
    U16,
    U32,
}

impl IndexType {
    pub fn size_bytes(self) -> u64 {
        match self {
            IndexType::U16 => 2,
            IndexType::U32 => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferCreateInfo {
    pub size: u64,
    pub usage: BufferUsageFlags,
    pub host_visible: bool,
}

/// Buffer wrapping an already-created native buffer
#[derive(Debug)]
pub struct Buffer {
    id: ObjectId,
    info: BufferCreateInfo,
    native: NativeHandle,
}

impl Buffer {
    pub fn new(info: BufferCreateInfo, native: NativeHandle) -> Result<Arc<Self>> {
        if info.size == 0 {
            return Err(Error::InvalidResource("buffer size is zero".to_string()));
        }
        if info.usage.is_empty() {
            return Err(Error::InvalidResource("buffer has no usage".to_string()));
        }
        Ok(Arc::new(Self {
            id: ObjectId::next(),
            info,
            native,
        }))
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn native(&self) -> NativeHandle {
        self.native
    }

    pub fn size(&self) -> u64 {
        self.info.size
    }

    pub fn usage(&self) -> BufferUsageFlags {
        self.info.usage
    }

    pub fn is_host_visible(&self) -> bool {
        self.info.host_visible
    }

    /// Concrete byte count of a `(offset, range)` pair, expanding [`WHOLE_SIZE`]
    pub fn range_size(&self, offset: u64, range: u64) -> u64 {
        if range == WHOLE_SIZE {
            self.info.size.saturating_sub(offset)
        } else {
            range
        }
    }
}
