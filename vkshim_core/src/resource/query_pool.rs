//! Query pools

use std::sync::Arc;
use bitflags::bitflags;
use crate::error::{Error, Result};
use crate::resource::ObjectId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryType {
    Occlusion,
    PipelineStatistics,
    Timestamp,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct QueryControlFlags: u32 {
        const PRECISE = 0x1;
    }
}

/// Pool of queries; backends create the native query objects lazily
#[derive(Debug)]
pub struct QueryPool {
    id: ObjectId,
    query_type: QueryType,
    count: u32,
}

impl QueryPool {
    pub fn new(query_type: QueryType, count: u32) -> Result<Arc<Self>> {
        if count == 0 {
            return Err(Error::InvalidResource("query pool with zero queries".to_string()));
        }
        Ok(Arc::new(Self {
            id: ObjectId::next(),
            query_type,
            count,
        }))
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn query_type(&self) -> QueryType {
        self.query_type
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}
