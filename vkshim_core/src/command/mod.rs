pub mod command;
pub mod command_list;
pub mod command_buffer;

pub use command::*;
pub use command_list::CommandList;
pub use command_buffer::{
    CommandBuffer, CommandBufferLevel, CommandBufferResetFlags, CommandBufferState,
    CommandBufferUsageFlags, CommandPool, CommandPoolCreateFlags, InheritanceInfo,
};
