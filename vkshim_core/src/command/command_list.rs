/// Frozen command sequence

use std::sync::Arc;
use crate::command::Command;
use crate::resource::ObjectId;

/// Ordered, immutable list of recorded commands
///
/// Produced by [`CommandBuffer::end`](crate::command::CommandBuffer::end). Cloning
/// shares the same commands; a secondary list executed from several primaries is
/// stored once.
#[derive(Debug, Clone)]
pub struct CommandList {
    id: ObjectId,
    commands: Arc<[Command]>,
}

impl CommandList {
    pub(crate) fn new(commands: Vec<Command>) -> Self {
        Self {
            id: ObjectId::next(),
            commands: commands.into(),
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Command> {
        self.commands.iter()
    }

    /// Whether both lists share the same frozen commands
    pub fn ptr_eq(&self, other: &CommandList) -> bool {
        Arc::ptr_eq(&self.commands, &other.commands)
    }
}

impl<'a> IntoIterator for &'a CommandList {
    type Item = &'a Command;
    type IntoIter = std::slice::Iter<'a, Command>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}
