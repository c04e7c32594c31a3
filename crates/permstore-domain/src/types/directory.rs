//! Instance enumeration backed by the object directory.

use std::sync::Arc;

use crate::error::DomainResult;
use crate::model::{NodeId, ObjectId, TypeId};
use crate::resolver::ObjectDirectory;

use super::InstanceEnumerator;

/// Lists instances of one type through [`ObjectDirectory::children`].
pub struct DirectoryEnumerator {
    directory: Arc<dyn ObjectDirectory>,
    obj_type: TypeId,
}

impl DirectoryEnumerator {
    pub fn new(directory: Arc<dyn ObjectDirectory>, obj_type: TypeId) -> Self {
        Self {
            directory,
            obj_type,
        }
    }
}

impl InstanceEnumerator for DirectoryEnumerator {
    fn instance_ids(
        &self,
        parent_id: Option<ObjectId>,
        channel_id: Option<NodeId>,
    ) -> DomainResult<Vec<ObjectId>> {
        Ok(self
            .directory
            .children(self.obj_type, parent_id, channel_id)?)
    }
}

impl super::TypeRegistryBuilder {
    /// Registers a [`DirectoryEnumerator`] for every instantiable type.
    pub fn directory(self, directory: Arc<dyn ObjectDirectory>) -> Self {
        super::TYPE_TABLE
            .iter()
            .filter(|entry| entry.instantiable)
            .fold(self, |builder, entry| {
                builder.enumerator(
                    entry.obj_type,
                    DirectoryEnumerator::new(Arc::clone(&directory), entry.obj_type),
                )
            })
    }
}
