/// Hands out monotonically increasing `u64` mesh instance IDs.
///
/// Unlike a slot allocator, IDs are never recycled: a stale ID held by a
/// destroyed component can never alias a live one.
///
/// # Example
///
/// ```ignore
/// let mut ids = MeshIdAllocator::new();
/// let a = ids.allocate()?;  // 0
/// let b = ids.allocate()?;  // 1
/// ```

use crate::error::{Error, Result};
use crate::resource::MeshInstanceId;

pub struct MeshIdAllocator {
    next_id: u64,
}

impl MeshIdAllocator {
    /// Create an allocator starting at ID 0
    pub fn new() -> Self {
        Self { next_id: 0 }
    }

    /// Allocate the next ID
    pub fn allocate(&mut self) -> Result<MeshInstanceId> {
        if self.next_id == u64::MAX {
            crate::engine_error!("lumen::MeshIdAllocator", "Mesh instance ID space exhausted");
            return Err(Error::InvalidResource("Mesh instance ID space exhausted".to_string()));
        }
        let id = MeshInstanceId(self.next_id);
        self.next_id += 1;
        Ok(id)
    }

    /// Number of IDs handed out so far
    pub fn allocated(&self) -> u64 {
        self.next_id
    }

    #[cfg(test)]
    pub(crate) fn starting_at(next_id: u64) -> Self {
        Self { next_id }
    }
}

impl Default for MeshIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "id_allocator_tests.rs"]
mod tests;
