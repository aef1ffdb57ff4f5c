//! Bulk address-space population.
//!
//! For every supported builtin type one scalar and one fixed-length array
//! variable are created, holding the type's default value. They exist to
//! exercise the runtime's full type catalog and carry no data source.
use ng_uaserver_error::{NGError, NGResult};
use ng_uaserver_sdk::{BuiltinType, NodeKey, ObjectNode, ServerRuntime, StaticValue, ValueShape, VariableNode};
use tracing::{debug, info};

pub const DEMO_FOLDER_ID: u32 = 50000;
pub const SCALAR_FOLDER_ID: u32 = 50001;
pub const ARRAY_FOLDER_ID: u32 = 50002;
/// Dynamic ids start above every statically reserved id.
pub const DYNAMIC_ID_SEED: u32 = 51000;
pub const ARRAY_LENGTH: u32 = 10;

/// Monotonic numeric id counter, pre-incremented.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    last: u32,
}

impl IdAllocator {
    pub fn seeded(seed: u32) -> Self {
        Self { last: seed }
    }

    pub fn allocate(&mut self) -> NGResult<u32> {
        self.last = self
            .last
            .checked_add(1)
            .ok_or_else(|| NGError::RegistrationError("numeric node ids exhausted".into()))?;
        Ok(self.last)
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::seeded(DYNAMIC_ID_SEED)
    }
}

/// One generated variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressSpaceEntry {
    pub name: String,
    pub id: u32,
    pub parent: u32,
    pub data_type: BuiltinType,
    pub shape: ValueShape,
}

impl AddressSpaceEntry {
    fn into_node(self) -> VariableNode {
        VariableNode {
            id: NodeKey::Numeric(self.id),
            browse_name: self.name,
            parent: NodeKey::Numeric(self.parent),
            value: StaticValue::Default {
                data_type: self.data_type,
                shape: self.shape,
            },
        }
    }
}

/// Plan the scalar and array entries for `types`.
///
/// Input order and duplicates do not matter; meta types are skipped.
pub fn plan(types: &[BuiltinType], ids: &mut IdAllocator) -> NGResult<Vec<AddressSpaceEntry>> {
    let mut types: Vec<BuiltinType> = types.iter().copied().filter(|t| !t.is_meta()).collect();
    types.sort_by_key(|t| t.ordinal());
    types.dedup();

    let mut entries = Vec::with_capacity(types.len() * 2);
    for data_type in types {
        let name = format!("{:02}", data_type.ordinal());
        entries.push(AddressSpaceEntry {
            name: name.clone(),
            id: ids.allocate()?,
            parent: SCALAR_FOLDER_ID,
            data_type,
            shape: ValueShape::Scalar,
        });
        entries.push(AddressSpaceEntry {
            name,
            id: ids.allocate()?,
            parent: ARRAY_FOLDER_ID,
            data_type,
            shape: ValueShape::Array(ARRAY_LENGTH),
        });
    }
    Ok(entries)
}

/// Create the `Demo/Scalar` and `Demo/Array` folders and fill them.
///
/// Returns the generated entries.
pub fn populate<R>(runtime: &mut R, types: &[BuiltinType]) -> NGResult<Vec<AddressSpaceEntry>>
where
    R: ServerRuntime + ?Sized,
{
    runtime.add_object(ObjectNode {
        id: NodeKey::Numeric(DEMO_FOLDER_ID),
        browse_name: "Demo".to_string(),
        parent: NodeKey::ObjectsFolder,
    })?;
    for (id, name) in [(SCALAR_FOLDER_ID, "Scalar"), (ARRAY_FOLDER_ID, "Array")] {
        runtime.add_object(ObjectNode {
            id: NodeKey::Numeric(id),
            browse_name: name.to_string(),
            parent: NodeKey::Numeric(DEMO_FOLDER_ID),
        })?;
    }

    let entries = plan(types, &mut IdAllocator::default())?;
    for entry in &entries {
        debug!(node = entry.id, name = %entry.name, data_type = %entry.data_type, "Adding demo variable");
        runtime.add_variable(entry.clone().into_node())?;
    }
    info!(count = entries.len(), "Demo address space populated");
    Ok(entries)
}
