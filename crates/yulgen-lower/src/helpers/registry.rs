use indexmap::IndexMap;
use serde::Serialize;
use std::sync::{PoisonError, RwLock};
use tracing::trace;
use yulgen_core::types::Type;

/// Operation a generated helper function performs. Together with the types it is
/// parameterized by, it determines the helper's name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum HelperOp {
    Conversion,
    Cleanup,
    ReadFromStorage { offset: u32 },
    ReadFromStorageDynamic,
    UpdateStorageValue { offset: Option<u32> },
    StorageSetToZero,
    ZeroValue,
    ReadFromMemory,
    WriteToMemory,
    ReadFromCalldata,
    Increment,
    Decrement,
    Negate,
    CheckedAdd,
    CheckedSub,
    CheckedMul,
    CheckedDiv,
    CheckedMod,
    MappingIndexAccess,
    StorageArrayIndexAccess,
    MemoryArrayIndexAccess,
    CalldataArrayIndexAccess,
    ArrayLength,
    ArrayDataSlot,
    StorageArrayPop,
    StorageArrayPush,
    StorageArrayPushZero,
    AllocateMemoryArray,
    PackedHash,
    RequireOrAssert { is_assert: bool },
    ForwardRevert,
    ShiftLeft { bits: u32 },
    AbiEncodeTuple { library_types: bool },
    AbiDecodeTuple { from_memory: bool },
    InternalDispatch { parameters: usize, returns: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HelperRequest {
    pub name: String,
    pub op: HelperOp,
    pub types: Vec<Type>,
    pub target_types: Vec<Type>,
}

impl HelperRequest {
    pub fn new(name: String, op: HelperOp, types: Vec<Type>) -> Self {
        Self {
            name,
            op,
            types,
            target_types: Vec::new(),
        }
    }

    pub fn with_targets(mut self, target_types: Vec<Type>) -> Self {
        self.target_types = target_types;
        self
    }
}

/// Deduplicating collection of helper functions requested during lowering.
///
/// The registry may be shared between passes running on different threads. Each name is stored
/// once; later requests for the same name return the existing entry untouched.
#[derive(Debug, Default)]
pub struct HelperRegistry {
    functions: RwLock<IndexMap<String, HelperRequest>>,
}

impl HelperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `request` unless a helper of the same name exists, and returns the name.
    pub fn create_function(&self, request: HelperRequest) -> String {
        let name = request.name.clone();
        {
            let functions = self.functions.read().unwrap_or_else(PoisonError::into_inner);
            if functions.contains_key(&name) {
                return name;
            }
        }
        let mut functions = self.functions.write().unwrap_or_else(PoisonError::into_inner);
        functions.entry(name.clone()).or_insert_with(|| {
            trace!(helper = %request.name, "registered helper function");
            request
        });
        name
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.functions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all requests in first-request order.
    pub fn requests(&self) -> Vec<HelperRequest> {
        self.functions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.functions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}
