use super::registry::{HelperOp, HelperRegistry, HelperRequest};
use crate::errors::{CodegenError, Result};
use crate::invariant;
use yulgen_core::types::{ArrayType, Type};

/// Names of the reusable helper functions the lowering engine calls into.
///
/// Every accessor registers its helper on first use and returns a name that is stable for the
/// given operation and types.
pub struct UtilFunctions<'a> {
    registry: &'a HelperRegistry,
}

impl<'a> UtilFunctions<'a> {
    pub fn new(registry: &'a HelperRegistry) -> Self {
        Self { registry }
    }

    fn single(&self, name: String, op: HelperOp, ty: &Type) -> String {
        self.registry
            .create_function(HelperRequest::new(name, op, vec![ty.clone()]))
    }

    pub fn conversion_function(&self, from: &Type, to: &Type) -> String {
        let name = format!("convert_{}_to_{}", from.identifier(), to.identifier());
        self.registry.create_function(HelperRequest::new(
            name,
            HelperOp::Conversion,
            vec![from.clone(), to.clone()],
        ))
    }

    pub fn cleanup_function(&self, ty: &Type) -> String {
        self.single(format!("cleanup_{}", ty.identifier()), HelperOp::Cleanup, ty)
    }

    pub fn read_from_storage(&self, ty: &Type, offset: u32) -> String {
        self.single(
            format!("read_from_storage_offset_{}_{}", offset, ty.identifier()),
            HelperOp::ReadFromStorage { offset },
            ty,
        )
    }

    pub fn read_from_storage_dynamic(&self, ty: &Type) -> String {
        self.single(
            format!("read_from_storage_dynamic_{}", ty.identifier()),
            HelperOp::ReadFromStorageDynamic,
            ty,
        )
    }

    /// Without a static offset the helper takes the byte offset as its second argument.
    pub fn update_storage_value_function(&self, ty: &Type, offset: Option<u32>) -> String {
        let name = match offset {
            Some(offset) => format!("update_storage_value_offset_{}_{}", offset, ty.identifier()),
            None => format!("update_storage_value_{}", ty.identifier()),
        };
        self.single(name, HelperOp::UpdateStorageValue { offset }, ty)
    }

    pub fn storage_set_to_zero_function(&self, ty: &Type) -> String {
        self.single(
            format!("storage_set_to_zero_{}", ty.identifier()),
            HelperOp::StorageSetToZero,
            ty,
        )
    }

    pub fn zero_value_function(&self, ty: &Type) -> String {
        self.single(
            format!("zero_value_for_{}", ty.identifier()),
            HelperOp::ZeroValue,
            ty,
        )
    }

    pub fn read_from_memory(&self, ty: &Type) -> String {
        self.single(
            format!("read_from_memory_{}", ty.identifier()),
            HelperOp::ReadFromMemory,
            ty,
        )
    }

    pub fn write_to_memory_function(&self, ty: &Type) -> String {
        self.single(
            format!("write_to_memory_{}", ty.identifier()),
            HelperOp::WriteToMemory,
            ty,
        )
    }

    pub fn read_from_calldata(&self, ty: &Type) -> String {
        self.single(
            format!("read_from_calldata_{}", ty.identifier()),
            HelperOp::ReadFromCalldata,
            ty,
        )
    }

    pub fn increment_checked_function(&self, ty: &Type) -> String {
        self.single(format!("increment_{}", ty.identifier()), HelperOp::Increment, ty)
    }

    pub fn decrement_checked_function(&self, ty: &Type) -> String {
        self.single(format!("decrement_{}", ty.identifier()), HelperOp::Decrement, ty)
    }

    pub fn negate_number_checked_function(&self, ty: &Type) -> String {
        self.single(format!("negate_{}", ty.identifier()), HelperOp::Negate, ty)
    }

    pub fn overflow_checked_int_add_function(&self, ty: &Type) -> String {
        self.single(format!("checked_add_{}", ty.identifier()), HelperOp::CheckedAdd, ty)
    }

    pub fn overflow_checked_int_sub_function(&self, ty: &Type) -> String {
        self.single(format!("checked_sub_{}", ty.identifier()), HelperOp::CheckedSub, ty)
    }

    pub fn overflow_checked_int_mul_function(&self, ty: &Type) -> String {
        self.single(format!("checked_mul_{}", ty.identifier()), HelperOp::CheckedMul, ty)
    }

    pub fn overflow_checked_int_div_function(&self, ty: &Type) -> String {
        self.single(format!("checked_div_{}", ty.identifier()), HelperOp::CheckedDiv, ty)
    }

    pub fn checked_int_mod_function(&self, ty: &Type) -> String {
        self.single(format!("checked_mod_{}", ty.identifier()), HelperOp::CheckedMod, ty)
    }

    pub fn mapping_index_access_function(&self, mapping: &Type, key: &Type) -> String {
        let name = format!(
            "mapping_index_access_{}_of_{}",
            mapping.identifier(),
            key.identifier()
        );
        self.registry.create_function(HelperRequest::new(
            name,
            HelperOp::MappingIndexAccess,
            vec![mapping.clone(), key.clone()],
        ))
    }

    pub fn storage_array_index_access_function(&self, array: &Type) -> String {
        self.single(
            format!("storage_array_index_access_{}", array.identifier()),
            HelperOp::StorageArrayIndexAccess,
            array,
        )
    }

    pub fn memory_array_index_access_function(&self, array: &Type) -> String {
        self.single(
            format!("memory_array_index_access_{}", array.identifier()),
            HelperOp::MemoryArrayIndexAccess,
            array,
        )
    }

    pub fn calldata_array_index_access_function(&self, array: &Type) -> String {
        self.single(
            format!("calldata_array_index_access_{}", array.identifier()),
            HelperOp::CalldataArrayIndexAccess,
            array,
        )
    }

    pub fn array_length_function(&self, array: &Type) -> String {
        self.single(
            format!("array_length_{}", array.identifier()),
            HelperOp::ArrayLength,
            array,
        )
    }

    pub fn array_data_area_function(&self, array: &Type) -> String {
        self.single(
            format!("array_dataslot_{}", array.identifier()),
            HelperOp::ArrayDataSlot,
            array,
        )
    }

    pub fn storage_array_pop_function(&self, array: &Type) -> String {
        self.single(
            format!("array_pop_{}", array.identifier()),
            HelperOp::StorageArrayPop,
            array,
        )
    }

    pub fn storage_array_push_function(&self, array: &Type) -> String {
        self.single(
            format!("array_push_{}", array.identifier()),
            HelperOp::StorageArrayPush,
            array,
        )
    }

    pub fn storage_array_push_zero_function(&self, array: &Type) -> String {
        self.single(
            format!("array_push_zero_{}", array.identifier()),
            HelperOp::StorageArrayPushZero,
            array,
        )
    }

    pub fn allocate_memory_array_function(&self, array: &Type) -> String {
        self.single(
            format!("allocate_memory_array_{}", array.identifier()),
            HelperOp::AllocateMemoryArray,
            array,
        )
    }

    pub fn packed_hash_function(&self, given: &[Type], targets: &[Type]) -> String {
        let name = format!(
            "packed_hashed_{}_to_{}",
            join_identifiers(given),
            join_identifiers(targets)
        );
        self.registry.create_function(
            HelperRequest::new(name, HelperOp::PackedHash, given.to_vec())
                .with_targets(targets.to_vec()),
        )
    }

    pub fn require_or_assert_function(&self, is_assert: bool, message: Option<&Type>) -> String {
        let name = match (is_assert, message) {
            (true, _) => "assert_helper".to_string(),
            (false, None) => "require_helper".to_string(),
            (false, Some(message)) => format!("require_helper_{}", message.identifier()),
        };
        self.registry.create_function(HelperRequest::new(
            name,
            HelperOp::RequireOrAssert { is_assert },
            message.into_iter().cloned().collect(),
        ))
    }

    pub fn forwarding_revert_function(&self) -> String {
        self.registry.create_function(HelperRequest::new(
            "revert_forward_1".to_string(),
            HelperOp::ForwardRevert,
            Vec::new(),
        ))
    }

    pub fn shift_left_function(&self, bits: u32) -> String {
        self.registry.create_function(HelperRequest::new(
            format!("shift_left_{}", bits),
            HelperOp::ShiftLeft { bits },
            Vec::new(),
        ))
    }

    pub fn internal_dispatch_function(&self, parameters: usize, returns: usize) -> String {
        self.registry.create_function(HelperRequest::new(
            format!("dispatch_internal_in_{}_out_{}", parameters, returns),
            HelperOp::InternalDispatch {
                parameters,
                returns,
            },
            Vec::new(),
        ))
    }
}

pub(crate) fn join_identifiers(types: &[Type]) -> String {
    types
        .iter()
        .map(Type::identifier)
        .collect::<Vec<_>>()
        .join("_")
}

/// The array type behind a `Type::Array`, or an invariant violation naming `context`.
pub(crate) fn expect_array<'t>(ty: &'t Type, context: &str) -> Result<&'t ArrayType> {
    match ty {
        Type::Array(array) => Ok(array),
        other => Err(CodegenError::invariant(format!(
            "{} expects an array type, got {}",
            context, other
        ))),
    }
}

pub(crate) fn expect_stack_size(ty: &Type, size: usize, context: &str) -> Result<()> {
    invariant!(
        ty.size_on_stack() == size,
        "{}: {} occupies {} stack slot(s), expected {}",
        context,
        ty,
        ty.size_on_stack(),
        size
    );
    Ok(())
}
