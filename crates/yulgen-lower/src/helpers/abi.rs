use super::registry::{HelperOp, HelperRegistry, HelperRequest};
use super::util::join_identifiers;
use yulgen_core::types::Type;

/// Names of the ABI tuple encoder and decoder helpers.
pub struct AbiFunctions<'a> {
    registry: &'a HelperRegistry,
}

impl<'a> AbiFunctions<'a> {
    pub fn new(registry: &'a HelperRegistry) -> Self {
        Self { registry }
    }

    /// `encoder(headStart, values...) -> tail` encoding `given` values as `targets`.
    pub fn tuple_encoder(&self, given: &[Type], targets: &[Type], library_types: bool) -> String {
        let name = format!(
            "abi_encode_tuple_{}__to_{}{}",
            join_identifiers(given),
            join_identifiers(targets),
            if library_types { "_library" } else { "" }
        );
        self.registry.create_function(
            HelperRequest::new(name, HelperOp::AbiEncodeTuple { library_types }, given.to_vec())
                .with_targets(targets.to_vec()),
        )
    }

    /// `decoder(headStart, dataEnd) -> values...`.
    pub fn tuple_decoder(&self, types: &[Type], from_memory: bool) -> String {
        let name = format!(
            "abi_decode_tuple_{}{}",
            join_identifiers(types),
            if from_memory { "_fromMemory" } else { "" }
        );
        self.registry.create_function(HelperRequest::new(
            name,
            HelperOp::AbiDecodeTuple { from_memory },
            types.to_vec(),
        ))
    }
}
