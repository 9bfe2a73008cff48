/*! Reusable helper functions referenced by generated code.
 *
 * Conversions, checked arithmetic, storage packing and ABI coding are emitted once per type as
 * shared functions rather than inlined at every use. The lowering engine only needs their names;
 * the registry remembers which ones were requested so their bodies can be generated afterwards.
 */

pub mod abi;
pub mod registry;
pub mod util;

pub use abi::AbiFunctions;
pub use registry::{HelperOp, HelperRegistry, HelperRequest};
pub use util::UtilFunctions;
