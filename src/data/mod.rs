//! Data module: attribute columns, stores and the typed-column registry.

pub mod attribute;
pub mod attribute_store;
pub mod registry;
pub mod storage;

pub use attribute::{
    AttributeBase, AttributeKind, AttributeLinearInterpolation, AttributeProperties,
    AttributeValue, ConstantAttribute, Interpolable, ReadOnlyAttribute, SparseAttribute,
    VariableAttribute,
};
pub use attribute_store::AttributeStore;
pub use registry::{AttributeRecord, AttributeRegistry, StoreRecord};
pub use storage::{Storage, VecStorage};
