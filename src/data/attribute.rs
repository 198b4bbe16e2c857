//! Typed attribute columns attached to an entity index set.
//!
//! An attribute associates one value with every element of an
//! [`EntityIndexSet`](crate::topology::entity_set::EntityIndexSet). Three
//! storage kinds are provided:
//!
//! - [`VariableAttribute`]: one slot per element (dense).
//! - [`ConstantAttribute`]: a single value shared by every element.
//! - [`SparseAttribute`]: a default value plus explicit overrides.
//!
//! Columns are stored type-erased behind [`AttributeBase`] so that an
//! [`AttributeStore`](crate::data::attribute_store::AttributeStore) can resize,
//! compact and permute all of them at once. Structural methods take an
//! [`AttributeKey`] that only this crate can produce: outside code changes the
//! element count exclusively through the owning index set.

use std::any::Any;
use std::collections::HashMap;
use std::fmt::Debug;

use num_traits::{Float, FromPrimitive};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::data::registry::AttributeRecord;
use crate::data::storage::{Storage, VecStorage};
use crate::mesh_error::MeshError;
use crate::topology::index;

/// Passkey for structural attribute operations (resize, delete, permute).
#[derive(Clone, Copy, Debug)]
pub struct AttributeKey {
    _private: (),
}

impl AttributeKey {
    pub(crate) const fn new() -> Self {
        Self { _private: () }
    }
}

/// A value type that can live in an attribute column.
///
/// `TYPE_TAG` is the stable name written next to persisted columns; the
/// [`AttributeRegistry`](crate::data::registry::AttributeRegistry) uses it to
/// find the loader when the concrete type is not known at compile time.
pub trait AttributeValue:
    Clone + Debug + Send + Sync + Serialize + DeserializeOwned + 'static
{
    const TYPE_TAG: &'static str;
}

macro_rules! impl_attribute_value {
    ($($ty:ty => $tag:literal),* $(,)?) => {
        $(
            impl AttributeValue for $ty {
                const TYPE_TAG: &'static str = $tag;
            }
        )*
    };
}

impl_attribute_value! {
    bool => "bool",
    u8 => "u8",
    u32 => "u32",
    u64 => "u64",
    i32 => "i32",
    i64 => "i64",
    f32 => "f32",
    f64 => "f64",
    usize => "index",
    String => "string",
    Option<usize> => "optional_index",
    [usize; 2] => "index2",
    [usize; 3] => "index3",
    [f64; 2] => "f64x2",
    [f64; 3] => "f64x3",
    Vec<usize> => "index_list",
    Vec<f64> => "f64_list",
}

/// Storage kind of an attribute column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeKind {
    Variable,
    Constant,
    Sparse,
}

/// Flags that decide which value operations touch a column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeProperties {
    /// Copied by [`AttributeStore::assign_attribute_value`](crate::data::attribute_store::AttributeStore::assign_attribute_value).
    pub assignable: bool,
    /// Computed by [`AttributeStore::interpolate_attribute_value`](crate::data::attribute_store::AttributeStore::interpolate_attribute_value).
    pub interpolable: bool,
}

impl AttributeProperties {
    pub const fn new(assignable: bool, interpolable: bool) -> Self {
        Self {
            assignable,
            interpolable,
        }
    }
}

/// Weighted combination of existing elements, used to fill a new one.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttributeLinearInterpolation {
    indices: Vec<usize>,
    lambdas: Vec<f64>,
}

impl AttributeLinearInterpolation {
    /// # Errors
    /// Returns `InvalidInterpolation` if the two lists differ in length.
    pub fn new(indices: Vec<usize>, lambdas: Vec<f64>) -> Result<Self, MeshError> {
        if indices.len() != lambdas.len() {
            return Err(MeshError::InvalidInterpolation {
                indices: indices.len(),
                lambdas: lambdas.len(),
            });
        }
        Ok(Self { indices, lambdas })
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn lambdas(&self) -> &[f64] {
        &self.lambdas
    }
}

/// Value types that support linear interpolation.
pub trait Interpolable: AttributeValue {
    fn interpolate(values: &[&Self], lambdas: &[f64]) -> Self;
}

fn weighted_sum<T: Float + FromPrimitive>(values: &[&T], lambdas: &[f64]) -> T {
    values
        .iter()
        .zip(lambdas)
        .fold(T::zero(), |acc, (&&v, &l)| {
            acc + v * T::from_f64(l).unwrap_or_else(T::zero)
        })
}

impl Interpolable for f64 {
    fn interpolate(values: &[&Self], lambdas: &[f64]) -> Self {
        weighted_sum(values, lambdas)
    }
}

impl Interpolable for f32 {
    fn interpolate(values: &[&Self], lambdas: &[f64]) -> Self {
        weighted_sum(values, lambdas)
    }
}

macro_rules! impl_interpolable_array {
    ($($n:literal),*) => {
        $(
            impl Interpolable for [f64; $n] {
                fn interpolate(values: &[&Self], lambdas: &[f64]) -> Self {
                    std::array::from_fn(|c| {
                        values.iter().zip(lambdas).map(|(v, l)| v[c] * l).sum()
                    })
                }
            }
        )*
    };
}

impl_interpolable_array!(2, 3);

/// Function computing an interpolated value; see [`Interpolable`].
pub type Interpolator<T> = fn(&[&T], &[f64]) -> T;

/// Type-erased interface every column implements.
pub trait AttributeBase: Debug + Send + Sync + Any {
    fn name(&self) -> &str;

    /// Tag of the stored value type (see [`AttributeValue::TYPE_TAG`]).
    fn type_tag(&self) -> &'static str;

    fn kind(&self) -> AttributeKind;

    fn properties(&self) -> AttributeProperties;

    fn set_properties(&mut self, properties: AttributeProperties);

    /// Number of stored slots; `None` for kinds that store no per-element slot.
    fn dense_len(&self) -> Option<usize>;

    /// Encode the column for the persistence layer.
    fn to_record(&self) -> Result<AttributeRecord, MeshError>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn set_name(&mut self, name: &str, key: AttributeKey);

    fn resize(&mut self, len: usize, key: AttributeKey);

    fn reserve(&mut self, capacity: usize, key: AttributeKey);

    fn delete_elements(&mut self, to_delete: &[bool], key: AttributeKey);

    fn permute_elements(&mut self, permutation: &[usize], key: AttributeKey);

    fn assign_value(&mut self, from: usize, to: usize, key: AttributeKey);

    fn interpolate_value(
        &mut self,
        interpolation: &AttributeLinearInterpolation,
        to: usize,
        key: AttributeKey,
    );

    fn clone_boxed(&self, key: AttributeKey) -> Box<dyn AttributeBase>;
}

/// Read access shared by all storage kinds.
pub trait ReadOnlyAttribute<T>: AttributeBase {
    fn value(&self, element: usize) -> &T;

    fn default_value(&self) -> &T;
}

/// Statically typed column, used for typed lookups in a store.
pub trait TypedAttribute: AttributeBase + Sized {
    type Value: AttributeValue;
    const KIND: AttributeKind;
}

pub(crate) fn encode_payload<P: Serialize>(
    name: &str,
    payload: &P,
) -> Result<serde_json::Value, MeshError> {
    serde_json::to_value(payload).map_err(|e| MeshError::AttributeSerialization {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

pub(crate) fn decode_payload<P: DeserializeOwned>(
    name: &str,
    payload: serde_json::Value,
) -> Result<P, MeshError> {
    serde_json::from_value(payload).map_err(|e| MeshError::AttributeSerialization {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Variable
// ---------------------------------------------------------------------------

/// One value per element.
#[derive(Debug)]
pub struct VariableAttribute<T: AttributeValue> {
    name: String,
    default_value: T,
    values: VecStorage<T>,
    properties: AttributeProperties,
    interpolator: Option<Interpolator<T>>,
}

#[derive(Serialize, Deserialize)]
pub(crate) struct VariablePayload<T> {
    pub(crate) default_value: T,
    pub(crate) values: Vec<T>,
}

impl<T: AttributeValue> VariableAttribute<T> {
    pub(crate) fn new(
        name: &str,
        default_value: T,
        properties: AttributeProperties,
        len: usize,
    ) -> Self {
        Self {
            name: name.to_string(),
            values: VecStorage::with_len(len, default_value.clone()),
            default_value,
            properties,
            interpolator: None,
        }
    }

    pub(crate) fn with_interpolator(mut self, interpolator: Interpolator<T>) -> Self {
        self.interpolator = Some(interpolator);
        self
    }

    pub(crate) fn from_payload(
        name: &str,
        properties: AttributeProperties,
        payload: VariablePayload<T>,
        len: usize,
    ) -> Result<Self, MeshError> {
        if payload.values.len() != len {
            return Err(MeshError::AttributeSerialization {
                name: name.to_string(),
                reason: format!("{} values for {len} elements", payload.values.len()),
            });
        }
        Ok(Self {
            name: name.to_string(),
            default_value: payload.default_value,
            values: VecStorage::from(payload.values),
            properties,
            interpolator: None,
        })
    }

    #[inline]
    pub fn value(&self, element: usize) -> &T {
        debug_assert!(
            element < self.values.len(),
            "[VariableAttribute::value] element {element} out of range in `{}`",
            self.name
        );
        &self.values.as_slice()[element]
    }

    #[inline]
    pub fn set_value(&mut self, element: usize, value: T) {
        debug_assert!(
            element < self.values.len(),
            "[VariableAttribute::set_value] element {element} out of range in `{}`",
            self.name
        );
        self.values.as_mut_slice()[element] = value;
    }

    pub fn modify_value(&mut self, element: usize, modifier: impl FnOnce(&mut T)) {
        debug_assert!(element < self.values.len());
        modifier(&mut self.values.as_mut_slice()[element]);
    }

    pub fn values(&self) -> &[T] {
        self.values.as_slice()
    }

    pub fn default_value(&self) -> &T {
        &self.default_value
    }

    /// Whether [`interpolate_value`](AttributeBase::interpolate_value) does anything.
    pub fn is_interpolable(&self) -> bool {
        self.properties.interpolable && self.interpolator.is_some()
    }
}

impl<T: AttributeValue> AttributeBase for VariableAttribute<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn type_tag(&self) -> &'static str {
        T::TYPE_TAG
    }

    fn kind(&self) -> AttributeKind {
        AttributeKind::Variable
    }

    fn properties(&self) -> AttributeProperties {
        self.properties
    }

    fn set_properties(&mut self, properties: AttributeProperties) {
        self.properties = properties;
    }

    fn dense_len(&self) -> Option<usize> {
        Some(self.values.len())
    }

    fn to_record(&self) -> Result<AttributeRecord, MeshError> {
        let payload = VariablePayload {
            default_value: self.default_value.clone(),
            values: self.values.as_slice().to_vec(),
        };
        Ok(AttributeRecord {
            name: self.name.clone(),
            type_tag: T::TYPE_TAG.to_string(),
            kind: AttributeKind::Variable,
            properties: self.properties,
            payload: encode_payload(&self.name, &payload)?,
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn set_name(&mut self, name: &str, _: AttributeKey) {
        self.name = name.to_string();
    }

    fn resize(&mut self, len: usize, _: AttributeKey) {
        self.values.resize(len, self.default_value.clone());
    }

    fn reserve(&mut self, capacity: usize, _: AttributeKey) {
        self.values.reserve(capacity);
    }

    fn delete_elements(&mut self, to_delete: &[bool], _: AttributeKey) {
        self.values.compact(to_delete);
    }

    fn permute_elements(&mut self, permutation: &[usize], _: AttributeKey) {
        self.values.permute(permutation);
    }

    fn assign_value(&mut self, from: usize, to: usize, _: AttributeKey) {
        if self.properties.assignable {
            let value = self.value(from).clone();
            self.set_value(to, value);
        }
    }

    fn interpolate_value(
        &mut self,
        interpolation: &AttributeLinearInterpolation,
        to: usize,
        _: AttributeKey,
    ) {
        if !self.properties.interpolable {
            return;
        }
        if let Some(interpolate) = self.interpolator {
            let inputs: Vec<&T> = interpolation
                .indices()
                .iter()
                .map(|&i| self.value(i))
                .collect();
            let value = interpolate(&inputs, interpolation.lambdas());
            self.set_value(to, value);
        }
    }

    fn clone_boxed(&self, _: AttributeKey) -> Box<dyn AttributeBase> {
        Box::new(Self {
            name: self.name.clone(),
            default_value: self.default_value.clone(),
            values: self.values.clone(),
            properties: self.properties,
            interpolator: self.interpolator,
        })
    }
}

impl<T: AttributeValue> ReadOnlyAttribute<T> for VariableAttribute<T> {
    fn value(&self, element: usize) -> &T {
        VariableAttribute::value(self, element)
    }

    fn default_value(&self) -> &T {
        &self.default_value
    }
}

impl<T: AttributeValue> TypedAttribute for VariableAttribute<T> {
    type Value = T;
    const KIND: AttributeKind = AttributeKind::Variable;
}

// ---------------------------------------------------------------------------
// Constant
// ---------------------------------------------------------------------------

/// A single value reported for every element.
#[derive(Clone, Debug)]
pub struct ConstantAttribute<T: AttributeValue> {
    name: String,
    value: T,
    properties: AttributeProperties,
}

impl<T: AttributeValue> ConstantAttribute<T> {
    pub(crate) fn new(name: &str, value: T, properties: AttributeProperties) -> Self {
        Self {
            name: name.to_string(),
            value,
            properties,
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn set_value(&mut self, value: T) {
        self.value = value;
    }
}

impl<T: AttributeValue> AttributeBase for ConstantAttribute<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn type_tag(&self) -> &'static str {
        T::TYPE_TAG
    }

    fn kind(&self) -> AttributeKind {
        AttributeKind::Constant
    }

    fn properties(&self) -> AttributeProperties {
        self.properties
    }

    fn set_properties(&mut self, properties: AttributeProperties) {
        self.properties = properties;
    }

    fn dense_len(&self) -> Option<usize> {
        None
    }

    fn to_record(&self) -> Result<AttributeRecord, MeshError> {
        Ok(AttributeRecord {
            name: self.name.clone(),
            type_tag: T::TYPE_TAG.to_string(),
            kind: AttributeKind::Constant,
            properties: self.properties,
            payload: encode_payload(&self.name, &self.value)?,
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn set_name(&mut self, name: &str, _: AttributeKey) {
        self.name = name.to_string();
    }

    fn resize(&mut self, _: usize, _: AttributeKey) {}

    fn reserve(&mut self, _: usize, _: AttributeKey) {}

    fn delete_elements(&mut self, _: &[bool], _: AttributeKey) {}

    fn permute_elements(&mut self, _: &[usize], _: AttributeKey) {}

    fn assign_value(&mut self, _: usize, _: usize, _: AttributeKey) {}

    fn interpolate_value(&mut self, _: &AttributeLinearInterpolation, _: usize, _: AttributeKey) {}

    fn clone_boxed(&self, _: AttributeKey) -> Box<dyn AttributeBase> {
        Box::new(self.clone())
    }
}

impl<T: AttributeValue> ReadOnlyAttribute<T> for ConstantAttribute<T> {
    fn value(&self, _: usize) -> &T {
        &self.value
    }

    fn default_value(&self) -> &T {
        &self.value
    }
}

impl<T: AttributeValue> TypedAttribute for ConstantAttribute<T> {
    type Value = T;
    const KIND: AttributeKind = AttributeKind::Constant;
}

// ---------------------------------------------------------------------------
// Sparse
// ---------------------------------------------------------------------------

/// Default value plus explicit per-element overrides.
#[derive(Clone, Debug)]
pub struct SparseAttribute<T: AttributeValue> {
    name: String,
    default_value: T,
    values: HashMap<usize, T>,
    len: usize,
    properties: AttributeProperties,
}

#[derive(Serialize, Deserialize)]
pub(crate) struct SparsePayload<T> {
    pub(crate) default_value: T,
    pub(crate) values: Vec<(usize, T)>,
}

impl<T: AttributeValue> SparseAttribute<T> {
    pub(crate) fn new(
        name: &str,
        default_value: T,
        properties: AttributeProperties,
        len: usize,
    ) -> Self {
        Self {
            name: name.to_string(),
            default_value,
            values: HashMap::new(),
            len,
            properties,
        }
    }

    pub(crate) fn from_payload(
        name: &str,
        properties: AttributeProperties,
        payload: SparsePayload<T>,
        len: usize,
    ) -> Result<Self, MeshError> {
        if let Some((element, _)) = payload.values.iter().find(|(e, _)| *e >= len) {
            return Err(MeshError::AttributeSerialization {
                name: name.to_string(),
                reason: format!("override for element {element} beyond {len} elements"),
            });
        }
        Ok(Self {
            name: name.to_string(),
            default_value: payload.default_value,
            values: payload.values.into_iter().collect(),
            len,
            properties,
        })
    }

    pub fn value(&self, element: usize) -> &T {
        debug_assert!(element < self.len);
        self.values.get(&element).unwrap_or(&self.default_value)
    }

    pub fn set_value(&mut self, element: usize, value: T) {
        debug_assert!(
            element < self.len,
            "[SparseAttribute::set_value] element {element} out of range in `{}`",
            self.name
        );
        self.values.insert(element, value);
    }

    /// Drop the override of `element`, falling back to the default value.
    pub fn reset_value(&mut self, element: usize) {
        self.values.remove(&element);
    }

    /// Number of explicitly stored values.
    pub fn nb_overrides(&self) -> usize {
        self.values.len()
    }

    fn remap(&mut self, old2new: &[usize]) {
        self.values = self
            .values
            .drain()
            .filter_map(|(old, value)| {
                let new = old2new[old];
                (new != index::NO_ID).then_some((new, value))
            })
            .collect();
    }
}

impl<T: AttributeValue> AttributeBase for SparseAttribute<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn type_tag(&self) -> &'static str {
        T::TYPE_TAG
    }

    fn kind(&self) -> AttributeKind {
        AttributeKind::Sparse
    }

    fn properties(&self) -> AttributeProperties {
        self.properties
    }

    fn set_properties(&mut self, properties: AttributeProperties) {
        self.properties = properties;
    }

    fn dense_len(&self) -> Option<usize> {
        None
    }

    fn to_record(&self) -> Result<AttributeRecord, MeshError> {
        let mut values: Vec<(usize, T)> =
            self.values.iter().map(|(&e, v)| (e, v.clone())).collect();
        values.sort_unstable_by_key(|(e, _)| *e);
        let payload = SparsePayload {
            default_value: self.default_value.clone(),
            values,
        };
        Ok(AttributeRecord {
            name: self.name.clone(),
            type_tag: T::TYPE_TAG.to_string(),
            kind: AttributeKind::Sparse,
            properties: self.properties,
            payload: encode_payload(&self.name, &payload)?,
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn set_name(&mut self, name: &str, _: AttributeKey) {
        self.name = name.to_string();
    }

    fn resize(&mut self, len: usize, _: AttributeKey) {
        if len < self.len {
            self.values.retain(|&e, _| e < len);
        }
        self.len = len;
    }

    fn reserve(&mut self, _: usize, _: AttributeKey) {}

    fn delete_elements(&mut self, to_delete: &[bool], _: AttributeKey) {
        let old2new = index::mapping_after_deletion(to_delete);
        self.remap(&old2new);
        self.len -= to_delete.iter().filter(|&&d| d).count();
    }

    fn permute_elements(&mut self, permutation: &[usize], _: AttributeKey) {
        let old2new = index::old2new_permutation(permutation);
        self.remap(&old2new);
    }

    fn assign_value(&mut self, from: usize, to: usize, _: AttributeKey) {
        if !self.properties.assignable {
            return;
        }
        match self.values.get(&from).cloned() {
            Some(value) => {
                self.values.insert(to, value);
            }
            None => {
                self.values.remove(&to);
            }
        }
    }

    fn interpolate_value(&mut self, _: &AttributeLinearInterpolation, _: usize, _: AttributeKey) {}

    fn clone_boxed(&self, _: AttributeKey) -> Box<dyn AttributeBase> {
        Box::new(self.clone())
    }
}

impl<T: AttributeValue> ReadOnlyAttribute<T> for SparseAttribute<T> {
    fn value(&self, element: usize) -> &T {
        SparseAttribute::value(self, element)
    }

    fn default_value(&self) -> &T {
        &self.default_value
    }
}

impl<T: AttributeValue> TypedAttribute for SparseAttribute<T> {
    type Value = T;
    const KIND: AttributeKind = AttributeKind::Sparse;
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: AttributeKey = AttributeKey::new();

    #[test]
    fn variable_follows_deletion_and_permutation() {
        let mut attr = VariableAttribute::new("id", 0u32, AttributeProperties::default(), 4);
        for i in 0..4 {
            attr.set_value(i, i as u32 * 10);
        }
        attr.delete_elements(&[false, true, false, false], KEY);
        assert_eq!(attr.values(), &[0, 20, 30]);
        attr.permute_elements(&[2, 1, 0], KEY);
        assert_eq!(attr.values(), &[30, 20, 0]);
        attr.resize(5, KEY);
        assert_eq!(attr.values(), &[30, 20, 0, 0, 0]);
    }

    #[test]
    fn interpolation_only_when_enabled() {
        let props = AttributeProperties::new(false, true);
        let mut attr = VariableAttribute::new("t", 0.0f64, props, 3)
            .with_interpolator(<f64 as Interpolable>::interpolate);
        attr.set_value(0, 1.0);
        attr.set_value(1, 3.0);
        let interp = AttributeLinearInterpolation::new(vec![0, 1], vec![0.5, 0.5]).unwrap();
        attr.interpolate_value(&interp, 2, KEY);
        assert_eq!(*attr.value(2), 2.0);

        let mut plain = VariableAttribute::new("p", 7.0f64, AttributeProperties::default(), 2);
        plain.interpolate_value(&interp, 1, KEY);
        assert_eq!(*plain.value(1), 7.0);
    }

    #[test]
    fn sparse_remaps_overrides() {
        let mut attr = SparseAttribute::new("s", -1i32, AttributeProperties::default(), 4);
        attr.set_value(1, 5);
        attr.set_value(3, 9);
        attr.delete_elements(&[true, false, false, false], KEY);
        assert_eq!(*attr.value(0), 5);
        assert_eq!(*attr.value(2), 9);
        assert_eq!(*attr.value(1), -1);
        attr.permute_elements(&[2, 1, 0], KEY);
        assert_eq!(*attr.value(0), 9);
        assert_eq!(*attr.value(2), 5);
    }

    #[test]
    fn constant_ignores_structure() {
        let mut attr = ConstantAttribute::new("c", 4u8, AttributeProperties::default());
        attr.resize(100, KEY);
        assert_eq!(ReadOnlyAttribute::value(&attr, 42), &4);
    }

    #[test]
    fn mismatched_interpolation_is_rejected() {
        assert!(matches!(
            AttributeLinearInterpolation::new(vec![0, 1], vec![1.0]),
            Err(MeshError::InvalidInterpolation { indices: 2, lambdas: 1 })
        ));
    }
}
