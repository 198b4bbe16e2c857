//! AttributeStore: every attribute column of one entity kind.
//!
//! The store owns the element count and keeps every registered column in
//! step with it. Structural operations (`create_elements`, `resize`,
//! `delete_elements`, `permute_elements`, `copy_from`) walk all columns before
//! returning, so a reader never sees columns of different lengths.
//!
//! # Invariants
//!
//! - Every dense column holds exactly `nb_elements` values.
//! - Column names are unique; each column's own name matches its key.

use std::collections::HashMap;

use crate::data::attribute::{
    AttributeBase, AttributeKey, AttributeLinearInterpolation, AttributeProperties,
    AttributeValue, ConstantAttribute, Interpolable, ReadOnlyAttribute, SparseAttribute,
    TypedAttribute, VariableAttribute,
};
use crate::data::registry::{AttributeRegistry, StoreRecord};
use crate::debug_invariants::{DebugInvariants, ensure};
use crate::mesh_error::MeshError;
use crate::topology::index;

/// Named attribute columns sharing one element count.
#[derive(Debug, Default)]
pub struct AttributeStore {
    nb_elements: usize,
    attributes: HashMap<String, Box<dyn AttributeBase>>,
}

impl Clone for AttributeStore {
    fn clone(&self) -> Self {
        let key = AttributeKey::new();
        Self {
            nb_elements: self.nb_elements,
            attributes: self
                .attributes
                .iter()
                .map(|(name, attr)| (name.clone(), attr.clone_boxed(key)))
                .collect(),
        }
    }
}

fn type_mismatch<A: TypedAttribute>(name: &str, found: &dyn AttributeBase) -> MeshError {
    MeshError::AttributeTypeMismatch {
        name: name.to_string(),
        expected: format!("{:?}<{}>", A::KIND, <A::Value as AttributeValue>::TYPE_TAG),
        found: format!("{:?}<{}>", found.kind(), found.type_tag()),
    }
}

impl AttributeStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn nb_elements(&self) -> usize {
        self.nb_elements
    }

    pub fn nb_attributes(&self) -> usize {
        self.attributes.len()
    }

    /// Names of all columns, sorted for deterministic output.
    pub fn attribute_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.attributes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn attribute_exists(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Value type tag of the column `name`.
    pub fn attribute_type(&self, name: &str) -> Option<&'static str> {
        self.attributes.get(name).map(|a| a.type_tag())
    }

    /// Type-erased access, for code that does not know the value type.
    pub fn find_generic_attribute(&self, name: &str) -> Option<&dyn AttributeBase> {
        self.attributes.get(name).map(|a| a.as_ref())
    }

    /// Read access to a column of value type `T`, whatever its storage kind.
    ///
    /// # Errors
    /// `AttributeNotFound` if absent, `AttributeTypeMismatch` if the column
    /// stores another type.
    pub fn find_attribute<T: AttributeValue>(
        &self,
        name: &str,
    ) -> Result<&dyn ReadOnlyAttribute<T>, MeshError> {
        let attr = self
            .attributes
            .get(name)
            .ok_or_else(|| MeshError::AttributeNotFound(name.to_string()))?;
        let any = attr.as_any();
        if let Some(a) = any.downcast_ref::<VariableAttribute<T>>() {
            return Ok(a);
        }
        if let Some(a) = any.downcast_ref::<ConstantAttribute<T>>() {
            return Ok(a);
        }
        if let Some(a) = any.downcast_ref::<SparseAttribute<T>>() {
            return Ok(a);
        }
        Err(MeshError::AttributeTypeMismatch {
            name: name.to_string(),
            expected: T::TYPE_TAG.to_string(),
            found: attr.type_tag().to_string(),
        })
    }

    /// Typed access to a column of known storage kind.
    pub fn find_typed<A: TypedAttribute>(&self, name: &str) -> Result<&A, MeshError> {
        let attr = self
            .attributes
            .get(name)
            .ok_or_else(|| MeshError::AttributeNotFound(name.to_string()))?;
        attr.as_any()
            .downcast_ref::<A>()
            .ok_or_else(|| type_mismatch::<A>(name, attr.as_ref()))
    }

    /// Mutable typed access, for editing values.
    pub fn find_typed_mut<A: TypedAttribute>(&mut self, name: &str) -> Result<&mut A, MeshError> {
        if !self.check_kind::<A>(name)? {
            return Err(MeshError::AttributeNotFound(name.to_string()));
        }
        self.attributes
            .get_mut(name)
            .and_then(|a| a.as_any_mut().downcast_mut::<A>())
            .ok_or_else(|| MeshError::AttributeNotFound(name.to_string()))
    }

    pub fn variable<T: AttributeValue>(&self, name: &str) -> Result<&VariableAttribute<T>, MeshError> {
        self.find_typed(name)
    }

    pub fn variable_mut<T: AttributeValue>(
        &mut self,
        name: &str,
    ) -> Result<&mut VariableAttribute<T>, MeshError> {
        self.find_typed_mut(name)
    }

    /// `Ok(true)` if `name` exists with type `A`, `Ok(false)` if absent.
    fn check_kind<A: TypedAttribute>(&self, name: &str) -> Result<bool, MeshError> {
        match self.attributes.get(name) {
            Some(attr) if attr.as_any().is::<A>() => Ok(true),
            Some(attr) => Err(type_mismatch::<A>(name, attr.as_ref())),
            None => Ok(false),
        }
    }

    fn find_or_create_with<A: TypedAttribute>(
        &mut self,
        name: &str,
        create: impl FnOnce(usize) -> A,
    ) -> Result<&mut A, MeshError> {
        if !self.check_kind::<A>(name)? {
            log::trace!("creating attribute `{name}` over {} elements", self.nb_elements);
            self.attributes
                .insert(name.to_string(), Box::new(create(self.nb_elements)));
        }
        self.find_typed_mut(name)
    }

    /// Find the dense column `name`, creating it filled with `default_value`.
    ///
    /// # Errors
    /// `AttributeTypeMismatch` if `name` already exists with another type or kind.
    pub fn find_or_create_variable<T: AttributeValue>(
        &mut self,
        name: &str,
        default_value: T,
    ) -> Result<&mut VariableAttribute<T>, MeshError> {
        self.find_or_create_variable_with(name, default_value, AttributeProperties::default())
    }

    pub fn find_or_create_variable_with<T: AttributeValue>(
        &mut self,
        name: &str,
        default_value: T,
        properties: AttributeProperties,
    ) -> Result<&mut VariableAttribute<T>, MeshError> {
        self.find_or_create_with(name, |len| {
            VariableAttribute::new(name, default_value, properties, len)
        })
    }

    /// Dense column that is filled by [`interpolate_attribute_value`](Self::interpolate_attribute_value).
    pub fn find_or_create_interpolable_variable<T: Interpolable>(
        &mut self,
        name: &str,
        default_value: T,
    ) -> Result<&mut VariableAttribute<T>, MeshError> {
        let properties = AttributeProperties::new(true, true);
        self.find_or_create_with(name, |len| {
            VariableAttribute::new(name, default_value, properties, len)
                .with_interpolator(T::interpolate)
        })
    }

    pub fn find_or_create_constant<T: AttributeValue>(
        &mut self,
        name: &str,
        value: T,
    ) -> Result<&mut ConstantAttribute<T>, MeshError> {
        self.find_or_create_with(name, |_| {
            ConstantAttribute::new(name, value, AttributeProperties::default())
        })
    }

    pub fn find_or_create_sparse<T: AttributeValue>(
        &mut self,
        name: &str,
        default_value: T,
    ) -> Result<&mut SparseAttribute<T>, MeshError> {
        self.find_or_create_with(name, |len| {
            SparseAttribute::new(name, default_value, AttributeProperties::default(), len)
        })
    }

    pub fn set_attribute_properties(
        &mut self,
        name: &str,
        properties: AttributeProperties,
    ) -> Result<(), MeshError> {
        self.attributes
            .get_mut(name)
            .ok_or_else(|| MeshError::AttributeNotFound(name.to_string()))?
            .set_properties(properties);
        Ok(())
    }

    /// Remove the column `name`. Returns whether it existed.
    pub fn delete_attribute(&mut self, name: &str) -> bool {
        self.attributes.remove(name).is_some()
    }

    /// # Errors
    /// `AttributeNotFound` if `old_name` is absent, `DuplicateAttribute` if
    /// `new_name` is taken.
    pub fn rename_attribute(&mut self, old_name: &str, new_name: &str) -> Result<(), MeshError> {
        if old_name == new_name {
            return Ok(());
        }
        if self.attributes.contains_key(new_name) {
            return Err(MeshError::DuplicateAttribute(new_name.to_string()));
        }
        let mut attr = self
            .attributes
            .remove(old_name)
            .ok_or_else(|| MeshError::AttributeNotFound(old_name.to_string()))?;
        attr.set_name(new_name, AttributeKey::new());
        self.attributes.insert(new_name.to_string(), attr);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Structural operations
    // -----------------------------------------------------------------------

    /// Append `count` elements holding each column's default value.
    /// Returns the index of the first new element.
    pub fn create_elements(&mut self, count: usize, key: AttributeKey) -> usize {
        let first = self.nb_elements;
        self.resize(first + count, key);
        first
    }

    pub fn resize(&mut self, len: usize, key: AttributeKey) {
        for attr in self.attributes.values_mut() {
            attr.resize(len, key);
        }
        self.nb_elements = len;
        self.debug_assert_invariants();
    }

    pub fn reserve(&mut self, capacity: usize, key: AttributeKey) {
        for attr in self.attributes.values_mut() {
            attr.reserve(capacity, key);
        }
    }

    /// Remove flagged elements from every column.
    ///
    /// # Errors
    /// `MaskLengthMismatch` if `to_delete.len() != nb_elements`; nothing is
    /// modified in that case.
    pub fn delete_elements(
        &mut self,
        to_delete: &[bool],
        key: AttributeKey,
    ) -> Result<Vec<usize>, MeshError> {
        index::check_mask(to_delete, self.nb_elements)?;
        let old2new = index::mapping_after_deletion(to_delete);
        let removed = to_delete.iter().filter(|&&d| d).count();
        if removed == 0 {
            return Ok(old2new);
        }
        for attr in self.attributes.values_mut() {
            attr.delete_elements(to_delete, key);
        }
        self.nb_elements -= removed;
        self.debug_assert_invariants();
        Ok(old2new)
    }

    /// Reorder every column; `permutation[new] = old`.
    ///
    /// # Errors
    /// `InvalidPermutation` if `permutation` is not a bijection on
    /// `[0, nb_elements)`; nothing is modified in that case.
    pub fn permute_elements(
        &mut self,
        permutation: &[usize],
        key: AttributeKey,
    ) -> Result<Vec<usize>, MeshError> {
        index::check_permutation(permutation, self.nb_elements)?;
        for attr in self.attributes.values_mut() {
            attr.permute_elements(permutation, key);
        }
        Ok(index::old2new_permutation(permutation))
    }

    /// Take the element count and a copy of every column of `other`.
    ///
    /// # Errors
    /// `NonEmptyTarget` if this store already holds elements.
    pub fn copy_from(&mut self, other: &AttributeStore, key: AttributeKey) -> Result<(), MeshError> {
        if self.nb_elements != 0 {
            return Err(MeshError::NonEmptyTarget {
                kind: "attribute store",
                len: self.nb_elements,
            });
        }
        self.nb_elements = other.nb_elements;
        for attr in self.attributes.values_mut() {
            attr.resize(other.nb_elements, key);
        }
        for (name, attr) in &other.attributes {
            self.attributes.insert(name.clone(), attr.clone_boxed(key));
        }
        self.debug_assert_invariants();
        Ok(())
    }

    /// Copy the value of `from` into `to` in every assignable column.
    pub fn assign_attribute_value(&mut self, from: usize, to: usize, key: AttributeKey) {
        debug_assert!(from < self.nb_elements && to < self.nb_elements);
        for attr in self.attributes.values_mut() {
            attr.assign_value(from, to, key);
        }
    }

    /// Fill `to` in every interpolable column.
    pub fn interpolate_attribute_value(
        &mut self,
        interpolation: &AttributeLinearInterpolation,
        to: usize,
        key: AttributeKey,
    ) {
        debug_assert!(to < self.nb_elements);
        for attr in self.attributes.values_mut() {
            attr.interpolate_value(interpolation, to, key);
        }
    }

    // -----------------------------------------------------------------------
    // Persistence hook
    // -----------------------------------------------------------------------

    /// Encode every column, sorted by name.
    pub fn to_record(&self) -> Result<StoreRecord, MeshError> {
        let attributes = self
            .attribute_names()
            .into_iter()
            .filter_map(|name| self.attributes.get(name))
            .map(|attr| attr.to_record())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(StoreRecord {
            nb_elements: self.nb_elements,
            attributes,
        })
    }

    /// Rebuild a store from a record, resolving value types through `registry`.
    ///
    /// # Errors
    /// `UnknownAttributeType` for a tag the registry does not know, or any
    /// payload decoding error.
    pub fn from_record(record: StoreRecord, registry: &AttributeRegistry) -> Result<Self, MeshError> {
        let mut attributes = HashMap::with_capacity(record.attributes.len());
        for attr in record.attributes {
            let name = attr.name.clone();
            if attributes.contains_key(&name) {
                return Err(MeshError::DuplicateAttribute(name));
            }
            attributes.insert(name, registry.load(attr, record.nb_elements)?);
        }
        let store = Self {
            nb_elements: record.nb_elements,
            attributes,
        };
        store.validate_invariants()?;
        Ok(store)
    }
}

impl DebugInvariants for AttributeStore {
    fn validate_invariants(&self) -> Result<(), MeshError> {
        for (name, attr) in &self.attributes {
            ensure(attr.name() == name, || {
                format!("column `{}` registered as `{name}`", attr.name())
            })?;
            if let Some(len) = attr.dense_len() {
                ensure(len == self.nb_elements, || {
                    format!(
                        "column `{name}` holds {len} values for {} elements",
                        self.nb_elements
                    )
                })?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: AttributeKey = AttributeKey::new();

    fn store_with(n: usize) -> AttributeStore {
        let mut store = AttributeStore::new();
        store.create_elements(n, KEY);
        let ids = store.find_or_create_variable("id", 0usize).unwrap();
        for i in 0..n {
            ids.set_value(i, i);
        }
        store
    }

    #[test]
    fn new_slots_hold_defaults() {
        let mut store = store_with(2);
        store.find_or_create_variable("flag", true).unwrap();
        store.find_or_create_sparse("tag", 7i32).unwrap();
        let first = store.create_elements(3, KEY);
        assert_eq!(first, 2);
        assert_eq!(store.nb_elements(), 5);
        let flags = store.find_attribute::<bool>("flag").unwrap();
        assert!((0..5).all(|i| *flags.value(i)));
        assert_eq!(*store.find_attribute::<usize>("id").unwrap().value(4), 0);
        assert_eq!(*store.find_attribute::<i32>("tag").unwrap().value(4), 7);
    }

    #[test]
    fn all_false_mask_returns_identity() {
        let mut store = store_with(4);
        let old2new = store.delete_elements(&[false; 4], KEY).unwrap();
        assert_eq!(old2new, vec![0, 1, 2, 3]);
        assert_eq!(store.nb_elements(), 4);
    }

    #[test]
    fn bad_mask_and_permutation_leave_store_untouched() {
        let mut store = store_with(3);
        assert!(store.delete_elements(&[true], KEY).is_err());
        assert!(store.permute_elements(&[0, 0, 1], KEY).is_err());
        assert_eq!(store.nb_elements(), 3);
        assert_eq!(store.variable::<usize>("id").unwrap().values(), &[0, 1, 2]);
    }

    #[test]
    fn type_conflicts_are_reported() {
        let mut store = store_with(1);
        assert!(matches!(
            store.find_or_create_variable("id", 0.0f64),
            Err(MeshError::AttributeTypeMismatch { .. })
        ));
        assert!(matches!(
            store.find_or_create_sparse("id", 0usize),
            Err(MeshError::AttributeTypeMismatch { .. })
        ));
        assert!(matches!(
            store.find_attribute::<f32>("missing"),
            Err(MeshError::AttributeNotFound(_))
        ));
    }

    #[test]
    fn copy_requires_empty_target() {
        let source = store_with(3);
        let mut target = AttributeStore::new();
        target.copy_from(&source, KEY).unwrap();
        assert_eq!(target.variable::<usize>("id").unwrap().values(), &[0, 1, 2]);
        assert!(matches!(
            target.copy_from(&source, KEY),
            Err(MeshError::NonEmptyTarget { len: 3, .. })
        ));
    }

    #[test]
    fn assign_and_interpolate() {
        let mut store = store_with(3);
        store.set_attribute_properties("id", AttributeProperties::new(true, false)).unwrap();
        let height = store.find_or_create_interpolable_variable("height", 0.0f64).unwrap();
        height.set_value(0, 2.0);
        height.set_value(1, 4.0);
        store.assign_attribute_value(0, 2, KEY);
        assert_eq!(*store.variable::<usize>("id").unwrap().value(2), 0);
        let interp = AttributeLinearInterpolation::new(vec![0, 1], vec![0.25, 0.75]).unwrap();
        store.interpolate_attribute_value(&interp, 2, KEY);
        assert_eq!(*store.variable::<f64>("height").unwrap().value(2), 3.5);
    }

    #[test]
    fn rename_keeps_values() {
        let mut store = store_with(2);
        store.rename_attribute("id", "ident").unwrap();
        assert!(!store.attribute_exists("id"));
        assert_eq!(store.variable::<usize>("ident").unwrap().values(), &[0, 1]);
        store.validate_invariants().unwrap();
    }

    #[test]
    fn record_round_trip_through_registry() {
        let mut store = store_with(3);
        store.find_or_create_constant("unit", "m".to_string()).unwrap();
        store.find_or_create_sparse("bc", 0u8).unwrap().set_value(1, 4);
        let record = store.to_record().unwrap();
        let json = serde_json::to_string(&record).unwrap();
        let decoded: StoreRecord = serde_json::from_str(&json).unwrap();

        let registry = AttributeRegistry::with_builtin_types();
        let restored = AttributeStore::from_record(decoded, &registry).unwrap();
        assert_eq!(restored.nb_elements(), 3);
        assert_eq!(restored.variable::<usize>("id").unwrap().values(), &[0, 1, 2]);
        assert_eq!(*restored.find_attribute::<u8>("bc").unwrap().value(1), 4);
        assert_eq!(restored.find_attribute::<String>("unit").unwrap().value(2), "m");

        let empty = AttributeRegistry::new();
        assert!(matches!(
            AttributeStore::from_record(store.to_record().unwrap(), &empty),
            Err(MeshError::UnknownAttributeType(_))
        ));
    }
}
