//! Typed-column registry for attribute persistence.
//!
//! A persisted column is an [`AttributeRecord`]: its name, its value type tag,
//! its storage kind and a self-describing payload. Reading a record back
//! requires knowing the concrete Rust type behind the tag; the
//! [`AttributeRegistry`] maps tags to loader functions. The registry is a plain
//! value built once by the caller (typically at program or test setup) and
//! passed to whoever loads stores.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::data::attribute::{
    AttributeBase, AttributeKind, AttributeProperties, AttributeValue, ConstantAttribute,
    Interpolable, SparseAttribute, VariableAttribute, decode_payload,
};
use crate::mesh_error::MeshError;

/// One persisted attribute column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttributeRecord {
    pub name: String,
    pub type_tag: String,
    pub kind: AttributeKind,
    pub properties: AttributeProperties,
    pub payload: serde_json::Value,
}

/// A persisted attribute store: element count plus every column.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreRecord {
    pub nb_elements: usize,
    pub attributes: Vec<AttributeRecord>,
}

type Loader = fn(AttributeRecord, usize) -> Result<Box<dyn AttributeBase>, MeshError>;

/// Maps value type tags to column loaders.
#[derive(Clone, Default)]
pub struct AttributeRegistry {
    loaders: HashMap<&'static str, Loader>,
}

impl std::fmt::Debug for AttributeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut tags: Vec<_> = self.loaders.keys().collect();
        tags.sort_unstable();
        f.debug_struct("AttributeRegistry")
            .field("type_tags", &tags)
            .finish()
    }
}

impl AttributeRegistry {
    /// Empty registry: every load fails until types are registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry knowing every value type geomesh itself implements
    /// [`AttributeValue`] for. Interpolable types come back interpolable.
    pub fn with_builtin_types() -> Self {
        let mut registry = Self::new();
        registry
            .register::<bool>()
            .register::<u8>()
            .register::<u32>()
            .register::<u64>()
            .register::<i32>()
            .register::<i64>()
            .register_interpolable::<f32>()
            .register_interpolable::<f64>()
            .register::<usize>()
            .register::<String>()
            .register::<Option<usize>>()
            .register::<[usize; 2]>()
            .register::<[usize; 3]>()
            .register_interpolable::<[f64; 2]>()
            .register_interpolable::<[f64; 3]>()
            .register::<Vec<usize>>()
            .register::<Vec<f64>>()
            .register_interpolable::<crate::mesh::point::Point<1>>()
            .register_interpolable::<crate::mesh::point::Point<2>>()
            .register_interpolable::<crate::mesh::point::Point<3>>();
        registry
    }

    /// Register `T` under its type tag. Re-registering replaces the loader.
    pub fn register<T: AttributeValue>(&mut self) -> &mut Self {
        self.loaders.insert(T::TYPE_TAG, load_attribute::<T>);
        self
    }

    /// Register `T` so that loaded variable columns keep their interpolator.
    pub fn register_interpolable<T: Interpolable>(&mut self) -> &mut Self {
        self.loaders.insert(T::TYPE_TAG, load_interpolable_attribute::<T>);
        self
    }

    pub fn is_registered(&self, type_tag: &str) -> bool {
        self.loaders.contains_key(type_tag)
    }

    /// Rebuild a column for a store holding `nb_elements` elements.
    ///
    /// # Errors
    /// `UnknownAttributeType` if no loader matches the record's tag, or
    /// `AttributeSerialization` if the payload does not decode.
    pub fn load(
        &self,
        record: AttributeRecord,
        nb_elements: usize,
    ) -> Result<Box<dyn AttributeBase>, MeshError> {
        let loader = self
            .loaders
            .get(record.type_tag.as_str())
            .ok_or_else(|| MeshError::UnknownAttributeType(record.type_tag.clone()))?;
        loader(record, nb_elements)
    }
}

fn load_attribute<T: AttributeValue>(
    record: AttributeRecord,
    nb_elements: usize,
) -> Result<Box<dyn AttributeBase>, MeshError> {
    let AttributeRecord {
        name,
        kind,
        properties,
        payload,
        ..
    } = record;
    Ok(match kind {
        AttributeKind::Variable => Box::new(VariableAttribute::<T>::from_payload(
            &name,
            properties,
            decode_payload(&name, payload)?,
            nb_elements,
        )?),
        AttributeKind::Constant => Box::new(ConstantAttribute::<T>::new(
            &name,
            decode_payload(&name, payload)?,
            properties,
        )),
        AttributeKind::Sparse => Box::new(SparseAttribute::<T>::from_payload(
            &name,
            properties,
            decode_payload(&name, payload)?,
            nb_elements,
        )?),
    })
}

fn load_interpolable_attribute<T: Interpolable>(
    record: AttributeRecord,
    nb_elements: usize,
) -> Result<Box<dyn AttributeBase>, MeshError> {
    if record.kind != AttributeKind::Variable {
        return load_attribute::<T>(record, nb_elements);
    }
    let AttributeRecord {
        name,
        properties,
        payload,
        ..
    } = record;
    let attribute = VariableAttribute::<T>::from_payload(
        &name,
        properties,
        decode_payload(&name, payload)?,
        nb_elements,
    )?
    .with_interpolator(T::interpolate);
    Ok(Box::new(attribute))
}
