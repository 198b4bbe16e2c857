//! Fixed-dimension coordinates and the coordinate-provider interface.

use std::ops::{Add, Div, Index, Mul, Sub};

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::data::attribute::{AttributeValue, Interpolable};

/// A point in `D` dimensions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point<const D: usize>(pub [f64; D]);

pub type Point2D = Point<2>;
pub type Point3D = Point<3>;

impl<const D: usize> Point<D> {
    pub const fn new(coords: [f64; D]) -> Self {
        Self(coords)
    }

    pub fn origin() -> Self {
        Self([0.0; D])
    }

    pub fn coords(&self) -> &[f64; D] {
        &self.0
    }

    pub fn squared_distance(&self, other: &Self) -> f64 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum()
    }

    pub fn distance(&self, other: &Self) -> f64 {
        self.squared_distance(other).sqrt()
    }

    /// Component-wise minimum.
    pub fn min(&self, other: &Self) -> Self {
        Self(std::array::from_fn(|i| self.0[i].min(other.0[i])))
    }

    /// Component-wise maximum.
    pub fn max(&self, other: &Self) -> Self {
        Self(std::array::from_fn(|i| self.0[i].max(other.0[i])))
    }

    /// Average of `points`; the origin when there are none.
    pub fn barycenter<'p>(points: impl IntoIterator<Item = &'p Point<D>>) -> Self {
        let (sum, count) = points
            .into_iter()
            .fold((Self::origin(), 0usize), |(sum, count), p| (sum + *p, count + 1));
        if count == 0 { sum } else { sum / count as f64 }
    }
}

impl<const D: usize> Default for Point<D> {
    fn default() -> Self {
        Self::origin()
    }
}

impl<const D: usize> From<[f64; D]> for Point<D> {
    fn from(coords: [f64; D]) -> Self {
        Self(coords)
    }
}

impl<const D: usize> Index<usize> for Point<D> {
    type Output = f64;

    fn index(&self, axis: usize) -> &f64 {
        &self.0[axis]
    }
}

impl<const D: usize> Add for Point<D> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(std::array::from_fn(|i| self.0[i] + rhs.0[i]))
    }
}

impl<const D: usize> Sub for Point<D> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(std::array::from_fn(|i| self.0[i] - rhs.0[i]))
    }
}

impl<const D: usize> Mul<f64> for Point<D> {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self(self.0.map(|c| c * rhs))
    }
}

impl<const D: usize> Div<f64> for Point<D> {
    type Output = Self;

    fn div(self, rhs: f64) -> Self {
        Self(self.0.map(|c| c / rhs))
    }
}

// serde only derives arrays up to fixed lengths; go through a sequence.
impl<const D: usize> Serialize for Point<D> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

impl<'de, const D: usize> Deserialize<'de> for Point<D> {
    fn deserialize<De: Deserializer<'de>>(deserializer: De) -> Result<Self, De::Error> {
        let coords = Vec::<f64>::deserialize(deserializer)?;
        let found = coords.len();
        <[f64; D]>::try_from(coords)
            .map(Self)
            .map_err(|_| de::Error::invalid_length(found, &format!("{D} coordinates").as_str()))
    }
}

// One tag per dimension; higher dimensions have no persisted form.
impl AttributeValue for Point<1> {
    const TYPE_TAG: &'static str = "point1d";
}

impl AttributeValue for Point<2> {
    const TYPE_TAG: &'static str = "point2d";
}

impl AttributeValue for Point<3> {
    const TYPE_TAG: &'static str = "point3d";
}

impl<const D: usize> Interpolable for Point<D>
where
    Point<D>: AttributeValue,
{
    fn interpolate(values: &[&Self], lambdas: &[f64]) -> Self {
        values
            .iter()
            .zip(lambdas)
            .fold(Self::origin(), |acc, (p, &l)| acc + **p * l)
    }
}

/// Anything that maps vertex indices to coordinates.
pub trait CoordinateProvider<const D: usize> {
    fn nb_points(&self) -> usize;

    fn point(&self, vertex: usize) -> &Point<D>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_checks_dimension() {
        let p = Point::new([1.0, 2.5, -3.0]);
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, "[1.0,2.5,-3.0]");
        assert_eq!(serde_json::from_str::<Point3D>(&json).unwrap(), p);
        assert!(serde_json::from_str::<Point2D>(&json).is_err());
    }

    #[test]
    fn barycenter_and_interpolation() {
        let a = Point::new([0.0, 0.0]);
        let b = Point::new([2.0, 4.0]);
        assert_eq!(Point::barycenter([&a, &b]), Point::new([1.0, 2.0]));
        assert_eq!(Point::interpolate(&[&a, &b], &[0.25, 0.75]), Point::new([1.5, 3.0]));
        assert_eq!(<Point2D as AttributeValue>::TYPE_TAG, "point2d");
    }

    #[test]
    fn type_tags_differ_per_dimension() {
        let tags = [
            <Point<1> as AttributeValue>::TYPE_TAG,
            <Point2D as AttributeValue>::TYPE_TAG,
            <Point3D as AttributeValue>::TYPE_TAG,
        ];
        assert_eq!(tags, ["point1d", "point2d", "point3d"]);
        let registry = crate::data::registry::AttributeRegistry::with_builtin_types();
        assert!(registry.is_registered("point2d") && registry.is_registered("point3d"));
        assert!(!registry.is_registered("point"));
    }
}
