//! Axis-aligned bounding boxes and the spatial-index hook.
//!
//! geomesh does not ship a spatial index. It computes one box per element and
//! hands them, in element order, to a caller-supplied
//! [`SpatialIndexBuilder`]. Box accumulation runs on rayon when the `rayon`
//! feature is enabled.

#[cfg(feature = "rayon")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::mesh::mesh_elements::MeshElements;
use crate::mesh::point::{CoordinateProvider, Point};

/// Axis-aligned box; `min > max` on some axis means empty.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox<const D: usize> {
    pub min: Point<D>,
    pub max: Point<D>,
}

impl<const D: usize> Default for BoundingBox<D> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<const D: usize> BoundingBox<D> {
    pub fn new(min: Point<D>, max: Point<D>) -> Self {
        Self { min, max }
    }

    /// The box containing nothing; neutral element of [`union`](Self::union).
    pub fn empty() -> Self {
        Self {
            min: Point::new([f64::INFINITY; D]),
            max: Point::new([f64::NEG_INFINITY; D]),
        }
    }

    pub fn is_empty(&self) -> bool {
        (0..D).any(|axis| self.min[axis] > self.max[axis])
    }

    pub fn add_point(&mut self, point: &Point<D>) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(&other.min),
            max: self.max.max(&other.max),
        }
    }

    /// Closed containment test.
    pub fn contains(&self, point: &Point<D>) -> bool {
        (0..D).all(|axis| self.min[axis] <= point[axis] && point[axis] <= self.max[axis])
    }

    pub fn intersects(&self, other: &Self) -> bool {
        (0..D).all(|axis| self.min[axis] <= other.max[axis] && other.min[axis] <= self.max[axis])
    }

    pub fn center(&self) -> Point<D> {
        (self.min + self.max) / 2.0
    }

    pub fn diagonal(&self) -> Point<D> {
        self.max - self.min
    }
}

impl<'p, const D: usize> FromIterator<&'p Point<D>> for BoundingBox<D> {
    fn from_iter<I: IntoIterator<Item = &'p Point<D>>>(points: I) -> Self {
        points.into_iter().fold(Self::empty(), |mut bbox, p| {
            bbox.add_point(p);
            bbox
        })
    }
}

/// Box around every point.
pub fn points_bounding_box<const D: usize>(points: &[Point<D>]) -> BoundingBox<D> {
    #[cfg(feature = "rayon")]
    {
        points
            .par_iter()
            .fold(BoundingBox::empty, |mut bbox, p| {
                bbox.add_point(p);
                bbox
            })
            .reduce(BoundingBox::empty, |a, b| a.union(&b))
    }
    #[cfg(not(feature = "rayon"))]
    {
        points.iter().collect()
    }
}

/// One box per element of `mesh`, in element order.
pub fn element_bounding_boxes<M, const D: usize>(mesh: &M) -> Vec<BoundingBox<D>>
where
    M: MeshElements + CoordinateProvider<D> + Sync,
{
    let element_box = |element: usize| {
        (0..mesh.nb_element_vertices(element))
            .map(|local| mesh.point(mesh.element_vertex(element, local)))
            .collect::<BoundingBox<D>>()
    };
    #[cfg(feature = "rayon")]
    {
        (0..mesh.nb_elements()).into_par_iter().map(element_box).collect()
    }
    #[cfg(not(feature = "rayon"))]
    {
        (0..mesh.nb_elements()).map(element_box).collect()
    }
}

/// Builds a spatial index over element boxes.
pub trait SpatialIndexBuilder<const D: usize> {
    type Index;

    /// `boxes[i]` bounds element `i`.
    fn build(&self, boxes: Vec<BoundingBox<D>>) -> Self::Index;
}

/// Compute element boxes and hand them to `builder`.
pub fn build_element_index<M, B, const D: usize>(mesh: &M, builder: &B) -> B::Index
where
    M: MeshElements + CoordinateProvider<D> + Sync,
    B: SpatialIndexBuilder<D>,
{
    let boxes = element_bounding_boxes(mesh);
    log::debug!("building spatial index over {} element boxes", boxes.len());
    builder.build(boxes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::element_mesh::SurfaceMesh2D;

    struct BruteForce;

    impl SpatialIndexBuilder<2> for BruteForce {
        type Index = Vec<BoundingBox<2>>;

        fn build(&self, boxes: Vec<BoundingBox<2>>) -> Self::Index {
            boxes
        }
    }

    #[test]
    fn empty_box_is_neutral() {
        let unit = BoundingBox::new(Point::new([0.0, 0.0]), Point::new([1.0, 1.0]));
        assert!(BoundingBox::<2>::empty().is_empty());
        assert_eq!(BoundingBox::empty().union(&unit), unit);
        assert!(unit.contains(&Point::new([1.0, 0.5])));
        assert!(!unit.contains(&Point::new([1.5, 0.5])));
        assert_eq!(unit.center(), Point::new([0.5, 0.5]));
    }

    #[test]
    fn element_boxes_feed_the_index() {
        let mut mesh = SurfaceMesh2D::new();
        let mut builder = mesh.builder();
        builder.create_points(&[
            Point::new([0.0, 0.0]),
            Point::new([2.0, 0.0]),
            Point::new([0.0, 1.0]),
            Point::new([3.0, 3.0]),
        ]);
        builder.create_triangle([0, 1, 2]).unwrap();
        builder.create_triangle([1, 3, 2]).unwrap();

        let index = build_element_index::<_, _, 2>(&mesh, &BruteForce);
        assert_eq!(index.len(), 2);
        assert_eq!(index[0].max, Point::new([2.0, 1.0]));
        assert!(index[0].intersects(&index[1]));
        let all = points_bounding_box(mesh.vertices().points());
        assert_eq!(all, index[0].union(&index[1]));
    }
}
