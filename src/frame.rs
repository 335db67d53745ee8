use nalgebra::{Matrix3, Matrix4, Point3, Vector3};

use crate::error::Result;
use crate::segmentation::Plane;
use crate::vector::rotation_between;

/// Homogeneous transform into a plane-local frame together with its
/// precomputed inverse.
///
/// The local frame has its origin at a chosen plane point and its Z axis
/// along the plane normal, so the local Z coordinate of a transformed point
/// is its signed distance to the plane.
#[derive(Debug, Clone)]
pub struct PlaneFrame {
    world_to_local: Matrix4<f64>,
    local_to_world: Matrix4<f64>,
}

impl PlaneFrame {
    /// Builds the frame for the plane through `origin` with the given normal.
    pub fn new(origin: &Vector3<f64>, normal: &Vector3<f64>) -> Result<Self> {
        let rotation = rotation_between(&Vector3::z(), normal)?;
        let rotation_inv = rotation.transpose();

        let world_to_local = compose(&rotation_inv, &(-rotation_inv * origin));
        let local_to_world = compose(&rotation, origin);
        Ok(PlaneFrame {
            world_to_local,
            local_to_world,
        })
    }

    /// The world-to-local homogeneous matrix.
    pub fn matrix(&self) -> &Matrix4<f64> {
        &self.world_to_local
    }

    /// The local-to-world homogeneous matrix.
    pub fn inverse(&self) -> &Matrix4<f64> {
        &self.local_to_world
    }

    pub fn to_local(&self, point: &Vector3<f64>) -> Vector3<f64> {
        self.world_to_local
            .transform_point(&Point3::from(*point))
            .coords
    }

    pub fn to_world(&self, point: &Vector3<f64>) -> Vector3<f64> {
        self.local_to_world
            .transform_point(&Point3::from(*point))
            .coords
    }
}

fn compose(rotation: &Matrix3<f64>, translation: &Vector3<f64>) -> Matrix4<f64> {
    let mut m = Matrix4::identity();
    m.fixed_view_mut::<3, 3>(0, 0).copy_from(rotation);
    m.fixed_view_mut::<3, 1>(0, 3).copy_from(translation);
    m
}

/// Transforms all points into the plane-local frame. The returned frame maps
/// the transformed points back to world coordinates via
/// [`PlaneFrame::to_world`].
pub fn transform_to_plane_coordinates(
    points: &[Vector3<f64>],
    origin: &Vector3<f64>,
    normal: &Vector3<f64>,
) -> Result<(Vec<Vector3<f64>>, PlaneFrame)> {
    let frame = PlaneFrame::new(origin, normal)?;
    let transformed = points.iter().map(|p| frame.to_local(p)).collect();
    Ok((transformed, frame))
}

/// A point on `plane` below the XY centroid of `points`, used as the frame
/// origin when re-projecting. Falls back to z = 0 for vertical planes.
pub(crate) fn plane_origin_below(points: &[Vector3<f64>], plane: &Plane) -> Vector3<f64> {
    let mean: Vector3<f64> = points.iter().sum::<Vector3<f64>>() / points.len().max(1) as f64;
    if plane.c.abs() > f64::EPSILON {
        Vector3::new(
            mean.x,
            mean.y,
            (plane.d - mean.x * plane.a - mean.y * plane.b) / plane.c,
        )
    } else {
        Vector3::new(mean.x, mean.y, 0.0)
    }
}

/// Splits the point set by `plane` and returns the indices of the side with
/// the majority of points; with `invert` the minority side is returned
/// instead.
pub fn clip_by_plane(
    points: &[Vector3<f64>],
    plane: &Plane,
    invert: bool,
) -> Result<Vec<usize>> {
    let origin = plane_origin_below(points, plane);
    let (transformed, _) = transform_to_plane_coordinates(points, &origin, &plane.normal())?;

    let mut above: Vec<usize> = Vec::new();
    let mut below: Vec<usize> = Vec::new();
    for (index, p) in transformed.iter().enumerate() {
        if p.z >= 0.0 {
            above.push(index);
        } else {
            below.push(index);
        }
    }
    if above.len() < below.len() {
        std::mem::swap(&mut above, &mut below);
    }
    Ok(if invert { below } else { above })
}

/// Rotates the point set by XYZ Euler angles (applied as Rz * Ry * Rx).
pub fn rotate_euler(points: &[Vector3<f64>], radians: &Vector3<f64>) -> Vec<Vector3<f64>> {
    let rotation = nalgebra::Rotation3::from_euler_angles(radians.x, radians.y, radians.z);
    points.iter().map(|p| rotation * p).collect()
}
