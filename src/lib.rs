#![warn(clippy::all)]
//! Geometric primitive extraction from 3D point clouds.
//!
//! Pointfit detects planes, lines, circles and circular holes in point
//! clouds and provides the supporting geometry to measure them: plane-local
//! coordinate frames, convex-hull boundary extraction, polyline
//! simplification, density clustering and voxel downsampling. Detectors
//! take an explicit random source and return inlier index sets together
//! with the fitted model.

// Exact and RANSAC-based circle fitting on planar point sets.
pub mod circle;
// DBSCAN density clustering over the XY projection of a point set.
pub mod clustering;
// Convex-hull boundary extraction for planar point sets.
pub mod convexhull;
// Point-to-line and point-to-plane distance computations.
pub mod distance;
// Voxel-grid downsampling.
pub mod downsample;
// Straight-edge extraction along the boundary of a planar point set.
pub mod edges;
// The error taxonomy shared by all detectors.
pub mod error;
// Plane-local coordinate frames, plane clipping and Euler rotation.
pub mod frame;
// Detection of circular holes of known radius in planar point sets.
pub mod hole;
// Contains ransac line- and plane-segmentation algorithms in serial and parallel that can be used
// to get the best line-/plane-model and the corresponding inlier indices.
pub mod segmentation;
// Ramer-Douglas-Peucker polyline simplification.
pub mod simplify;
// Vector averaging, normal estimation and rotation helpers.
pub mod vector;

mod stats;
