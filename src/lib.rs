//! Sparse smooth skinning weights.
//!
//! `SmoothSkinningData` stores, per mesh point, a variable length list of
//! `(influence, weight)` pairs in compressed sparse row layout, alongside the
//! influence names and bind poses. The ops in `ops` each read one validated
//! instance and build a new one; none of them mutate their input.

pub type Matrix4 = vecmath::Matrix4<f32>;
pub type Vector3 = vecmath::Vector3<f32>;

/// A single joint influence on a vertex, as found in bind data.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VertexWeight {
    pub vertex: VertexIndex,
    pub joint: JointIndex,
    pub weight: f32,
}

pub type VertexIndex = usize;
pub type JointIndex = usize;

pub mod data;
pub mod error;
pub mod mesh;
pub mod ops;
pub mod utils;

mod locks;

pub use data::SmoothSkinningData;
pub use error::{Error, Result};
pub use mesh::MeshTopology;
pub use ops::{
    AddSmoothSkinningInfluencesOp,
    CompressSmoothSkinningDataOp,
    ContrastSmoothSkinningWeightsOp,
    DecompressSmoothSkinningDataOp,
    Deformed,
    LimitMode,
    LimitSmoothSkinningInfluencesOp,
    MixSmoothSkinningWeightsOp,
    NormalizeSmoothSkinningWeightsOp,
    PointSmoothSkinningOp,
    RemoveMode,
    RemoveSmoothSkinningInfluencesOp,
    SkinningOp,
    SmoothSmoothSkinningWeightsOp,
    TransferSmoothSkinningWeightsOp,
};
