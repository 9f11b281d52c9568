use log::{debug, trace};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::data::SmoothSkinningData;
use crate::error::{Error, Result};
use crate::locks;
use crate::mesh::MeshTopology;
use crate::ops::compress::compress;
use crate::ops::decompress::decompress;
use crate::ops::normalize::normalize;
use crate::ops::SkinningOp;
use crate::utils::PointListBuilder;

///
/// Smooths weights across the mesh the skinning data belongs to.
///
/// Each iteration moves the weights of the selected vertices towards the
/// average of their mesh neighbours by `smoothing_ratio`, then renormalizes.
/// Locked influences keep their weights. The result is compressed.
///
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SmoothSmoothSkinningWeightsOp {
    pub mesh: MeshTopology,
    /// Vertices to smooth; empty means every vertex.
    pub vertex_indices: Vec<usize>,
    pub smoothing_ratio: f32,
    pub iterations: u32,
    pub apply_locks: bool,
    pub influence_locks: Vec<bool>,
}

impl Default for SmoothSmoothSkinningWeightsOp {
    fn default() -> Self {
        SmoothSmoothSkinningWeightsOp {
            mesh: MeshTopology::default(),
            vertex_indices: Vec::new(),
            smoothing_ratio: 0.5,
            iterations: 1,
            apply_locks: true,
            influence_locks: Vec::new(),
        }
    }
}

impl SmoothSmoothSkinningWeightsOp {
    pub fn new(mesh: MeshTopology) -> Self {
        SmoothSmoothSkinningWeightsOp { mesh: mesh, ..Self::default() }
    }

    pub fn with_vertex_indices(mut self, vertex_indices: Vec<usize>) -> Self {
        self.vertex_indices = vertex_indices;
        self
    }

    pub fn with_smoothing_ratio(mut self, smoothing_ratio: f32) -> Self {
        self.smoothing_ratio = smoothing_ratio;
        self
    }

    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_locks(mut self, influence_locks: Vec<bool>) -> Self {
        self.apply_locks = true;
        self.influence_locks = influence_locks;
        self
    }

    pub fn without_locks(mut self) -> Self {
        self.apply_locks = false;
        self.influence_locks.clear();
        self
    }

    fn check(&self, data: &SmoothSkinningData) -> Result<Vec<bool>> {
        let op = self.name();
        self.mesh.validate()?;
        if self.mesh.vertex_count() != data.point_count() {
            return Err(Error::validation(format!(
                "{}: the mesh has {} vertices but the skinning data has {} points",
                op, self.mesh.vertex_count(), data.point_count())));
        }
        if !(0.0..=1.0).contains(&self.smoothing_ratio) {
            return Err(Error::validation(format!(
                "{}: smoothing ratio {} is outside [0, 1]", op, self.smoothing_ratio)));
        }
        if self.iterations < 1 {
            return Err(Error::validation(format!("{}: at least one iteration is required", op)));
        }
        if let Some(&v) = self.vertex_indices.iter().find(|&&v| v >= data.point_count()) {
            return Err(Error::validation(format!(
                "{}: vertex {} is outside the range of the skinning data and mesh", op, v)));
        }
        locks::resolve(op, self.apply_locks, &self.influence_locks, data.influence_count())
    }
}

impl SkinningOp for SmoothSmoothSkinningWeightsOp {
    fn name(&self) -> &'static str {
        "SmoothSmoothSkinningWeightsOp"
    }

    fn apply(&self, data: &SmoothSkinningData) -> Result<SmoothSkinningData> {
        data.validate()?;
        let locks = self.check(data)?;

        let influence_count = data.influence_count();
        let point_count = data.point_count();
        let neighbours = self.mesh.adjacency();
        let selected: Vec<usize> = if self.vertex_indices.is_empty() {
            (0..point_count).collect()
        } else {
            self.vertex_indices.clone()
        };

        // Dense, so entry `j` of point `p` lives at `p * influence_count + j`.
        let mut current = decompress(data);
        for iteration in 0..self.iterations {
            let weights = current.point_influence_weights();
            let mut smoothed = weights.to_vec();

            for &v in &selected {
                let around = &neighbours[v];
                if around.is_empty() {
                    trace!("vertex {} has no neighbours, leaving it as it is", v);
                    continue;
                }
                for j in 0..influence_count {
                    if locks[j] {
                        continue;
                    }
                    let total: f32 = around.iter().map(|&n| weights[n * influence_count + j]).sum();
                    let average = total / around.len() as f32;
                    let w = weights[v * influence_count + j];
                    smoothed[v * influence_count + j] = w + (average - w) * self.smoothing_ratio;
                }
            }

            let mut builder = PointListBuilder::with_capacity(point_count, smoothed.len());
            for p in 0..point_count {
                let row = &smoothed[p * influence_count..(p + 1) * influence_count];
                builder.push_point(row.iter().cloned().enumerate());
            }
            current = normalize(&builder.finish(data.influence_names().to_vec(), data.influence_pose().to_vec()), &locks);
            trace!("finished smoothing iteration {}", iteration + 1);
        }

        debug!("smoothed {} of {} vertices over {} iterations (ratio {})",
               selected.len(), point_count, self.iterations, self.smoothing_ratio);

        Ok(compress(&current, 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::fixtures::{assert_weights_near, joints, poses};

    /// A closed strip of 14 quads around 16 vertices.
    fn mesh() -> MeshTopology {
        MeshTopology::new(vec![4; 14], vec![
            0, 1, 3, 2, 2, 3, 5, 4, 4, 5, 7, 6, 6, 7, 9, 8,
            8, 9, 11, 10, 10, 11, 13, 12, 12, 13, 15, 14, 14, 15, 1, 0,
            1, 15, 13, 3, 3, 13, 11, 5, 5, 11, 9, 7, 14, 0, 2, 12,
            12, 2, 4, 10, 10, 4, 6, 8,
        ])
    }

    fn original() -> SmoothSkinningData {
        SmoothSkinningData::new(
            joints(3),
            poses(3),
            vec![0, 1, 2, 4, 6, 7, 8, 10, 12, 14, 16, 17, 18, 20, 22, 23],
            vec![1, 1, 2, 2, 1, 1, 2, 2, 2, 2, 1, 1, 2, 2, 1, 1],
            vec![0, 0, 0, 1, 0, 1, 1, 1, 1, 2, 1, 2, 1, 2, 1, 2, 1, 1, 0, 1, 0, 1, 0, 0],
            vec![1.0, 1.0, 0.8, 0.2, 0.8, 0.2, 1.0, 1.0, 0.5, 0.5, 0.5, 0.5,
                 0.5, 0.5, 0.5, 0.5, 1.0, 1.0, 0.8, 0.2, 0.8, 0.2, 1.0, 1.0])
    }

    fn sums(data: &SmoothSkinningData) -> Vec<f32> {
        data.points().map(|p| p.map(|(_, w)| w).sum()).collect()
    }

    #[test]
    fn test_one_iteration() {
        let op = SmoothSmoothSkinningWeightsOp::new(mesh()).without_locks();
        let result = op.apply(&original()).unwrap();

        assert_eq!(result.influence_names(), original().influence_names());
        assert_eq!(result.point_index_offsets(), &[0, 2, 4, 6, 8, 11, 14, 16, 18, 20, 22, 25, 28, 30, 32, 34]);
        assert_eq!(result.point_influence_counts(), &[2, 2, 2, 2, 3, 3, 2, 2, 2, 2, 3, 3, 2, 2, 2, 2]);
        assert_eq!(result.point_influence_indices(), &[
            0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 2, 0, 1, 2, 1, 2, 1, 2,
            1, 2, 1, 2, 0, 1, 2, 0, 1, 2, 0, 1, 0, 1, 0, 1, 0, 1,
        ][..]);
        assert_weights_near(result.point_influence_weights(), &[
            0.966667, 0.0333333, 0.966667, 0.0333333, 0.725, 0.275, 0.725, 0.275,
            0.1, 0.8375, 0.0625, 0.1, 0.8375, 0.0625, 0.583333, 0.416667,
            0.583333, 0.416667, 0.583333, 0.416667, 0.583333, 0.416667,
            0.1, 0.8375, 0.0625, 0.1, 0.8375, 0.0625, 0.725, 0.275,
            0.725, 0.275, 0.966667, 0.0333333, 0.966667, 0.0333333,
        ], 1e-5);
        assert_weights_near(&sums(&result), &[1.0; 16], 1e-5);
    }

    #[test]
    fn test_zero_ratio_changes_nothing() {
        let op = SmoothSmoothSkinningWeightsOp::new(mesh()).without_locks().with_smoothing_ratio(0.0);
        let result = op.apply(&original()).unwrap();
        assert_eq!(result.point_index_offsets(), original().point_index_offsets());
        assert_eq!(result.point_influence_indices(), original().point_influence_indices());
        assert_weights_near(result.point_influence_weights(), original().point_influence_weights(), 1e-6);
    }

    #[test]
    fn test_more_iterations_keep_weights_normalized() {
        let op = SmoothSmoothSkinningWeightsOp::new(mesh()).without_locks().with_iterations(5);
        let result = op.apply(&original()).unwrap();
        assert!(result.validate().is_ok());
        assert_weights_near(&sums(&result), &[1.0; 16], 1e-5);
    }

    #[test]
    fn test_only_selected_vertices_move() {
        let op = SmoothSmoothSkinningWeightsOp::new(mesh()).without_locks().with_vertex_indices(vec![0]);
        let result = op.apply(&original()).unwrap();

        let first: Vec<(usize, f32)> = result.point_influences(0).collect();
        assert_eq!(first.len(), 2);
        assert!((first[0].1 - 0.966667).abs() < 1e-5);
        for p in 1..16 {
            let before: Vec<(usize, f32)> = original().point_influences(p).collect();
            let after: Vec<(usize, f32)> = result.point_influences(p).collect();
            assert_eq!(before.len(), after.len());
            for (b, a) in before.iter().zip(after.iter()) {
                assert_eq!(b.0, a.0);
                assert!((b.1 - a.1).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_locked_influences_keep_their_weights() {
        let op = SmoothSmoothSkinningWeightsOp::new(mesh()).with_locks(vec![true, false, false]);
        let ssd = original();
        let result = op.apply(&ssd).unwrap();
        let dense_before = decompress(&ssd);
        let dense_after = decompress(&result);
        for (i, &index) in dense_before.point_influence_indices().iter().enumerate() {
            if index == 0 {
                assert_eq!(dense_after.point_influence_weights()[i], dense_before.point_influence_weights()[i]);
            }
        }
    }

    #[test]
    fn test_error_states() {
        let ssd = original();

        let locks_missing = SmoothSmoothSkinningWeightsOp::new(mesh());
        assert!(matches!(locks_missing.apply(&ssd), Err(Error::Validation(_))));

        let small_mesh = MeshTopology::new(vec![4], vec![0, 1, 2, 3]);
        let bad_mesh = SmoothSmoothSkinningWeightsOp::new(small_mesh).without_locks();
        assert!(matches!(bad_mesh.apply(&ssd), Err(Error::Validation(_))));

        let bad_vertex = SmoothSmoothSkinningWeightsOp::new(mesh()).without_locks().with_vertex_indices(vec![0, 16]);
        assert!(matches!(bad_vertex.apply(&ssd), Err(Error::Validation(_))));

        let bad_ratio = SmoothSmoothSkinningWeightsOp::new(mesh()).without_locks().with_smoothing_ratio(1.5);
        assert!(matches!(bad_ratio.apply(&ssd), Err(Error::Validation(_))));

        let no_iterations = SmoothSmoothSkinningWeightsOp::new(mesh()).without_locks().with_iterations(0);
        assert!(matches!(no_iterations.apply(&ssd), Err(Error::Validation(_))));
    }
}
