use std::mem;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::utils::{PointInfluences, Points, PointListBuilder};
use crate::{Matrix4, VertexWeight};

///
/// Per-point influence weights stored in compressed sparse row layout.
///
/// Point `p` owns the entries `point_index_offsets[p] .. point_index_offsets[p] + point_influence_counts[p]`
/// of the parallel `point_influence_indices` / `point_influence_weights` arrays. Every index refers to
/// an entry of `influence_names` and `influence_pose`.
///
/// Construction never validates; call `validate` before trusting data from outside the crate.
/// Every op validates its input before reading it.
///
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SmoothSkinningData {
    influence_names: Vec<String>,
    influence_pose: Vec<Matrix4>,
    point_index_offsets: Vec<i32>,
    point_influence_counts: Vec<i32>,
    point_influence_indices: Vec<i32>,
    point_influence_weights: Vec<f32>,
}

impl SmoothSkinningData {

    pub fn new(influence_names: Vec<String>,
               influence_pose: Vec<Matrix4>,
               point_index_offsets: Vec<i32>,
               point_influence_counts: Vec<i32>,
               point_influence_indices: Vec<i32>,
               point_influence_weights: Vec<f32>) -> SmoothSkinningData {
        SmoothSkinningData {
            influence_names: influence_names,
            influence_pose: influence_pose,
            point_index_offsets: point_index_offsets,
            point_influence_counts: point_influence_counts,
            point_influence_indices: point_influence_indices,
            point_influence_weights: point_influence_weights,
        }
    }

    ///
    /// Build the sparse layout from one `(influence index, weight)` list per point.
    /// Offsets are derived from the list lengths, so the result is always consistent
    /// apart from out-of-range influence indices, which `validate` reports. Indices
    /// too large for the `i32` layout are stored as `-1` rather than wrapped.
    ///
    pub fn from_point_influences(influence_names: Vec<String>,
                                 influence_pose: Vec<Matrix4>,
                                 points: &[Vec<(usize, f32)>]) -> SmoothSkinningData {
        let entries = points.iter().map(|p| p.len()).sum();
        let mut builder = PointListBuilder::with_capacity(points.len(), entries);
        for point in points {
            builder.push_point(point.iter().cloned());
        }
        builder.finish(influence_names, influence_pose)
    }

    ///
    /// Build from flat `(vertex, joint, weight)` triples, as found in bind data.
    /// Triples are grouped by vertex; their relative order within a vertex is kept.
    ///
    pub fn from_vertex_weights(influence_names: Vec<String>,
                               influence_pose: Vec<Matrix4>,
                               point_count: usize,
                               vertex_weights: &[VertexWeight]) -> Result<SmoothSkinningData> {
        let mut points: Vec<Vec<(usize, f32)>> = vec![Vec::new(); point_count];
        for vw in vertex_weights {
            match points.get_mut(vw.vertex) {
                Some(point) => point.push((vw.joint, vw.weight)),
                None => return Err(Error::validation(format!(
                    "SmoothSkinningData: vertex weight refers to vertex '{}' but only {} points exist",
                    vw.vertex, point_count))),
            }
        }
        Ok(SmoothSkinningData::from_point_influences(influence_names, influence_pose, &points))
    }

    pub fn influence_names(&self) -> &[String] {
        &self.influence_names
    }

    pub fn influence_pose(&self) -> &[Matrix4] {
        &self.influence_pose
    }

    pub fn point_index_offsets(&self) -> &[i32] {
        &self.point_index_offsets
    }

    pub fn point_influence_counts(&self) -> &[i32] {
        &self.point_influence_counts
    }

    pub fn point_influence_indices(&self) -> &[i32] {
        &self.point_influence_indices
    }

    pub fn point_influence_weights(&self) -> &[f32] {
        &self.point_influence_weights
    }

    pub fn influence_count(&self) -> usize {
        self.influence_names.len()
    }

    pub fn point_count(&self) -> usize {
        self.point_index_offsets.len()
    }

    /// Position of the first influence called `name`.
    pub fn influence_index(&self, name: &str) -> Option<usize> {
        self.influence_names.iter().position(|n| n == name)
    }

    ///
    /// Iterate over the `(influence index, weight)` pairs of one point.
    /// Yields nothing for a point outside the data or a span outside the flat arrays.
    ///
    pub fn point_influences(&self, point: usize) -> PointInfluences<'_> {
        let span = self.point_index_offsets.get(point)
            .and_then(|&o| self.point_influence_counts.get(point).map(|&c| (o, c)));

        if let Some((offset, count)) = span {
            if offset >= 0 && count >= 0 {
                let start = offset as usize;
                let end = start + count as usize;
                if end <= self.point_influence_indices.len() && end <= self.point_influence_weights.len() {
                    return PointInfluences::new(&self.point_influence_indices[start..end],
                                                &self.point_influence_weights[start..end]);
                }
            }
        }
        PointInfluences::new(&[], &[])
    }

    /// Iterate over every point, in order.
    pub fn points(&self) -> Points<'_> {
        Points::new(self)
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<Matrix4>, Vec<i32>, Vec<i32>, Vec<i32>, Vec<f32>) {
        (self.influence_names,
         self.influence_pose,
         self.point_index_offsets,
         self.point_influence_counts,
         self.point_influence_indices,
         self.point_influence_weights)
    }

    ///
    /// Check every structural invariant, reporting the first violation found.
    ///
    pub fn validate(&self) -> Result<()> {
        self.validate_sizes()?;
        self.validate_counts()?;
        self.validate_ids()?;
        self.validate_offsets()
    }

    fn validate_sizes(&self) -> Result<()> {
        let cin = self.influence_names.len();
        let cip = self.influence_pose.len();
        if cin != cip {
            return Err(Error::validation(format!(
                "SmoothSkinningData: Number of influenceNames '{}' does not match number of influencePose '{}'!",
                cin, cip)));
        }

        let cpio = self.point_index_offsets.len();
        let cpic = self.point_influence_counts.len();
        if cpio != cpic {
            return Err(Error::validation(format!(
                "SmoothSkinningData: Number of pointIndexOffsets '{}' does not match number of pointInfluenceCounts '{}'!",
                cpio, cpic)));
        }

        let cpii = self.point_influence_indices.len();
        let cpiw = self.point_influence_weights.len();
        if cpii != cpiw {
            return Err(Error::validation(format!(
                "SmoothSkinningData: Number of pointInfluenceIndices '{}' does not match number of pointInfluenceWeights '{}'!",
                cpii, cpiw)));
        }
        Ok(())
    }

    fn validate_counts(&self) -> Result<()> {
        if let Some(p) = self.point_influence_counts.iter().position(|&c| c < 0) {
            return Err(Error::validation(format!(
                "SmoothSkinningData: pointInfluenceCounts[{}] is negative ('{}')!",
                p, self.point_influence_counts[p])));
        }

        let sum: i64 = self.point_influence_counts.iter().map(|&c| c as i64).sum();
        let cpii = self.point_influence_indices.len() as i64;
        if sum != cpii {
            return Err(Error::validation(format!(
                "SmoothSkinningData: Sum of all pointInfluenceCounts '{}' does not match size of pointInfluenceIndices and pointInfluenceWeights '{}'!",
                sum, cpii)));
        }
        Ok(())
    }

    fn validate_ids(&self) -> Result<()> {
        let cpii = self.point_influence_indices.len() as i64;
        for (p, (&offset, &count)) in self.point_index_offsets.iter()
            .zip(self.point_influence_counts.iter()).enumerate()
        {
            let offset = offset as i64;
            if offset < 0 || offset > cpii || offset + count as i64 > cpii {
                return Err(Error::validation(format!(
                    "SmoothSkinningData: pointIndexOffsets[{}] with value '{}' and count '{}' is not pointing to a valid range in pointInfluenceWeights [ 0, {} ]!",
                    p, offset, count, cpii)));
            }
        }

        let cin = self.influence_names.len() as i64;
        for (i, &index) in self.point_influence_indices.iter().enumerate() {
            if index < 0 || index as i64 >= cin {
                return Err(Error::validation(format!(
                    "SmoothSkinningData: pointInfluenceIndices[{}] with value '{}' is not pointing to valid index in influenceNames vector range [ 0, {} )!",
                    i, index, cin)));
            }
        }
        Ok(())
    }

    fn validate_offsets(&self) -> Result<()> {
        let mut sum: i64 = 0;
        for (p, (&offset, &count)) in self.point_index_offsets.iter()
            .zip(self.point_influence_counts.iter()).enumerate()
        {
            if sum != offset as i64 {
                return Err(Error::validation(format!(
                    "SmoothSkinningData: pointIndexOffsets[{}] is pointing to index '{}', but sum of all pointInfluenceCounts up to this id is '{}'!",
                    p, offset, sum)));
            }
            sum += count as i64;
        }
        Ok(())
    }

    /// Bytes held by the six sequences.
    pub fn memory_usage(&self) -> usize {
        let names: usize = self.influence_names.iter()
            .map(|n| n.capacity() + mem::size_of::<String>())
            .sum();
        names
            + self.influence_pose.len() * mem::size_of::<Matrix4>()
            + self.point_index_offsets.len() * mem::size_of::<i32>()
            + self.point_influence_counts.len() * mem::size_of::<i32>()
            + self.point_influence_indices.len() * mem::size_of::<i32>()
            + self.point_influence_weights.len() * mem::size_of::<f32>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vecmath::mat4_id;

    fn names() -> Vec<String> {
        vec!["jointA".to_string(), "jointB".to_string(), "jointC".to_string()]
    }

    fn poses() -> Vec<Matrix4> {
        vec![mat4_id(); 3]
    }

    fn valid() -> SmoothSkinningData {
        SmoothSkinningData::new(names(), poses(),
                                vec![0, 2, 5], vec![2, 3, 1],
                                vec![0, 1, 0, 1, 2, 1],
                                vec![0.1, 0.1, 0.1, 0.2, 0.2, 0.3])
    }

    fn with_parts(offsets: Vec<i32>, counts: Vec<i32>, indices: Vec<i32>, weights: Vec<f32>) -> SmoothSkinningData {
        SmoothSkinningData::new(names(), poses(), offsets, counts, indices, weights)
    }

    #[test]
    fn test_validate_accepts_consistent_data() {
        assert_eq!(valid().validate(), Ok(()));
        assert_eq!(SmoothSkinningData::default().validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_pose_name_mismatch() {
        let ssd = SmoothSkinningData::new(names(), vec![mat4_id(); 2],
                                          vec![0], vec![1], vec![0], vec![1.0]);
        assert!(matches!(ssd.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_offset_count_length_mismatch() {
        let ssd = with_parts(vec![0, 2, 5, 6], vec![2, 3, 1], vec![0, 1, 0, 1, 2, 1], vec![0.1; 6]);
        assert!(ssd.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_index_weight_length_mismatch() {
        let ssd = with_parts(vec![0, 2, 5], vec![2, 3, 1], vec![0, 1, 0, 1, 2, 1], vec![0.1; 5]);
        assert!(ssd.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inconsistent_offsets() {
        let ssd = with_parts(vec![0, 1, 5], vec![2, 3, 1], vec![0, 1, 0, 1, 2, 1], vec![0.1; 6]);
        match ssd.validate() {
            Err(Error::Validation(msg)) => assert!(msg.contains("pointIndexOffsets[1]")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_bad_influence_index() {
        let ssd = with_parts(vec![0, 2, 5], vec![2, 3, 1], vec![0, 1, 0, 1, 3, 1], vec![0.1; 6]);
        assert!(ssd.validate().is_err());
        let ssd = with_parts(vec![0, 2, 5], vec![2, 3, 1], vec![0, -1, 0, 1, 2, 1], vec![0.1; 6]);
        assert!(ssd.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_negative_count_and_wrong_total() {
        let ssd = with_parts(vec![0, 2, 5], vec![2, -3, 1], vec![0, 1, 0, 1, 2, 1], vec![0.1; 6]);
        assert!(ssd.validate().is_err());
        let ssd = with_parts(vec![0, 2, 5], vec![2, 3, 2], vec![0, 1, 0, 1, 2, 1], vec![0.1; 6]);
        assert!(ssd.validate().is_err());
    }

    #[test]
    fn test_point_influences() {
        let ssd = valid();
        let p1: Vec<(usize, f32)> = ssd.point_influences(1).collect();
        assert_eq!(p1, vec![(0, 0.1), (1, 0.2), (2, 0.2)]);
        assert_eq!(ssd.point_influences(7).count(), 0);
        assert_eq!(ssd.points().map(|p| p.count()).collect::<Vec<_>>(), vec![2, 3, 1]);
    }

    #[test]
    fn test_from_point_influences_matches_new() {
        let built = SmoothSkinningData::from_point_influences(names(), poses(), &[
            vec![(0, 0.1), (1, 0.1)],
            vec![(0, 0.1), (1, 0.2), (2, 0.2)],
            vec![(1, 0.3)],
        ]);
        assert_eq!(built, valid());
    }

    #[test]
    fn test_from_vertex_weights_groups_by_vertex() {
        let weights = [
            VertexWeight { vertex: 2, joint: 1, weight: 0.3 },
            VertexWeight { vertex: 0, joint: 0, weight: 0.1 },
            VertexWeight { vertex: 1, joint: 0, weight: 0.1 },
            VertexWeight { vertex: 0, joint: 1, weight: 0.1 },
            VertexWeight { vertex: 1, joint: 1, weight: 0.2 },
            VertexWeight { vertex: 1, joint: 2, weight: 0.2 },
        ];
        let built = SmoothSkinningData::from_vertex_weights(names(), poses(), 3, &weights).unwrap();
        assert_eq!(built, valid());

        let bad = [VertexWeight { vertex: 3, joint: 0, weight: 1.0 }];
        assert!(SmoothSkinningData::from_vertex_weights(names(), poses(), 3, &bad).is_err());
    }

    #[test]
    fn test_out_of_range_indices_are_not_wrapped() {
        // would wrap to a valid index if truncated to 32 bits
        #[cfg(target_pointer_width = "64")]
        let huge = (1usize << 32) + 1;
        #[cfg(not(target_pointer_width = "64"))]
        let huge = i32::MAX as usize + 2;

        let built = SmoothSkinningData::from_point_influences(names(), poses(), &[vec![(huge, 1.0)]]);
        assert!(matches!(built.validate(), Err(Error::Validation(_))));

        let weights = [VertexWeight { vertex: 0, joint: huge, weight: 1.0 }];
        let built = SmoothSkinningData::from_vertex_weights(names(), poses(), 1, &weights).unwrap();
        assert!(matches!(built.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_clone_is_deep_and_equal() {
        let original = valid();
        let copy = original.clone();
        assert_eq!(copy, original);
        assert_ne!(copy.point_influence_weights().as_ptr(), original.point_influence_weights().as_ptr());
    }

    #[test]
    fn test_equality_looks_at_every_sequence() {
        let a = valid();
        let b = with_parts(vec![0, 2, 5], vec![2, 3, 1], vec![0, 1, 0, 1, 2, 1],
                           vec![0.1, 0.1, 0.1, 0.2, 0.2, 0.4]);
        assert_ne!(a, b);
        let mut other_names = names();
        other_names[2] = "jointD".to_string();
        let c = SmoothSkinningData::new(other_names, poses(), vec![0, 2, 5], vec![2, 3, 1],
                                        vec![0, 1, 0, 1, 2, 1], vec![0.1, 0.1, 0.1, 0.2, 0.2, 0.3]);
        assert_ne!(a, c);
    }

    #[test]
    fn test_influence_lookup_and_sizes() {
        let ssd = valid();
        assert_eq!(ssd.influence_index("jointB"), Some(1));
        assert_eq!(ssd.influence_index("jointZ"), None);
        assert_eq!(ssd.influence_count(), 3);
        assert_eq!(ssd.point_count(), 3);
        assert!(ssd.memory_usage() >= 3 * mem::size_of::<Matrix4>() + 12 * 4 + 6 * 4);
    }
}
