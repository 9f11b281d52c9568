use log::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::data::SmoothSkinningData;
use crate::error::Result;
use crate::ops::SkinningOp;
use crate::utils::PointListBuilder;

///
/// Drops every influence entry whose weight is at or below `threshold`,
/// keeping the remaining entries of each point in their original order.
/// Weights are not renormalized. The default threshold of 0 also drops negative weights.
///
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CompressSmoothSkinningDataOp {
    pub threshold: f32,
}

impl Default for CompressSmoothSkinningDataOp {
    fn default() -> Self {
        CompressSmoothSkinningDataOp { threshold: 0.0 }
    }
}

impl CompressSmoothSkinningDataOp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }
}

impl SkinningOp for CompressSmoothSkinningDataOp {
    fn name(&self) -> &'static str {
        "CompressSmoothSkinningDataOp"
    }

    fn apply(&self, data: &SmoothSkinningData) -> Result<SmoothSkinningData> {
        data.validate()?;
        Ok(compress(data, self.threshold))
    }
}

/// Compress already validated data.
pub(crate) fn compress(data: &SmoothSkinningData, threshold: f32) -> SmoothSkinningData {
    let mut builder = PointListBuilder::with_capacity(data.point_count(), data.point_influence_weights().len());
    for point in data.points() {
        builder.push_point(point.filter(|&(_, w)| w > threshold));
    }

    debug!("compressed {} influence entries to {} (threshold {})",
           data.point_influence_weights().len(), builder.entry_count(), threshold);

    builder.finish(data.influence_names().to_vec(), data.influence_pose().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::ops::fixtures::three_joints;

    fn compressed() -> SmoothSkinningData {
        three_joints(vec![0, 2, 4], vec![2, 2, 1], vec![0, 1, 0, 1, 1], vec![0.5, 0.5, 0.2, 0.8, 1.0])
    }

    fn noncompressed() -> SmoothSkinningData {
        three_joints(vec![0, 2, 5], vec![2, 3, 1], vec![0, 1, 0, 1, 2, 1], vec![0.5, 0.5, 0.2, 0.8, 0.0, 1.0])
    }

    fn decompressed() -> SmoothSkinningData {
        three_joints(vec![0, 3, 6], vec![3, 3, 3], vec![0, 1, 2, 0, 1, 2, 0, 1, 2],
                     vec![0.5, 0.5, 0.0, 0.2, 0.8, 0.0, 0.0, 1.0, 0.0])
    }

    #[test]
    fn test_compressing_compressed_is_unchanged() {
        let ssd = compressed();
        let result = CompressSmoothSkinningDataOp::new().apply(&ssd).unwrap();
        assert_eq!(result, ssd);
    }

    #[test]
    fn test_compressing_noncompressed() {
        let ssd = noncompressed();
        let result = CompressSmoothSkinningDataOp::new().apply(&ssd).unwrap();
        assert_ne!(result, ssd);
        assert_eq!(result, compressed());
    }

    #[test]
    fn test_compressing_decompressed() {
        let result = CompressSmoothSkinningDataOp::new().apply(&decompressed()).unwrap();
        assert_eq!(result, compressed());
    }

    #[test]
    fn test_threshold_drops_weights_at_or_below() {
        let op = CompressSmoothSkinningDataOp::new().with_threshold(0.5);
        let result = op.apply(&noncompressed()).unwrap();

        assert!(result.point_influence_weights().iter().all(|&w| w > 0.5));
        assert_eq!(result.point_index_offsets(), &[0, 0, 1]);
        assert_eq!(result.point_influence_counts(), &[0, 1, 1]);
        assert_eq!(result.point_influence_indices(), &[1, 1]);
        assert_eq!(result.point_influence_weights(), &[0.8, 1.0]);
        assert!(result.validate().is_ok());

        let from_dense = op.apply(&decompressed()).unwrap();
        assert_eq!(from_dense, result);
    }

    #[test]
    fn test_default_threshold_drops_negative_weights() {
        let ssd = three_joints(vec![0, 3], vec![3, 1], vec![0, 1, 2, 1], vec![-0.25, 0.0, 1.25, -1.0]);
        let result = CompressSmoothSkinningDataOp::new().apply(&ssd).unwrap();

        assert_eq!(result.point_index_offsets(), &[0, 1]);
        assert_eq!(result.point_influence_counts(), &[1, 0]);
        assert_eq!(result.point_influence_indices(), &[2]);
        assert_eq!(result.point_influence_weights(), &[1.25]);
        assert!(result.validate().is_ok());
    }

    #[test]
    fn test_compress_is_idempotent() {
        let op = CompressSmoothSkinningDataOp::new().with_threshold(0.3);
        let once = op.apply(&noncompressed()).unwrap();
        let twice = op.apply(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_rejects_other_input_types() {
        let op = CompressSmoothSkinningDataOp::new();
        match op.operate(&1i32) {
            Err(Error::TypeMismatch { op, .. }) => assert_eq!(op, "CompressSmoothSkinningDataOp"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(op.operate(&compressed()).is_ok());
    }

    #[test]
    fn test_rejects_invalid_input() {
        let bad = three_joints(vec![0, 1, 4], vec![2, 2, 1], vec![0, 1, 0, 1, 1], vec![0.5; 5]);
        assert!(matches!(CompressSmoothSkinningDataOp::new().apply(&bad), Err(Error::Validation(_))));
    }
}
