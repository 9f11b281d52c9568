use log::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::data::SmoothSkinningData;
use crate::error::{Error, Result};
use crate::ops::compress::compress;
use crate::ops::SkinningOp;
use crate::utils::{dense_row, PointListBuilder};

///
/// Blends the input weights with those of a second set of skinning data over
/// the same points and influences. For influence `i` the result is
/// `mixing_weights[i] * input + (1 - mixing_weights[i]) * skinning_data_to_mix`.
///
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MixSmoothSkinningWeightsOp {
    pub skinning_data_to_mix: SmoothSkinningData,
    /// One mixing weight per influence.
    pub mixing_weights: Vec<f32>,
}

impl MixSmoothSkinningWeightsOp {
    pub fn new(skinning_data_to_mix: SmoothSkinningData, mixing_weights: Vec<f32>) -> Self {
        MixSmoothSkinningWeightsOp {
            skinning_data_to_mix: skinning_data_to_mix,
            mixing_weights: mixing_weights,
        }
    }

    /// Mix every influence by the same amount.
    pub fn uniform(skinning_data_to_mix: SmoothSkinningData, mixing_weight: f32) -> Self {
        let n = skinning_data_to_mix.influence_count();
        Self::new(skinning_data_to_mix, vec![mixing_weight; n])
    }
}

impl SkinningOp for MixSmoothSkinningWeightsOp {
    fn name(&self) -> &'static str {
        "MixSmoothSkinningWeightsOp"
    }

    fn apply(&self, data: &SmoothSkinningData) -> Result<SmoothSkinningData> {
        data.validate()?;
        let other = &self.skinning_data_to_mix;
        other.validate()?;

        let influence_count = data.influence_count();
        if other.influence_count() != influence_count {
            return Err(Error::validation(format!(
                "{}: cannot mix data with {} influences into data with {}",
                self.name(), other.influence_count(), influence_count)));
        }
        if other.point_count() != data.point_count() {
            return Err(Error::validation(format!(
                "{}: cannot mix data with {} points into data with {}",
                self.name(), other.point_count(), data.point_count())));
        }
        if self.mixing_weights.len() != influence_count {
            return Err(Error::validation(format!(
                "{}: there must be exactly one mixing weight per influence ({} given for {} influences)",
                self.name(), self.mixing_weights.len(), influence_count)));
        }

        let mut builder = PointListBuilder::with_capacity(data.point_count(), data.point_count() * influence_count);
        for (a, b) in data.points().zip(other.points()) {
            let a = dense_row(a, influence_count);
            let b = dense_row(b, influence_count);
            builder.push_point(self.mixing_weights.iter().enumerate().map(|(i, &m)| {
                (i, m * a[i] + (1.0 - m) * b[i])
            }));
        }

        debug!("mixed {} points over {} influences", data.point_count(), influence_count);

        let mixed = builder.finish(data.influence_names().to_vec(), data.influence_pose().to_vec());
        Ok(compress(&mixed, 0.0))
    }
}
