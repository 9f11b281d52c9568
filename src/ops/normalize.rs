use log::{debug, trace};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::data::SmoothSkinningData;
use crate::error::Result;
use crate::locks;
use crate::ops::SkinningOp;
use crate::utils::PointListBuilder;

///
/// Rescales each point's weights so they add up to one.
///
/// Locked influences keep their weight; the unlocked weights of a point are
/// scaled to fill whatever the locked ones leave. A point without unlocked
/// weight is left as it is.
///
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NormalizeSmoothSkinningWeightsOp {
    pub apply_locks: bool,
    /// One flag per influence, consulted when `apply_locks` is set.
    pub influence_locks: Vec<bool>,
}

impl NormalizeSmoothSkinningWeightsOp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_locks(mut self, influence_locks: Vec<bool>) -> Self {
        self.apply_locks = true;
        self.influence_locks = influence_locks;
        self
    }
}

impl SkinningOp for NormalizeSmoothSkinningWeightsOp {
    fn name(&self) -> &'static str {
        "NormalizeSmoothSkinningWeightsOp"
    }

    fn apply(&self, data: &SmoothSkinningData) -> Result<SmoothSkinningData> {
        data.validate()?;
        let locks = locks::resolve(self.name(), self.apply_locks, &self.influence_locks, data.influence_count())?;
        Ok(normalize(data, &locks))
    }
}

/// Normalize already validated data with resolved locks.
pub(crate) fn normalize(data: &SmoothSkinningData, locks: &[bool]) -> SmoothSkinningData {
    let mut builder = PointListBuilder::with_capacity(data.point_count(), data.point_influence_weights().len());
    let mut skipped = 0;

    for (p, point) in data.points().enumerate() {
        let mut locked_sum = 0.0;
        let mut unlocked_sum = 0.0;
        for (index, weight) in point.clone() {
            if locks[index] {
                locked_sum += weight;
            } else {
                unlocked_sum += weight;
            }
        }

        if unlocked_sum > 0.0 {
            let factor = (1.0 - locked_sum) / unlocked_sum;
            builder.push_point(point.map(|(index, weight)| {
                if locks[index] { (index, weight) } else { (index, weight * factor) }
            }));
        } else {
            trace!("point {} has no unlocked weight to normalize", p);
            skipped += 1;
            builder.push_point(point);
        }
    }

    debug!("normalized {} points ({} without unlocked weight)", data.point_count(), skipped);

    builder.finish(data.influence_names().to_vec(), data.influence_pose().to_vec())
}
