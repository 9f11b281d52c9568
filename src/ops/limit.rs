use log::{debug, trace};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::data::SmoothSkinningData;
use crate::error::{Error, Result};
use crate::locks;
use crate::ops::compress::compress;
use crate::ops::SkinningOp;
use crate::utils::PointListBuilder;

/// Which weights `LimitSmoothSkinningInfluencesOp` zeroes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LimitMode {
    /// Weights below `min_weight`.
    WeightLimit,
    /// All but the `max_influences` largest weights of each point.
    MaxInfluences,
    /// Weights of the influences listed in `influence_indices`.
    Indexed,
}

impl Default for LimitMode {
    fn default() -> Self {
        LimitMode::WeightLimit
    }
}

///
/// Zeroes influence weights that fall outside a limit, optionally dropping
/// them from the result. Locked influences are never zeroed.
///
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LimitSmoothSkinningInfluencesOp {
    pub mode: LimitMode,
    pub min_weight: f32,
    pub max_influences: usize,
    pub influence_indices: Vec<usize>,
    /// Drop the zeroed entries afterwards.
    pub compress_result: bool,
    pub apply_locks: bool,
    pub influence_locks: Vec<bool>,
}

impl Default for LimitSmoothSkinningInfluencesOp {
    fn default() -> Self {
        LimitSmoothSkinningInfluencesOp {
            mode: LimitMode::WeightLimit,
            min_weight: 0.001,
            max_influences: 3,
            influence_indices: Vec::new(),
            compress_result: true,
            apply_locks: true,
            influence_locks: Vec::new(),
        }
    }
}

impl LimitSmoothSkinningInfluencesOp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min_weight(min_weight: f32) -> Self {
        LimitSmoothSkinningInfluencesOp { mode: LimitMode::WeightLimit, min_weight: min_weight, ..Self::default() }
    }

    pub fn max_influences(max_influences: usize) -> Self {
        LimitSmoothSkinningInfluencesOp { mode: LimitMode::MaxInfluences, max_influences: max_influences, ..Self::default() }
    }

    pub fn indexed(influence_indices: Vec<usize>) -> Self {
        LimitSmoothSkinningInfluencesOp { mode: LimitMode::Indexed, influence_indices: influence_indices, ..Self::default() }
    }

    pub fn with_compress_result(mut self, compress_result: bool) -> Self {
        self.compress_result = compress_result;
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

    /// Keep the locked entries and the largest unlocked ones, up to `max_influences` in all.
    fn limit_count(&self, entries: &mut [(usize, f32)], locks: &[bool]) -> usize {
        let locked = entries.iter().filter(|&&(index, _)| locks[index]).count();
        let slots = self.max_influences.saturating_sub(locked);

        let mut unlocked: Vec<usize> = (0..entries.len()).filter(|&e| !locks[entries[e].0]).collect();
        if unlocked.len() <= slots {
            return 0;
        }
        // largest first, later entries winning ties
        unlocked.sort_by(|&a, &b| {
            entries[b].1.partial_cmp(&entries[a].1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.cmp(&a))
        });
        for &e in &unlocked[slots..] {
            entries[e].1 = 0.0;
        }
        unlocked.len() - slots
    }
}

impl SkinningOp for LimitSmoothSkinningInfluencesOp {
    fn name(&self) -> &'static str {
        "LimitSmoothSkinningInfluencesOp"
    }

    fn apply(&self, data: &SmoothSkinningData) -> Result<SmoothSkinningData> {
        data.validate()?;
        let influence_count = data.influence_count();
        let locks = locks::resolve(self.name(), self.apply_locks, &self.influence_locks, influence_count)?;

        let mut limited = vec![false; influence_count];
        if self.mode == LimitMode::Indexed {
            for &index in &self.influence_indices {
                if index >= influence_count {
                    return Err(Error::validation(format!(
                        "{}: influence index {} is out of range, there are {} influences",
                        self.name(), index, influence_count)));
                }
                limited[index] = true;
            }
        }

        let mut builder = PointListBuilder::with_capacity(data.point_count(), data.point_influence_weights().len());
        let mut zeroed = 0;
        for (p, point) in data.points().enumerate() {
            let mut entries: Vec<(usize, f32)> = point.collect();
            match self.mode {
                LimitMode::WeightLimit => {
                    for entry in entries.iter_mut() {
                        if !locks[entry.0] && entry.1 < self.min_weight {
                            entry.1 = 0.0;
                            zeroed += 1;
                        }
                    }
                }
                LimitMode::MaxInfluences => {
                    let n = self.limit_count(&mut entries, &locks);
                    if n > 0 {
                        trace!("point {}: dropped {} influences over the limit of {}", p, n, self.max_influences);
                    }
                    zeroed += n;
                }
                LimitMode::Indexed => {
                    for entry in entries.iter_mut() {
                        if !locks[entry.0] && limited[entry.0] {
                            entry.1 = 0.0;
                            zeroed += 1;
                        }
                    }
                }
            }
            builder.push_point(entries);
        }

        debug!("{:?} limit zeroed {} of {} influence entries", self.mode, zeroed, data.point_influence_weights().len());

        let result = builder.finish(data.influence_names().to_vec(), data.influence_pose().to_vec());
        if self.compress_result {
            Ok(compress(&result, 0.0))
        } else {
            Ok(result)
        }
    }
}
