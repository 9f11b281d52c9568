use log::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::data::SmoothSkinningData;
use crate::error::{Error, Result};
use crate::locks;
use crate::ops::SkinningOp;
use crate::utils::PointListBuilder;

///
/// Pushes weights away from `contrast_center`: weights below it shrink
/// towards 0 and weights above it grow towards 1. Higher ratios and more
/// iterations push harder. Weights are not renormalized afterwards.
///
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ContrastSmoothSkinningWeightsOp {
    pub contrast_ratio: f32,
    pub contrast_center: f32,
    pub iterations: u32,
    /// Points to adjust; empty means every point.
    pub vertex_indices: Vec<usize>,
    pub apply_locks: bool,
    pub influence_locks: Vec<bool>,
}

impl Default for ContrastSmoothSkinningWeightsOp {
    fn default() -> Self {
        ContrastSmoothSkinningWeightsOp {
            contrast_ratio: 1.0,
            contrast_center: 0.5,
            iterations: 1,
            vertex_indices: Vec::new(),
            apply_locks: true,
            influence_locks: Vec::new(),
        }
    }
}

impl ContrastSmoothSkinningWeightsOp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ratio(mut self, contrast_ratio: f32) -> Self {
        self.contrast_ratio = contrast_ratio;
        self
    }

    pub fn with_center(mut self, contrast_center: f32) -> Self {
        self.contrast_center = contrast_center;
        self
    }

    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_vertex_indices(mut self, vertex_indices: Vec<usize>) -> Self {
        self.vertex_indices = vertex_indices;
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

    fn contrast(&self, w: f32) -> f32 {
        let c = self.contrast_center;
        let exponent = 1.0 + self.contrast_ratio;
        if w > 0.0 && w < c {
            c * (w / c).powf(exponent)
        } else if w > c && w < 1.0 {
            1.0 - (1.0 - c) * ((1.0 - w) / (1.0 - c)).powf(exponent)
        } else {
            w
        }
    }

    fn check(&self, data: &SmoothSkinningData) -> Result<Vec<bool>> {
        let op = self.name();
        if !(0.0..=1.0).contains(&self.contrast_ratio) {
            return Err(Error::validation(format!(
                "{}: contrast ratio {} is outside [0, 1]", op, self.contrast_ratio)));
        }
        if !(self.contrast_center > 0.0 && self.contrast_center < 1.0) {
            return Err(Error::validation(format!(
                "{}: contrast center {} is outside (0, 1)", op, self.contrast_center)));
        }
        if self.iterations < 1 {
            return Err(Error::validation(format!("{}: at least one iteration is required", op)));
        }
        if let Some(&v) = self.vertex_indices.iter().find(|&&v| v >= data.point_count()) {
            return Err(Error::validation(format!(
                "{}: vertex {} is outside the range of the skinning data", op, v)));
        }
        locks::resolve(op, self.apply_locks, &self.influence_locks, data.influence_count())
    }
}

impl SkinningOp for ContrastSmoothSkinningWeightsOp {
    fn name(&self) -> &'static str {
        "ContrastSmoothSkinningWeightsOp"
    }

    fn apply(&self, data: &SmoothSkinningData) -> Result<SmoothSkinningData> {
        data.validate()?;
        let locks = self.check(data)?;

        let mut selected = vec![self.vertex_indices.is_empty(); data.point_count()];
        for &v in &self.vertex_indices {
            selected[v] = true;
        }

        let mut builder = PointListBuilder::with_capacity(data.point_count(), data.point_influence_weights().len());
        for (p, point) in data.points().enumerate() {
            if !selected[p] {
                builder.push_point(point);
                continue;
            }
            builder.push_point(point.map(|(index, mut weight)| {
                if !locks[index] {
                    for _ in 0..self.iterations {
                        weight = self.contrast(weight);
                    }
                }
                (index, weight)
            }));
        }

        debug!("contrasted {} points around {} (ratio {}, {} iterations)",
               selected.iter().filter(|&&s| s).count(), self.contrast_center, self.contrast_ratio, self.iterations);

        Ok(builder.finish(data.influence_names().to_vec(), data.influence_pose().to_vec()))
    }
}
