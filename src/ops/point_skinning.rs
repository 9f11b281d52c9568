use log::debug;
use vecmath::{col_mat4_mul, col_mat4_transform, vec3_add, vec3_scale};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::data::SmoothSkinningData;
use crate::error::{Error, Result};
use crate::{Matrix4, Vector3};

/// Positions and normals produced by `PointSmoothSkinningOp::deform`.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Deformed {
    pub positions: Vec<Vector3>,
    pub normals: Vec<Vector3>,
}

///
/// Linear blend skinning of points and normals.
///
/// Influence `i` moves geometry by `deformation_pose[i] * influence_pose[i]`,
/// so the stored influence pose takes a point from bind space into the
/// influence's local space and the deformation pose takes it back out.
/// Each point ends up at the weighted sum of its influences' transforms.
///
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PointSmoothSkinningOp {
    /// One transform per influence.
    pub deformation_pose: Vec<Matrix4>,
    /// If not empty, position `i` is skinned by point `reference_indices[i]`.
    pub reference_indices: Vec<usize>,
    /// If not empty, normal `i` belongs to position `normal_vertex_ids[i]`
    /// (face-varying normals). Otherwise normal `i` belongs to position `i`.
    pub normal_vertex_ids: Vec<usize>,
}

impl PointSmoothSkinningOp {
    pub fn new(deformation_pose: Vec<Matrix4>) -> Self {
        PointSmoothSkinningOp { deformation_pose: deformation_pose, ..Self::default() }
    }

    pub fn with_reference_indices(mut self, reference_indices: Vec<usize>) -> Self {
        self.reference_indices = reference_indices;
        self
    }

    pub fn with_normal_vertex_ids(mut self, normal_vertex_ids: Vec<usize>) -> Self {
        self.normal_vertex_ids = normal_vertex_ids;
        self
    }

    pub fn name(&self) -> &'static str {
        "PointSmoothSkinningOp"
    }

    ///
    /// Deform `positions`, and `normals` if any are given, by `data`.
    /// Normals are transformed as directions and are not renormalized.
    ///
    pub fn deform(&self, data: &SmoothSkinningData, positions: &[Vector3], normals: &[Vector3]) -> Result<Deformed> {
        data.validate()?;
        self.check(data, positions, normals)?;

        let skin: Vec<Matrix4> = self.deformation_pose.iter()
            .zip(data.influence_pose())
            .map(|(&deformation, &bind)| col_mat4_mul(deformation, bind))
            .collect();

        let skinning_point = |position: usize| -> usize {
            if self.reference_indices.is_empty() { position } else { self.reference_indices[position] }
        };

        let blend = |point: usize, v: [f32; 4]| -> Vector3 {
            data.point_influences(point).fold([0.0; 3], |acc, (index, weight)| {
                let t = col_mat4_transform(skin[index], v);
                vec3_add(acc, vec3_scale([t[0], t[1], t[2]], weight))
            })
        };

        let deformed_positions: Vec<Vector3> = positions.iter()
            .enumerate()
            .map(|(i, p)| blend(skinning_point(i), [p[0], p[1], p[2], 1.0]))
            .collect();

        let deformed_normals: Vec<Vector3> = normals.iter()
            .enumerate()
            .map(|(i, n)| {
                let position = if self.normal_vertex_ids.is_empty() { i } else { self.normal_vertex_ids[i] };
                blend(skinning_point(position), [n[0], n[1], n[2], 0.0])
            })
            .collect();

        debug!("skinned {} positions and {} normals with {} influences",
               deformed_positions.len(), deformed_normals.len(), skin.len());

        Ok(Deformed { positions: deformed_positions, normals: deformed_normals })
    }

    fn check(&self, data: &SmoothSkinningData, positions: &[Vector3], normals: &[Vector3]) -> Result<()> {
        let op = self.name();
        if self.deformation_pose.len() != data.influence_count() {
            return Err(Error::validation(format!(
                "{}: {} deformation poses given for {} influences",
                op, self.deformation_pose.len(), data.influence_count())));
        }

        if self.reference_indices.is_empty() {
            if data.point_count() != positions.len() {
                return Err(Error::validation(format!(
                    "{}: the skinning data has {} points but {} positions are given",
                    op, data.point_count(), positions.len())));
            }
        } else {
            if self.reference_indices.len() != positions.len() {
                return Err(Error::validation(format!(
                    "{}: {} reference indices given for {} positions",
                    op, self.reference_indices.len(), positions.len())));
            }
            if let Some(&r) = self.reference_indices.iter().find(|&&r| r >= data.point_count()) {
                return Err(Error::validation(format!(
                    "{}: reference index {} is outside the {} points of the skinning data",
                    op, r, data.point_count())));
            }
        }

        if normals.is_empty() {
            return Ok(());
        }
        if self.normal_vertex_ids.is_empty() {
            if normals.len() != positions.len() {
                return Err(Error::validation(format!(
                    "{}: {} normals given for {} positions", op, normals.len(), positions.len())));
            }
        } else {
            if self.normal_vertex_ids.len() != normals.len() {
                return Err(Error::validation(format!(
                    "{}: {} normal vertex ids given for {} normals",
                    op, self.normal_vertex_ids.len(), normals.len())));
            }
            if let Some(&v) = self.normal_vertex_ids.iter().find(|&&v| v >= positions.len()) {
                return Err(Error::validation(format!(
                    "{}: normal vertex id {} is outside the {} positions", op, v, positions.len())));
            }
        }
        Ok(())
    }
}
