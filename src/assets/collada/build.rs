//! Assembly of a parsed document into a [`SharedSkeleton`].
//!
//! This is where the loose element records become the validated runtime
//! resource: one skeleton picked among the scene's candidates, one skinned
//! mesh per controller, one clip per animation.

use log::warn;

use crate::errors::{Result, SkelError};
use crate::resources::clip::{AnimClip, PoseSample};
use crate::resources::mesh::{Mesh, Vertex, VertexFormat, VertexInfluence};
use crate::resources::shared::SharedSkeleton;
use crate::resources::skeleton::{Skeleton, SkeletonNode};

use super::document::{
    ColladaDocument, GeometryMesh, Semantic, SkinData, Source, TriangleList,
};

// ============================================================================
// Options
// ============================================================================

/// How to choose the skeleton when the scene instances several.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SkeletonPick {
    /// The candidate with the most nodes among those referenced by skins.
    /// Ties go to document order.
    #[default]
    MostNodes,
    /// The first candidate in document order.
    First,
    /// The candidate whose root node has this name.
    Named(String),
}

/// Import-time knobs.
#[derive(Debug, Clone, Default)]
pub struct ImportOptions<'a> {
    pub skeleton_pick: SkeletonPick,
    /// When set, every imported animation is cut into consecutive sections
    /// of these keyframe counts, each section becoming its own clip with
    /// times rebased to start at zero.
    pub sections: Option<&'a [usize]>,
}

impl ColladaDocument {
    /// Assembles the runtime resource.
    ///
    /// With skins present, one skeleton is picked per `options`, every skin
    /// becomes a skinned mesh bound to it, and every animation becomes a
    /// clip (or several, when sectioned). Without skins the document is
    /// treated as static geometry: every geometry becomes an unskinned mesh
    /// and the skeleton and clip lists stay empty.
    pub fn create_shared_skeleton(&self, options: &ImportOptions) -> Result<SharedSkeleton> {
        let mut shared = SharedSkeleton::default();

        if self.skins.is_empty() || self.skeletons.is_empty() {
            for geometry in &self.geometries {
                match build_mesh(geometry, None)? {
                    Some(mesh) => shared.meshes.push(mesh),
                    None => warn!("geometry '{}' has no triangles, skipped", geometry.id),
                }
            }
            if shared.meshes.is_empty() {
                return Err(SkelError::MalformedDocument(
                    "document contains no usable geometry".into(),
                ));
            }
            shared.compute_bounding();
            return Ok(shared);
        }

        let candidate = self.pick_skeleton(&options.skeleton_pick)?;
        let mut skeleton = build_skeleton(candidate);

        for skin in &self.skins {
            let Some(geometry) = self.geometries.iter().find(|g| g.id == skin.geometry) else {
                return Err(SkelError::InvalidResource(format!(
                    "skin '{}' references missing geometry '{}'",
                    skin.id, skin.geometry
                )));
            };

            let joint_to_node = resolve_joints(skin, candidate)?;

            // A binding makes the node a joint even if the exporter left its
            // type untagged.
            for (joint_idx, &node_idx) in joint_to_node.iter().enumerate() {
                let node = &mut skeleton.nodes[node_idx];
                node.is_joint = true;
                node.inverse_bind_pose = skin.inverse_binds[joint_idx];
            }

            let ctx = SkinContext {
                skin,
                joint_to_node: &joint_to_node,
            };

            match build_mesh(geometry, Some(&ctx))? {
                Some(mesh) => shared.meshes.push(mesh),
                None => warn!("geometry '{}' has no triangles, skipped", geometry.id),
            }
        }

        for animation in &self.animations {
            let mut clip = AnimClip::default();
            for channel in &animation.channels {
                let Some(node) = skeleton.find_node(&channel.target_node) else {
                    warn!(
                        "animation channel targets '{}', not in the skeleton; skipped",
                        channel.target_node
                    );
                    continue;
                };
                clip.pose_samples.push(PoseSample {
                    node,
                    times: channel.times.clone(),
                    transforms: channel.transforms.clone(),
                });
            }
            if clip.pose_samples.is_empty() {
                warn!("animation has no channels matching the skeleton, skipped");
                continue;
            }

            match options.sections {
                None => shared.clips.push(clip),
                Some(frames) => shared.clips.extend(split_clip(&clip, frames)),
            }
        }

        shared.skeleton = Some(skeleton);
        shared.compute_bounding();
        shared.validate()?;
        Ok(shared)
    }

    fn pick_skeleton(&self, pick: &SkeletonPick) -> Result<&super::document::SkeletonCandidate> {
        let referenced: Vec<_> = self
            .skeletons
            .iter()
            .filter(|c| {
                self.skins
                    .iter()
                    .any(|s| s.skeleton_root.as_deref() == Some(c.root.as_str()))
            })
            .collect();
        let pool = if referenced.is_empty() {
            self.skeletons.iter().collect()
        } else {
            referenced
        };

        match pick {
            SkeletonPick::MostNodes => {
                // Strict comparison keeps the first candidate on ties.
                let mut best: Option<&super::document::SkeletonCandidate> = None;
                for c in pool {
                    if best.is_none_or(|b| c.nodes.len() > b.nodes.len()) {
                        best = Some(c);
                    }
                }
                best.ok_or_else(|| {
                    SkelError::MalformedDocument("no skeleton candidates".into())
                })
            }
            SkeletonPick::First => pool
                .into_iter()
                .next()
                .ok_or_else(|| SkelError::MalformedDocument("no skeleton candidates".into())),
            SkeletonPick::Named(name) => pool
                .into_iter()
                .find(|c| c.root == *name)
                .ok_or_else(|| {
                    SkelError::InvalidResource(format!("no skeleton rooted at '{name}'"))
                }),
        }
    }
}

fn build_skeleton(candidate: &super::document::SkeletonCandidate) -> Skeleton {
    let mut skeleton = Skeleton::default();
    for record in &candidate.nodes {
        let mut node = SkeletonNode::new(record.name.clone(), record.parent, record.transform);
        node.is_joint = record.is_joint;
        skeleton.nodes.push(node);
    }
    skeleton
}

/// Maps each of the skin's joint names to a skeleton node index. Joints
/// refer to nodes by `sid` first, falling back to the node name for
/// exporters that omit sids. A name with no match is a dangling reference.
fn resolve_joints(
    skin: &SkinData,
    candidate: &super::document::SkeletonCandidate,
) -> Result<Vec<usize>> {
    skin.joint_names
        .iter()
        .map(|joint_name| {
            candidate
                .nodes
                .iter()
                .position(|n| n.sid.as_deref() == Some(joint_name.as_str()))
                .or_else(|| candidate.nodes.iter().position(|n| n.name == *joint_name))
                .ok_or_else(|| {
                    SkelError::InvalidResource(format!(
                        "skin '{}' binds joint '{joint_name}' which is not in the skeleton",
                        skin.id
                    ))
                })
        })
        .collect()
}

// ============================================================================
// Mesh building
// ============================================================================

struct SkinContext<'a> {
    skin: &'a SkinData,
    /// Per joint-name-index node index in the skeleton.
    joint_to_node: &'a [usize],
}

struct ResolvedInput<'a> {
    semantic: Semantic,
    source: &'a Source,
    offset: usize,
    /// The VERTEX input carries positions and owns the skin influences.
    is_vertex: bool,
}

/// Builds one interleaved mesh from a geometry's triangle lists, optionally
/// attaching skin influences and baking the bind shape matrix into the
/// positions. `Ok(None)` when the geometry has no triangle data.
fn build_mesh(geometry: &GeometryMesh, ctx: Option<&SkinContext>) -> Result<Option<Mesh>> {
    let Some(first) = geometry.triangles.first() else {
        return Ok(None);
    };

    let format = detect_format(geometry, first)?;
    let mut mesh = Mesh::new(format);

    for tris in &geometry.triangles {
        append_triangles(&mut mesh, geometry, tris, ctx)?;
    }

    Ok(Some(mesh))
}

/// Maps the triangle list's input semantics onto a vertex layout. Position
/// is mandatory; the recognized combinations mirror the renderer's
/// interleaved formats.
fn detect_format(geometry: &GeometryMesh, tris: &TriangleList) -> Result<VertexFormat> {
    let mut has_pos = false;
    let mut has_normal = false;
    let mut has_tex = false;
    let mut has_color = false;

    for input in &tris.inputs {
        match input.semantic {
            Semantic::Vertex | Semantic::Position => has_pos = true,
            Semantic::Normal => has_normal = true,
            Semantic::Texcoord => has_tex = true,
            Semantic::Color => has_color = true,
            _ => {}
        }
    }

    match (has_pos, has_normal, has_tex, has_color) {
        (true, true, true, true) => Ok(VertexFormat::PosNormalTexColor),
        (true, true, true, false) => Ok(VertexFormat::PosNormalTex),
        (true, true, false, false) => Ok(VertexFormat::PosNormal),
        (true, false, true, false) => Ok(VertexFormat::PosTex),
        _ => Err(SkelError::UnsupportedVertexLayout(format!(
            "geometry '{}': position={has_pos} normal={has_normal} \
             texcoord={has_tex} color={has_color}",
            geometry.id
        ))),
    }
}

/// Offset (in floats) of each field inside a vertex of `format`.
fn field_offset(format: VertexFormat, semantic: Semantic) -> Option<usize> {
    use VertexFormat::{PosNormal, PosNormalTex, PosNormalTexColor, PosTex};
    match (format, semantic) {
        (_, Semantic::Vertex | Semantic::Position) => Some(0),
        (PosNormal | PosNormalTex | PosNormalTexColor, Semantic::Normal) => Some(3),
        (PosTex, Semantic::Texcoord) => Some(3),
        (PosNormalTex | PosNormalTexColor, Semantic::Texcoord) => Some(6),
        (PosNormalTexColor, Semantic::Color) => Some(8),
        _ => None,
    }
}

fn field_float_count(semantic: Semantic) -> usize {
    match semantic {
        Semantic::Texcoord => 2,
        Semantic::Color => 4,
        _ => 3,
    }
}

fn append_triangles(
    mesh: &mut Mesh,
    geometry: &GeometryMesh,
    tris: &TriangleList,
    ctx: Option<&SkinContext>,
) -> Result<()> {
    // Resolve every input to its backing source, following the <vertices>
    // indirection for the VERTEX input.
    let mut inputs: Vec<ResolvedInput> = Vec::with_capacity(tris.inputs.len());
    for input in &tris.inputs {
        let (semantic, source_id, is_vertex) = if input.semantic == Semantic::Vertex {
            let Some(alias) = geometry.vertices.get(&input.source) else {
                return Err(SkelError::InvalidResource(format!(
                    "geometry '{}': VERTEX input references missing <vertices> '{}'",
                    geometry.id, input.source
                )));
            };
            (Semantic::Position, alias.source.as_str(), true)
        } else {
            (input.semantic, input.source.as_str(), false)
        };

        let Some(source) = geometry.sources.get(source_id) else {
            return Err(SkelError::InvalidResource(format!(
                "geometry '{}': input references missing source '{source_id}'",
                geometry.id
            )));
        };

        inputs.push(ResolvedInput {
            semantic,
            source,
            offset: input.offset,
            is_vertex,
        });
    }

    let vertex_num = tris.count * 3;
    if vertex_num == 0 {
        return Ok(());
    }
    let index_stride = tris.prims.len() / vertex_num;
    if index_stride == 0 || index_stride * vertex_num != tris.prims.len() {
        return Err(SkelError::InvalidResource(format!(
            "geometry '{}': {} indices for {} triangle vertices",
            geometry.id,
            tris.prims.len(),
            vertex_num
        )));
    }

    // The stride can exceed the largest recognized offset (unrecognized
    // input streams still occupy index slots), but never the reverse.
    if let Some(max_offset) = inputs.iter().map(|i| i.offset).max() {
        if max_offset >= index_stride {
            return Err(SkelError::InvalidResource(format!(
                "geometry '{}': input offset {max_offset} exceeds index stride {index_stride}",
                geometry.id
            )));
        }
    }

    let float_count = mesh.format.float_count();

    for i in 0..vertex_num {
        let mut floats = vec![0.0f32; float_count];
        let mut vertex = Vertex::default();

        for input in &inputs {
            let Some(field) = field_offset(mesh.format, input.semantic) else {
                continue;
            };
            let idx = tris.prims[i * index_stride + input.offset];

            let take = field_float_count(input.semantic).min(input.source.stride);
            let start = idx * input.source.stride;
            let Some(values) = input.source.floats.get(start..start + take) else {
                return Err(SkelError::InvalidResource(format!(
                    "geometry '{}': index {idx} out of bounds for source data",
                    geometry.id
                )));
            };
            floats[field..field + take].copy_from_slice(values);

            if input.is_vertex {
                if let Some(ctx) = ctx {
                    attach_influences(&mut vertex, ctx, idx)?;

                    let pos = glam::Vec3::new(floats[0], floats[1], floats[2]);
                    let pos = ctx.skin.bind_shape.transform_point3(pos);
                    floats[..3].copy_from_slice(&pos.to_array());
                }
            }
        }

        vertex.data = bytemuck::cast_slice(&floats).to_vec();
        let index = mesh.vertices.len() as u32;
        mesh.vertices.push(vertex);
        mesh.indices.push(index);
    }

    Ok(())
}

fn attach_influences(vertex: &mut Vertex, ctx: &SkinContext, position_idx: usize) -> Result<()> {
    let Some(pairs) = ctx.skin.vertex_weights.get(position_idx) else {
        return Err(SkelError::InvalidResource(format!(
            "skin '{}': no weight record for position index {position_idx}",
            ctx.skin.id
        )));
    };

    for &(joint, weight) in pairs {
        let Some(&node) = ctx.joint_to_node.get(joint) else {
            return Err(SkelError::InvalidResource(format!(
                "skin '{}': weight references joint index {joint} beyond the joint list",
                ctx.skin.id
            )));
        };
        vertex.influences.push(VertexInfluence {
            node: node as u32,
            weight,
        });
    }
    Ok(())
}

// ============================================================================
// Clip sectioning
// ============================================================================

/// Cuts one imported clip into consecutive keyframe sections. Each section's
/// track is rebased so its first sample time is zero; tracks shorter than
/// the section's start are left out of that section.
fn split_clip(clip: &AnimClip, frames: &[usize]) -> Vec<AnimClip> {
    let mut out = Vec::with_capacity(frames.len());
    let mut start = 0;

    for &count in frames {
        let mut section = AnimClip::default();

        for sample in &clip.pose_samples {
            if start >= sample.times.len() || count == 0 {
                continue;
            }
            let end = (start + count).min(sample.times.len());
            let base = sample.times[start];

            section.pose_samples.push(PoseSample {
                node: sample.node,
                times: sample.times[start..end].iter().map(|t| t - base).collect(),
                transforms: sample.transforms[start..end].to_vec(),
            });
        }

        if section.pose_samples.is_empty() {
            warn!("animation section starting at frame {start} is empty, skipped");
        } else {
            out.push(section);
        }
        start += count;
    }

    out
}
