//! Flat binary codec for [`SharedSkeleton`].
//!
//! The layout is a field-by-field little-endian dump in write order, with
//! length prefixes for every list and a presence byte for the optional
//! skeleton and bounding sphere. Floats round-trip bit-exactly. There is no
//! version tag; the format changes in lockstep with the resource model.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use glam::{Mat4, Quat, Vec3};
use log::info;
use smallvec::SmallVec;

use crate::errors::{Result, SkelError};
use crate::resources::clip::{AnimClip, PoseSample};
use crate::resources::mesh::{Mesh, Vertex, VertexFormat, VertexInfluence};
use crate::resources::shared::{BoundingSphere, SharedSkeleton};
use crate::resources::skeleton::{Skeleton, SkeletonNode};
use crate::resources::transform::Transform;

// ============================================================================
// Entry points
// ============================================================================

pub fn save_shared_skeleton(shared: &SharedSkeleton, mut out: impl Write) -> Result<()> {
    write_option(&mut out, shared.skeleton.as_ref(), write_skeleton)?;

    write_u32(&mut out, shared.meshes.len() as u32)?;
    for mesh in &shared.meshes {
        write_mesh(&mut out, mesh)?;
    }

    write_u32(&mut out, shared.clips.len() as u32)?;
    for clip in &shared.clips {
        write_clip(&mut out, clip)?;
    }

    write_option(&mut out, shared.bounding.as_ref(), |out, b| {
        write_vec3(out, b.center)?;
        write_f32(out, b.radius)
    })?;

    Ok(())
}

pub fn load_shared_skeleton(mut input: impl Read) -> Result<SharedSkeleton> {
    let skeleton = read_option(&mut input, read_skeleton)?;

    let mesh_count = read_u32(&mut input)? as usize;
    let mut meshes = Vec::with_capacity(mesh_count.min(1024));
    for _ in 0..mesh_count {
        meshes.push(read_mesh(&mut input)?);
    }

    let clip_count = read_u32(&mut input)? as usize;
    let mut clips = Vec::with_capacity(clip_count.min(1024));
    for _ in 0..clip_count {
        clips.push(read_clip(&mut input)?);
    }

    let bounding = read_option(&mut input, |input| {
        Ok(BoundingSphere {
            center: read_vec3(input)?,
            radius: read_f32(input)?,
        })
    })?;

    let shared = SharedSkeleton {
        skeleton,
        meshes,
        clips,
        bounding,
    };
    shared.validate()?;
    Ok(shared)
}

pub fn save_shared_skeleton_file(path: impl AsRef<Path>, shared: &SharedSkeleton) -> Result<()> {
    let path = path.as_ref();
    let out = BufWriter::new(File::create(path)?);
    save_shared_skeleton(shared, out)?;
    info!("saved skeleton resource to {}", path.display());
    Ok(())
}

pub fn load_shared_skeleton_file(path: impl AsRef<Path>) -> Result<SharedSkeleton> {
    let path = path.as_ref();
    let input = BufReader::new(File::open(path)?);
    let shared = load_shared_skeleton(input)?;
    info!("loaded skeleton resource from {}", path.display());
    Ok(shared)
}

// ============================================================================
// Record writers
// ============================================================================

fn write_skeleton(out: &mut impl Write, skeleton: &Skeleton) -> Result<()> {
    write_u32(out, skeleton.nodes.len() as u32)?;
    for node in &skeleton.nodes {
        write_string(out, &node.name)?;
        // Root sentinel is -1.
        let parent = node.parent.map_or(-1i32, |p| p as i32);
        out.write_all(&parent.to_le_bytes())?;
        write_mat4(out, &node.local_transform)?;
        write_mat4(out, &node.inverse_bind_pose)?;
        write_u8(out, u8::from(node.is_joint))?;
    }
    Ok(())
}

fn write_mesh(out: &mut impl Write, mesh: &Mesh) -> Result<()> {
    write_u8(out, format_tag(mesh.format))?;
    write_u32(out, mesh.vertex_size as u32)?;

    write_u32(out, mesh.vertices.len() as u32)?;
    for vertex in &mesh.vertices {
        out.write_all(&vertex.data)?;
        write_u32(out, vertex.influences.len() as u32)?;
        for influence in &vertex.influences {
            write_u32(out, influence.node)?;
            write_f32(out, influence.weight)?;
        }
    }

    write_u32(out, mesh.indices.len() as u32)?;
    for &index in &mesh.indices {
        write_u32(out, index)?;
    }
    Ok(())
}

fn write_clip(out: &mut impl Write, clip: &AnimClip) -> Result<()> {
    write_u32(out, clip.pose_samples.len() as u32)?;
    for sample in &clip.pose_samples {
        write_u32(out, sample.node as u32)?;

        write_u32(out, sample.times.len() as u32)?;
        for &t in &sample.times {
            write_f32(out, t)?;
        }

        write_u32(out, sample.transforms.len() as u32)?;
        for transform in &sample.transforms {
            write_transform(out, transform)?;
        }
    }
    Ok(())
}

fn write_transform(out: &mut impl Write, t: &Transform) -> Result<()> {
    let q = t.rotation;
    write_f32(out, q.x)?;
    write_f32(out, q.y)?;
    write_f32(out, q.z)?;
    write_f32(out, q.w)?;
    write_vec3(out, t.scale)?;
    write_vec3(out, t.translation)
}

// ============================================================================
// Record readers
// ============================================================================

fn read_skeleton(input: &mut impl Read) -> Result<Skeleton> {
    let node_count = read_u32(input)? as usize;
    let mut skeleton = Skeleton::default();

    for idx in 0..node_count {
        let name = read_string(input)?;

        let mut buf = [0u8; 4];
        input.read_exact(&mut buf)?;
        let parent_raw = i32::from_le_bytes(buf);
        let parent = if parent_raw < 0 {
            None
        } else {
            let parent = parent_raw as usize;
            if parent >= idx {
                return Err(SkelError::BinaryDecode(format!(
                    "node {idx} has parent index {parent}; parents must precede children"
                )));
            }
            Some(parent)
        };

        let local_transform = read_mat4(input)?;
        let inverse_bind_pose = read_mat4(input)?;
        let is_joint = read_u8(input)? != 0;

        let mut node = SkeletonNode::new(name, parent, local_transform);
        node.inverse_bind_pose = inverse_bind_pose;
        node.is_joint = is_joint;
        skeleton.nodes.push(node);
    }

    Ok(skeleton)
}

fn read_mesh(input: &mut impl Read) -> Result<Mesh> {
    let format = format_from_tag(read_u8(input)?)?;
    let vertex_size = read_u32(input)? as usize;
    if vertex_size != format.vertex_size() {
        return Err(SkelError::BinaryDecode(format!(
            "mesh vertex size {vertex_size} disagrees with format ({} expected)",
            format.vertex_size()
        )));
    }

    let mut mesh = Mesh::new(format);

    let vertex_count = read_u32(input)? as usize;
    mesh.vertices.reserve(vertex_count.min(65536));
    for _ in 0..vertex_count {
        let mut data = vec![0u8; vertex_size];
        input.read_exact(&mut data)?;

        let influence_count = read_u32(input)? as usize;
        let mut influences = SmallVec::new();
        for _ in 0..influence_count {
            influences.push(VertexInfluence {
                node: read_u32(input)?,
                weight: read_f32(input)?,
            });
        }

        mesh.vertices.push(Vertex { data, influences });
    }

    let index_count = read_u32(input)? as usize;
    mesh.indices.reserve(index_count.min(65536));
    for _ in 0..index_count {
        mesh.indices.push(read_u32(input)?);
    }

    Ok(mesh)
}

fn read_clip(input: &mut impl Read) -> Result<AnimClip> {
    let sample_count = read_u32(input)? as usize;
    let mut clip = AnimClip::default();

    for _ in 0..sample_count {
        let node = read_u32(input)? as usize;

        let time_count = read_u32(input)? as usize;
        let mut times = Vec::with_capacity(time_count.min(65536));
        for _ in 0..time_count {
            times.push(read_f32(input)?);
        }

        let transform_count = read_u32(input)? as usize;
        let mut transforms = Vec::with_capacity(transform_count.min(65536));
        for _ in 0..transform_count {
            transforms.push(read_transform(input)?);
        }

        clip.pose_samples.push(PoseSample {
            node,
            times,
            transforms,
        });
    }

    Ok(clip)
}

fn read_transform(input: &mut impl Read) -> Result<Transform> {
    let x = read_f32(input)?;
    let y = read_f32(input)?;
    let z = read_f32(input)?;
    let w = read_f32(input)?;
    let scale = read_vec3(input)?;
    let translation = read_vec3(input)?;
    Ok(Transform::new(Quat::from_xyzw(x, y, z, w), scale, translation))
}

// ============================================================================
// Primitive helpers
// ============================================================================

fn format_tag(format: VertexFormat) -> u8 {
    match format {
        VertexFormat::PosTex => 0,
        VertexFormat::PosNormal => 1,
        VertexFormat::PosNormalTex => 2,
        VertexFormat::PosNormalTexColor => 3,
    }
}

fn format_from_tag(tag: u8) -> Result<VertexFormat> {
    Ok(match tag {
        0 => VertexFormat::PosTex,
        1 => VertexFormat::PosNormal,
        2 => VertexFormat::PosNormalTex,
        3 => VertexFormat::PosNormalTexColor,
        other => {
            return Err(SkelError::BinaryDecode(format!(
                "unknown vertex format tag {other}"
            )));
        }
    })
}

fn write_option<W: Write, T>(
    out: &mut W,
    value: Option<&T>,
    write: impl FnOnce(&mut W, &T) -> Result<()>,
) -> Result<()> {
    match value {
        Some(value) => {
            write_u8(out, 1)?;
            write(out, value)
        }
        None => write_u8(out, 0),
    }
}

fn read_option<R: Read, T>(
    input: &mut R,
    read: impl FnOnce(&mut R) -> Result<T>,
) -> Result<Option<T>> {
    match read_u8(input)? {
        0 => Ok(None),
        1 => Ok(Some(read(input)?)),
        other => Err(SkelError::BinaryDecode(format!(
            "invalid presence byte {other}"
        ))),
    }
}

fn write_u8(out: &mut impl Write, v: u8) -> Result<()> {
    out.write_all(&[v])?;
    Ok(())
}

fn read_u8(input: &mut impl Read) -> Result<u8> {
    let mut buf = [0u8; 1];
    input.read_exact(&mut buf)?;
    Ok(buf[0])
}

fn write_u32(out: &mut impl Write, v: u32) -> Result<()> {
    out.write_all(&v.to_le_bytes())?;
    Ok(())
}

fn read_u32(input: &mut impl Read) -> Result<u32> {
    let mut buf = [0u8; 4];
    input.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn write_f32(out: &mut impl Write, v: f32) -> Result<()> {
    out.write_all(&v.to_le_bytes())?;
    Ok(())
}

fn read_f32(input: &mut impl Read) -> Result<f32> {
    let mut buf = [0u8; 4];
    input.read_exact(&mut buf)?;
    Ok(f32::from_le_bytes(buf))
}

fn write_vec3(out: &mut impl Write, v: Vec3) -> Result<()> {
    write_f32(out, v.x)?;
    write_f32(out, v.y)?;
    write_f32(out, v.z)
}

fn read_vec3(input: &mut impl Read) -> Result<Vec3> {
    Ok(Vec3::new(
        read_f32(input)?,
        read_f32(input)?,
        read_f32(input)?,
    ))
}

fn write_mat4(out: &mut impl Write, m: &Mat4) -> Result<()> {
    for v in m.to_cols_array() {
        write_f32(out, v)?;
    }
    Ok(())
}

fn read_mat4(input: &mut impl Read) -> Result<Mat4> {
    let mut vals = [0.0f32; 16];
    for v in &mut vals {
        *v = read_f32(input)?;
    }
    Ok(Mat4::from_cols_array(&vals))
}

fn write_string(out: &mut impl Write, s: &str) -> Result<()> {
    write_u32(out, s.len() as u32)?;
    out.write_all(s.as_bytes())?;
    Ok(())
}

fn read_string(input: &mut impl Read) -> Result<String> {
    let len = read_u32(input)? as usize;
    if len > 1 << 20 {
        return Err(SkelError::BinaryDecode(format!(
            "unreasonable string length {len}"
        )));
    }
    let mut buf = vec![0u8; len];
    input.read_exact(&mut buf)?;
    String::from_utf8(buf)
        .map_err(|_| SkelError::BinaryDecode("node name is not valid UTF-8".into()))
}
