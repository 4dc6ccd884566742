//! Animation Instance Tests
//!
//! Tests for:
//! - Transform decompose / compose / blend (including NaN clamping)
//! - Keyframe bracketing and pose blending over the clip timeline
//! - Loop wrapping, inverse playback and speed scaling
//! - Blend-begin duration rules and clip end detection
//! - Hierarchy resolution and the skinning pass

use std::sync::Arc;

use glam::{Mat4, Quat, Vec3};

use skelmesh::animation::{AnimSetting, SkeletonInstance};
use skelmesh::resources::{
    AnimClip, Mesh, PoseSample, SharedSkeleton, Skeleton, SkeletonNode, Transform, Vertex,
    VertexFormat, VertexInfluence,
};

const EPSILON: f32 = 1e-5;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn approx_vec3(a: Vec3, b: Vec3) -> bool {
    approx(a.x, b.x) && approx(a.y, b.y) && approx(a.z, b.z)
}

fn translation(x: f32, y: f32, z: f32) -> Transform {
    Transform::new(Quat::IDENTITY, Vec3::ONE, Vec3::new(x, y, z))
}

/// Single-joint resource with one clip: T(0,0,0) at key time 1.0 blending to
/// T(10,0,0) at key time 2.0. Clip duration is 2.0 with blend-begin set.
fn one_joint_resource() -> Arc<SharedSkeleton> {
    let mut root = SkeletonNode::new("root", None, Mat4::IDENTITY);
    root.is_joint = true;

    let clip = AnimClip {
        pose_samples: vec![PoseSample {
            node: 0,
            times: vec![1.0, 2.0],
            transforms: vec![translation(0.0, 0.0, 0.0), translation(10.0, 0.0, 0.0)],
        }],
    };

    Arc::new(SharedSkeleton {
        skeleton: Some(Skeleton { nodes: vec![root] }),
        meshes: Vec::new(),
        clips: vec![clip],
        bounding: None,
    })
}

// ============================================================================
// Transform
// ============================================================================

#[test]
fn transform_compose_decompose_round_trip() {
    let original = Transform::new(
        Quat::from_rotation_y(0.7),
        Vec3::new(2.0, 2.0, 2.0),
        Vec3::new(1.0, -3.0, 5.0),
    );

    let back = Transform::from_mat4(&original.to_mat4());
    assert!(approx_vec3(back.translation, original.translation));
    assert!(approx_vec3(back.scale, original.scale));
    assert!(back.rotation.dot(original.rotation).abs() > 1.0 - EPSILON);
}

#[test]
fn transform_from_degenerate_matrix_has_no_nan() {
    let t = Transform::from_mat4(&Mat4::ZERO);

    assert!(t.translation.is_finite());
    assert!(t.scale.is_finite());
    assert!(t.rotation.is_finite());
    // Unit quaternion invariant survives the clamp.
    assert!(approx(t.rotation.length(), 1.0));
}

#[test]
fn transform_blend_midpoint() {
    let a = translation(0.0, 0.0, 0.0);
    let b = Transform::new(
        Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
        Vec3::ONE,
        Vec3::new(10.0, 0.0, 0.0),
    );

    let mid = a.blend(&b, 0.5);
    assert!(approx_vec3(mid.translation, Vec3::new(5.0, 0.0, 0.0)));

    let quarter_turn = Quat::from_rotation_z(std::f32::consts::FRAC_PI_4);
    assert!(mid.rotation.dot(quarter_turn).abs() > 1.0 - EPSILON);
}

// ============================================================================
// Clip binding
// ============================================================================

#[test]
fn set_anim_computes_duration_from_last_key() {
    let mut instance = SkeletonInstance::new(one_joint_resource());
    instance.set_anim(AnimSetting::looped(0)).unwrap();

    assert!(approx(instance.duration(), 2.0));
    assert!(approx(instance.time(), 0.0));
}

#[test]
fn set_anim_without_blend_begin_ends_at_second_to_last_key() {
    let mut instance = SkeletonInstance::new(one_joint_resource());
    let setting = AnimSetting {
        is_blend_begin: false,
        ..AnimSetting::looped(0)
    };
    instance.set_anim(setting).unwrap();

    assert!(approx(instance.duration(), 1.0));
}

#[test]
fn set_anim_rejects_out_of_range_clip() {
    let mut instance = SkeletonInstance::new(one_joint_resource());
    assert!(instance.set_anim(AnimSetting::looped(5)).is_err());
}

#[test]
fn set_anim_resets_time() {
    let mut instance = SkeletonInstance::new(one_joint_resource());
    instance.set_anim(AnimSetting::looped(0)).unwrap();
    instance.add_time(0.7);
    assert!(instance.time() > 0.0);

    instance.set_anim(AnimSetting::looped(0)).unwrap();
    assert!(approx(instance.time(), 0.0));
}

// ============================================================================
// Bracketing and blending
// ============================================================================

#[test]
fn pose_blends_over_key_window() {
    let mut instance = SkeletonInstance::new(one_joint_resource());
    instance.set_anim(AnimSetting::looped(0)).unwrap();

    // First window runs from time 0 to the first key time.
    instance.add_time(0.5);
    let pose = instance.node_local_pose(0);
    assert!(approx_vec3(pose.translation, Vec3::new(5.0, 0.0, 0.0)));
}

#[test]
fn pose_at_key_time_is_exact() {
    let mut instance = SkeletonInstance::new(one_joint_resource());
    instance.set_anim(AnimSetting::looped(0)).unwrap();

    instance.add_time(1.0);
    let pose = instance.node_local_pose(0);
    assert!(approx_vec3(pose.translation, Vec3::new(10.0, 0.0, 0.0)));
}

#[test]
fn blend_begin_wraps_last_key_toward_first() {
    let mut instance = SkeletonInstance::new(one_joint_resource());
    instance.set_anim(AnimSetting::looped(0)).unwrap();

    // Past the last key the pose heads back to the first transform.
    instance.add_time(1.5);
    let pose = instance.node_local_pose(0);
    assert!(approx_vec3(pose.translation, Vec3::new(5.0, 0.0, 0.0)));
}

#[test]
fn set_time_percent_hits_both_ends() {
    let mut instance = SkeletonInstance::new(one_joint_resource());
    instance.set_anim(AnimSetting::looped(0)).unwrap();

    instance.set_time_percent(0.0);
    assert!(approx_vec3(
        instance.node_local_pose(0).translation,
        Vec3::ZERO
    ));

    instance.set_time_percent(1.0);
    assert!(approx_vec3(
        instance.node_local_pose(0).translation,
        Vec3::new(10.0, 0.0, 0.0)
    ));
    assert!(approx(instance.time_percent(), 1.0));
}

#[test]
fn looping_blend_begin_clip_closes_the_loop() {
    // A track starting at time zero: jumping to 0% and to 100% of the
    // duration must land on the same pose, so a wrapping loop has no seam.
    let mut root = SkeletonNode::new("root", None, Mat4::IDENTITY);
    root.is_joint = true;

    let clip = AnimClip {
        pose_samples: vec![PoseSample {
            node: 0,
            times: vec![0.0, 1.0],
            transforms: vec![translation(0.0, 0.0, 0.0), translation(10.0, 0.0, 0.0)],
        }],
    };

    let resource = Arc::new(SharedSkeleton {
        skeleton: Some(Skeleton { nodes: vec![root] }),
        meshes: Vec::new(),
        clips: vec![clip],
        bounding: None,
    });

    let mut instance = SkeletonInstance::new(resource);
    instance.set_anim(AnimSetting::looped(0)).unwrap();

    instance.set_time_percent(0.0);
    let start = *instance.node_local_pose(0);
    instance.set_time_percent(1.0);
    let end = *instance.node_local_pose(0);

    assert!(approx_vec3(start.translation, end.translation));
    assert!(start.rotation.dot(end.rotation).abs() > 1.0 - EPSILON);
}

// ============================================================================
// Time advance
// ============================================================================

#[test]
fn looping_clip_wraps_time() {
    let mut instance = SkeletonInstance::new(one_joint_resource());
    instance.set_anim(AnimSetting::looped(0)).unwrap();

    assert!(instance.add_time(2.5));
    assert!(approx(instance.time(), 0.5));
    assert!(!instance.is_anim_end());
}

#[test]
fn inverse_playback_wraps_backwards() {
    let mut instance = SkeletonInstance::new(one_joint_resource());
    let setting = AnimSetting {
        is_inverse: true,
        ..AnimSetting::looped(0)
    };
    instance.set_anim(setting).unwrap();

    instance.add_time(0.5);
    assert!(approx(instance.time(), 1.5));
}

#[test]
fn speed_rate_scales_delta() {
    let mut instance = SkeletonInstance::new(one_joint_resource());
    let setting = AnimSetting {
        speed_rate: 2.0,
        ..AnimSetting::looped(0)
    };
    instance.set_anim(setting).unwrap();

    instance.add_time(0.25);
    assert!(approx(instance.time(), 0.5));
}

#[test]
fn non_looping_clip_ends_and_stops_updating() {
    let mut instance = SkeletonInstance::new(one_joint_resource());
    instance.set_anim(AnimSetting::once(0)).unwrap();

    assert!(instance.add_time(1.5));
    assert!(!instance.is_anim_end());

    // Crossing the end still refreshes the pose once, pinned at the final
    // keyframe.
    assert!(instance.add_time(1.0));
    assert!(instance.is_anim_end());
    assert!(approx_vec3(
        instance.node_local_pose(0).translation,
        Vec3::new(10.0, 0.0, 0.0)
    ));

    // Afterwards the pose is stable and no further work is reported.
    assert!(!instance.add_time(0.1));
}

#[test]
fn add_time_without_setting_is_inert() {
    let mut instance = SkeletonInstance::new(one_joint_resource());
    assert!(!instance.add_time(1.0));
    assert!(approx(instance.time(), 0.0));
}

#[test]
fn cancel_loop_lets_clip_finish() {
    let mut instance = SkeletonInstance::new(one_joint_resource());
    instance.set_anim(AnimSetting::looped(0)).unwrap();
    instance.cancel_loop();

    instance.add_time(2.5);
    assert!(instance.is_anim_end());
}

// ============================================================================
// Hierarchy and palette
// ============================================================================

#[test]
fn child_inherits_animated_parent_global() {
    let mut root = SkeletonNode::new("root", None, Mat4::IDENTITY);
    root.is_joint = true;
    let mut child = SkeletonNode::new(
        "child",
        Some(0),
        Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0)),
    );
    child.is_joint = true;

    let clip = AnimClip {
        pose_samples: vec![PoseSample {
            node: 0,
            times: vec![1.0],
            transforms: vec![translation(10.0, 0.0, 0.0)],
        }],
    };

    let resource = Arc::new(SharedSkeleton {
        skeleton: Some(Skeleton {
            nodes: vec![root, child],
        }),
        meshes: Vec::new(),
        clips: vec![clip],
        bounding: None,
    });

    let mut instance = SkeletonInstance::new(resource);
    instance.set_anim(AnimSetting::looped(0)).unwrap();
    instance.add_time(0.0);

    // Root is animated; the child holds its rest transform underneath it.
    let child_global = instance.node_global_matrix(1);
    let origin = child_global.transform_point3(Vec3::ZERO);
    assert!(approx_vec3(origin, Vec3::new(10.0, 1.0, 0.0)));
}

#[test]
fn palette_applies_inverse_bind_pose_for_joints() {
    let mut root = SkeletonNode::new("root", None, Mat4::IDENTITY);
    root.is_joint = true;
    root.inverse_bind_pose = Mat4::from_translation(Vec3::new(-1.0, 0.0, 0.0));

    let resource = Arc::new(SharedSkeleton {
        skeleton: Some(Skeleton { nodes: vec![root] }),
        meshes: Vec::new(),
        clips: Vec::new(),
        bounding: None,
    });

    let mut instance = SkeletonInstance::new(resource);
    instance.update_pose();

    let palette = instance.node_matrix_palette(0);
    let moved = palette.transform_point3(Vec3::ZERO);
    assert!(approx_vec3(moved, Vec3::new(-1.0, 0.0, 0.0)));
}

// ============================================================================
// Skinning
// ============================================================================

fn pos_tex_vertex(pos: Vec3, influences: &[VertexInfluence]) -> Vertex {
    let floats = [pos.x, pos.y, pos.z, 0.0, 0.0];
    Vertex {
        data: bytemuck::cast_slice(&floats).to_vec(),
        influences: smallvec::SmallVec::from_slice(influences),
    }
}

fn read_position(buffer: &[u8], vertex_idx: usize, vertex_size: usize) -> Vec3 {
    let start = vertex_idx * vertex_size;
    let p: [f32; 3] = bytemuck::pod_read_unaligned(&buffer[start..start + 12]);
    Vec3::from_array(p)
}

#[test]
fn skinning_moves_weighted_vertices_and_keeps_unweighted() {
    let mut root = SkeletonNode::new("root", None, Mat4::IDENTITY);
    root.is_joint = true;

    let mut mesh = Mesh::new(VertexFormat::PosTex);
    mesh.vertices.push(pos_tex_vertex(
        Vec3::new(1.0, 2.0, 3.0),
        &[VertexInfluence {
            node: 0,
            weight: 1.0,
        }],
    ));
    mesh.vertices
        .push(pos_tex_vertex(Vec3::new(4.0, 5.0, 6.0), &[]));

    let clip = AnimClip {
        pose_samples: vec![PoseSample {
            node: 0,
            times: vec![1.0],
            transforms: vec![translation(10.0, 0.0, 0.0)],
        }],
    };

    let resource = Arc::new(SharedSkeleton {
        skeleton: Some(Skeleton { nodes: vec![root] }),
        meshes: vec![mesh],
        clips: vec![clip],
        bounding: None,
    });

    let mut instance = SkeletonInstance::new(resource);
    instance.set_anim(AnimSetting::looped(0)).unwrap();
    instance.add_time(0.0);

    let mut buffer = vec![0u8; instance.vertex_buffer_len()];
    let written = instance.fill_vertex_buffer(&mut buffer);
    assert_eq!(written, 2);

    let size = VertexFormat::PosTex.vertex_size();
    assert!(approx_vec3(
        read_position(&buffer, 0, size),
        Vec3::new(11.0, 2.0, 3.0)
    ));
    // No influences: rest position passes through untouched.
    assert!(approx_vec3(
        read_position(&buffer, 1, size),
        Vec3::new(4.0, 5.0, 6.0)
    ));
}

#[test]
fn skinning_at_rest_pose_is_identity() {
    let mut root = SkeletonNode::new("root", None, Mat4::IDENTITY);
    root.is_joint = true;

    let mut mesh = Mesh::new(VertexFormat::PosTex);
    mesh.vertices.push(pos_tex_vertex(
        Vec3::new(1.0, 2.0, 3.0),
        &[VertexInfluence {
            node: 0,
            weight: 1.0,
        }],
    ));

    let resource = Arc::new(SharedSkeleton {
        skeleton: Some(Skeleton { nodes: vec![root] }),
        meshes: vec![mesh],
        clips: Vec::new(),
        bounding: None,
    });

    let mut instance = SkeletonInstance::new(resource);
    instance.update_pose();

    let mut buffer = vec![0u8; instance.vertex_buffer_len()];
    instance.fill_vertex_buffer(&mut buffer);

    let size = VertexFormat::PosTex.vertex_size();
    assert!(approx_vec3(
        read_position(&buffer, 0, size),
        Vec3::new(1.0, 2.0, 3.0)
    ));
}

#[test]
fn skinning_blends_two_joint_influences() {
    let mut a = SkeletonNode::new("a", None, Mat4::IDENTITY);
    a.is_joint = true;
    let mut b = SkeletonNode::new("b", None, Mat4::IDENTITY);
    b.is_joint = true;

    let mut mesh = Mesh::new(VertexFormat::PosTex);
    mesh.vertices.push(pos_tex_vertex(
        Vec3::ZERO,
        &[
            VertexInfluence {
                node: 0,
                weight: 0.5,
            },
            VertexInfluence {
                node: 1,
                weight: 0.5,
            },
        ],
    ));

    // Joint a moves two units along x; joint b stays at rest.
    let clip = AnimClip {
        pose_samples: vec![PoseSample {
            node: 0,
            times: vec![1.0],
            transforms: vec![translation(2.0, 0.0, 0.0)],
        }],
    };

    let resource = Arc::new(SharedSkeleton {
        skeleton: Some(Skeleton { nodes: vec![a, b] }),
        meshes: vec![mesh],
        clips: vec![clip],
        bounding: None,
    });

    let mut instance = SkeletonInstance::new(resource);
    instance.set_anim(AnimSetting::looped(0)).unwrap();
    instance.add_time(0.0);

    let mut buffer = vec![0u8; instance.vertex_buffer_len()];
    instance.fill_vertex_buffer(&mut buffer);

    let size = VertexFormat::PosTex.vertex_size();
    assert!(approx_vec3(
        read_position(&buffer, 0, size),
        Vec3::new(1.0, 0.0, 0.0)
    ));
}
