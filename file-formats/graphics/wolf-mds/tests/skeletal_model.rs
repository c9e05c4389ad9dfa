use std::f32::consts::FRAC_PI_2;

use glam::{Mat3, Vec2, Vec3};
use pretty_assertions::assert_eq;
use wolf_data::{DataError, SurfaceSource};
use wolf_mds::builder::{BonePose, BoneSpec, FramePose, MdsBuilder, SurfaceSpec, VertexSpec, WeightSpec};
use wolf_mds::{BoneFlags, FrameInfo, MdsError, SkeletalModel, Skeleton};

const EPSILON: f32 = 0.01;

fn assert_close(actual: Vec3, expected: Vec3) {
    assert!(
        (actual - expected).length() < EPSILON,
        "expected {expected:?}, got {actual:?}"
    );
}

fn yaw(degrees: f32) -> BonePose {
    BonePose::new(Vec3::new(0.0, degrees, 0.0), Vec2::ZERO)
}

fn heading(degrees: f32) -> BonePose {
    BonePose::new(Vec3::ZERO, Vec2::new(0.0, degrees))
}

/// Root at the frame's parent offset with a head bone ten units forward.
fn head_model(head: BoneSpec, torso_parent: i32) -> MdsBuilder {
    MdsBuilder::new("models/players/test/body.mds")
        .with_torso_parent(torso_parent)
        .add_bone(BoneSpec::new("root", None, 0.0))
        .add_bone(head)
        .add_frame(FramePose::new(
            Vec3::new(0.0, 0.0, 20.0),
            vec![BonePose::default(); 2],
        ))
        .add_tag("tag_head", 1)
}

fn load(builder: &MdsBuilder) -> SkeletalModel {
    SkeletalModel::load(&builder.build().unwrap()).unwrap()
}

fn weight(bone: usize, weight: f32, offset: Vec3) -> WeightSpec {
    WeightSpec {
        bone,
        weight,
        offset,
    }
}

fn vertex(weights: Vec<WeightSpec>) -> VertexSpec {
    VertexSpec {
        normal: Vec3::Z,
        tex_coord: Vec2::new(0.25, 0.75),
        weights,
    }
}

#[test]
fn test_tag_head_fixture() {
    let model = load(&head_model(BoneSpec::new("tag_head", Some(0), 10.0), 0));

    let (index, transform) = model
        .lerp_tag("tag_head", &FrameInfo::single(0), 0)
        .unwrap()
        .unwrap();
    assert_eq!(index, 0);
    assert_close(transform.position, Vec3::new(10.0, 0.0, 20.0));
    assert_close(transform.rotation.col(0), Vec3::X);
}

#[test]
fn test_missing_tag_is_none() {
    let model = load(&head_model(BoneSpec::new("tag_head", Some(0), 10.0), 0));
    assert_eq!(model.lerp_tag("tag_weapon", &FrameInfo::single(0), 0).unwrap(), None);
    assert_eq!(model.lerp_tag("tag_head", &FrameInfo::single(0), 1).unwrap(), None);
}

#[test]
fn test_full_torso_rotation_turns_around_torso_parent() {
    let turn = FrameInfo::single(0).with_torso_rotation(Mat3::from_rotation_z(FRAC_PI_2));

    for flags in [BoneFlags::empty(), BoneFlags::TAG] {
        let head = BoneSpec::new("tag_head", Some(0), 10.0)
            .with_torso_weight(1.0)
            .with_flags(flags);
        let model = load(&head_model(head, 0));

        let (_, transform) = model.lerp_tag("tag_head", &turn, 0).unwrap().unwrap();
        assert_close(transform.position, Vec3::new(0.0, 10.0, 20.0));
        assert_close(transform.rotation.col(0), Vec3::Y);
    }
}

#[test]
fn test_partial_torso_rotation_matches_for_tag_and_mesh_bones() {
    let turn = FrameInfo::single(0).with_torso_rotation(Mat3::from_rotation_z(FRAC_PI_2));

    let positions: Vec<Vec3> = [BoneFlags::empty(), BoneFlags::TAG]
        .into_iter()
        .map(|flags| {
            let head = BoneSpec::new("tag_head", Some(0), 10.0)
                .with_torso_weight(0.5)
                .with_flags(flags);
            let model = load(&head_model(head, 0));
            model.lerp_tag("tag_head", &turn, 0).unwrap().unwrap().1.position
        })
        .collect();

    assert_close(positions[0], Vec3::new(5.0, 5.0, 20.0));
    assert_close(positions[1], positions[0]);
}

#[test]
fn test_torso_parent_outside_chain_pivots_on_origin() {
    let builder = MdsBuilder::new("pivot")
        .with_torso_parent(2)
        .add_bone(BoneSpec::new("root", None, 0.0))
        .add_bone(BoneSpec::new("tag_head", Some(0), 10.0).with_torso_weight(1.0))
        .add_bone(BoneSpec::new("legs", Some(0), 5.0))
        .add_frame(FramePose::new(
            Vec3::new(0.0, 0.0, 20.0),
            vec![BonePose::default(); 3],
        ))
        .add_tag("tag_head", 1);
    let model = load(&builder);

    let turn = FrameInfo::single(0).with_torso_rotation(Mat3::from_rotation_z(FRAC_PI_2));
    let (_, transform) = model.lerp_tag("tag_head", &turn, 0).unwrap().unwrap();
    assert_close(transform.position, Vec3::new(0.0, 10.0, 20.0));
}

#[test]
fn test_bad_torso_parent_fails_only_for_torso_bones() {
    let plain = load(&head_model(BoneSpec::new("tag_head", Some(0), 10.0), 9));
    assert!(plain.lerp_tag("tag_head", &FrameInfo::single(0), 0).is_ok());

    let torso = load(&head_model(
        BoneSpec::new("tag_head", Some(0), 10.0).with_torso_weight(0.5),
        9,
    ));
    assert!(matches!(
        torso.lerp_tag("tag_head", &FrameInfo::single(0), 0),
        Err(MdsError::TorsoParentOutOfRange { index: 9, count: 2 })
    ));
}

#[test]
fn test_partial_torso_weight_blends_channels() {
    let builder = MdsBuilder::new("blend")
        .add_bone(BoneSpec::new("root", None, 0.0))
        .add_bone(BoneSpec::new("spine", Some(0), 10.0).with_torso_weight(0.5))
        .add_frame(FramePose::new(Vec3::ZERO, vec![BonePose::default(); 2]))
        .add_frame(FramePose::new(
            Vec3::ZERO,
            vec![
                BonePose::default(),
                BonePose::new(Vec3::new(0.0, 90.0, 0.0), Vec2::new(0.0, 90.0)),
            ],
        ));
    let model = load(&builder);

    let info = FrameInfo::single(0).with_torso(1, 1, 0.0);
    let skeleton = Skeleton::evaluate(&model, &info, &[0, 1]).unwrap();
    let spine = skeleton.bone(1).unwrap();

    assert_close(spine.position, Vec3::new(5.0, 5.0, 0.0));
    let half = std::f32::consts::FRAC_1_SQRT_2;
    assert_close(spine.rotation.col(0), Vec3::new(half, half, 0.0));
}

#[test]
fn test_full_torso_weight_follows_blended_torso_channel() {
    let builder = MdsBuilder::new("torso")
        .with_torso_parent(0)
        .add_bone(BoneSpec::new("root", None, 0.0))
        .add_bone(BoneSpec::new("spine", Some(0), 10.0).with_torso_weight(1.0))
        .add_frame(FramePose::new(Vec3::ZERO, vec![BonePose::default(); 2]))
        .add_frame(FramePose::new(
            Vec3::ZERO,
            vec![
                BonePose::default(),
                BonePose::new(Vec3::new(0.0, 90.0, 0.0), Vec2::new(0.0, 90.0)),
            ],
        ))
        .add_frame(FramePose::new(
            Vec3::ZERO,
            vec![
                BonePose::default(),
                BonePose::new(Vec3::new(0.0, -60.0, 0.0), Vec2::new(0.0, -60.0)),
            ],
        ));
    let model = load(&builder);

    // The body channel points the spine elsewhere; only the torso blend counts.
    let info = FrameInfo::blend(2, 0, 0.25).with_torso(1, 0, 0.5);
    let skeleton = Skeleton::evaluate(&model, &info, &[0, 1]).unwrap();
    let spine = skeleton.bone(1).unwrap();

    assert_close(spine.position, Vec3::new(5.0, 5.0, 0.0));
    let half = std::f32::consts::FRAC_1_SQRT_2;
    assert_close(spine.rotation.col(0), Vec3::new(half, half, 0.0));
}

#[test]
fn test_angle_blend_wraps_through_zero() {
    let builder = MdsBuilder::new("wrap")
        .add_bone(BoneSpec::new("root", None, 0.0))
        .add_frame(FramePose::new(Vec3::ZERO, vec![yaw(350.0)]))
        .add_frame(FramePose::new(Vec3::ZERO, vec![yaw(10.0)]));
    let model = load(&builder);

    let skeleton = Skeleton::evaluate(&model, &FrameInfo::blend(1, 0, 0.5), &[0]).unwrap();
    let forward = skeleton.bone(0).unwrap().rotation.col(0);
    assert!((forward - Vec3::X).length() < 1e-3, "forward is {forward:?}");
}

#[test]
fn test_root_offset_and_direction_blend() {
    let builder = MdsBuilder::new("lerp")
        .add_bone(BoneSpec::new("root", None, 0.0))
        .add_bone(BoneSpec::new("arm", Some(0), 4.0))
        .add_frame(FramePose::new(Vec3::ZERO, vec![BonePose::default(), heading(0.0)]))
        .add_frame(FramePose::new(
            Vec3::new(0.0, 0.0, 10.0),
            vec![BonePose::default(), heading(90.0)],
        ));
    let model = load(&builder);

    let skeleton = Skeleton::evaluate(&model, &FrameInfo::blend(1, 0, 0.25), &[0, 1]).unwrap();
    assert_close(skeleton.bone(0).unwrap().position, Vec3::new(0.0, 0.0, 2.5));
    // Directions blend linearly, without renormalising.
    assert_close(
        skeleton.bone(1).unwrap().position,
        Vec3::new(0.0, 0.0, 2.5) + Vec3::new(0.75, 0.25, 0.0) * 4.0,
    );
}

#[test]
fn test_identical_frames_ignore_lerp() {
    let builder = MdsBuilder::new("guard")
        .add_bone(BoneSpec::new("root", None, 0.0))
        .add_bone(BoneSpec::new("arm", Some(0), 4.0))
        .add_frame(FramePose::new(Vec3::ZERO, vec![yaw(30.0), heading(45.0)]))
        .add_frame(FramePose::new(Vec3::ONE, vec![yaw(-70.0), heading(10.0)]));
    let model = load(&builder);

    let reference = Skeleton::evaluate(&model, &FrameInfo::single(1), &[0, 1]).unwrap();
    for lerp in [0.0, 0.3, 0.9] {
        let skeleton = Skeleton::evaluate(&model, &FrameInfo::blend(1, 1, lerp), &[0, 1]).unwrap();
        assert_eq!(skeleton, reference);
    }
}

#[test]
fn test_evaluation_is_idempotent() {
    let builder = MdsBuilder::new("repeat")
        .with_torso_parent(0)
        .add_bone(BoneSpec::new("root", None, 0.0))
        .add_bone(BoneSpec::new("spine", Some(0), 6.0).with_torso_weight(0.7))
        .add_frame(FramePose::new(Vec3::ZERO, vec![yaw(12.0), heading(33.0)]))
        .add_frame(FramePose::new(Vec3::Z, vec![yaw(-100.0), heading(-20.0)]));
    let model = load(&builder);

    let info = FrameInfo::blend(1, 0, 0.37)
        .with_torso(0, 1, 0.8)
        .with_torso_rotation(Mat3::from_rotation_z(0.4));
    let first = Skeleton::evaluate(&model, &info, &[0, 1]).unwrap();
    let second = Skeleton::evaluate(&model, &info, &[0, 1]).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_only_referenced_chain_is_evaluated() {
    let builder = MdsBuilder::new("partial")
        .add_bone(BoneSpec::new("root", None, 0.0))
        .add_bone(BoneSpec::new("spine", Some(0), 1.0))
        .add_bone(BoneSpec::new("leg", Some(0), 1.0))
        .add_frame(FramePose::new(Vec3::ZERO, vec![BonePose::default(); 3]));
    let model = load(&builder);

    let skeleton = Skeleton::evaluate(&model, &FrameInfo::single(0), &[1]).unwrap();
    assert_eq!(skeleton.computed_count(), 2);
    assert!(skeleton.bone(0).is_some());
    assert!(skeleton.bone(2).is_none());
    assert_eq!(model.bone_chain(2).unwrap(), vec![0, 2]);
}

#[test]
fn test_out_of_range_queries_are_errors() {
    let model = load(&head_model(BoneSpec::new("tag_head", Some(0), 10.0), 0));

    assert!(matches!(
        Skeleton::evaluate(&model, &FrameInfo::single(0), &[0, 7]),
        Err(MdsError::BoneOutOfRange { index: 7, count: 2 })
    ));
    assert!(matches!(
        Skeleton::evaluate(&model, &FrameInfo::blend(0, 3, 0.5), &[0]),
        Err(MdsError::FrameOutOfRange { frame: 3, count: 1 })
    ));
    assert!(matches!(
        model.lerp_tag("tag_head", &FrameInfo::single(1), 0),
        Err(MdsError::FrameOutOfRange { .. })
    ));
}

#[test]
fn test_tags_named_returns_every_match() {
    let builder = head_model(BoneSpec::new("hand", Some(0), 10.0), 0)
        .add_tag("tag_weapon", 0)
        .add_tag("tag_weapon", 1);
    let model = load(&builder);

    let info = FrameInfo::single(0);
    let found: Vec<usize> = model
        .tags_named("tag_weapon", &info)
        .map(|r| r.unwrap().0)
        .collect();
    assert_eq!(found, vec![1, 2]);
}

fn skinned_builder() -> MdsBuilder {
    let quad = SurfaceSpec {
        name: "body".into(),
        shader: "models/players/test/body.tga".into(),
        triangles: vec![[0, 1, 2], [0, 2, 3]],
        vertices: vec![
            vertex(vec![
                weight(0, 0.5, Vec3::new(1.0, 0.0, 0.0)),
                weight(1, 0.5, Vec3::ZERO),
            ]),
            vertex(vec![weight(1, 1.0, Vec3::new(0.0, 2.0, 0.0))]),
            vertex(vec![
                weight(0, 0.25, Vec3::ZERO),
                weight(0, 0.25, Vec3::ZERO),
                weight(1, 0.5, Vec3::ZERO),
            ]),
            vertex(vec![weight(0, 1.0, Vec3::ZERO)]),
        ],
        ..SurfaceSpec::default()
    };
    let belt = SurfaceSpec {
        name: "belt".into(),
        triangles: vec![[0, 0, 0]],
        vertices: vec![vertex(vec![weight(0, 1.0, Vec3::Z)])],
        ..SurfaceSpec::default()
    };
    head_model(BoneSpec::new("tag_head", Some(0), 10.0), 0)
        .add_surface(quad)
        .add_surface(belt.clone())
        .add_surface(SurfaceSpec {
            name: "hat".into(),
            ..belt
        })
}

#[test]
fn test_variable_length_vertices_decode() {
    let model = load(&skinned_builder());

    let body = model.surface(0).unwrap();
    let counts: Vec<usize> = body.vertices.iter().map(|v| v.weights.len()).collect();
    assert_eq!(counts, vec![2, 1, 3, 1]);
    assert_eq!(body.bone_refs, vec![0, 1]);
    assert_eq!(body.collapse_map, vec![0, 1, 2, 3]);
    assert_eq!(body.shader, "models/players/test/body.tga");
    assert_eq!(model.surface_vertex_count(0), 4);
    assert_eq!(model.surface_triangle_count(0), 2);
    assert_eq!(model.surface_vertex_count(9), 0);
}

#[test]
fn test_surface_chain_ends_at_declared_end() {
    let bytes = skinned_builder().build().unwrap();
    let model = SkeletalModel::load(&bytes).unwrap();

    assert_eq!(model.surface_count(), 3);
    assert_eq!(model.surface_chain_end(), model.header().ofs_end);
    assert_eq!(model.surface_chain_end(), bytes.len());
}

#[test]
fn test_render_skins_weighted_positions() {
    let model = load(&skinned_builder());
    let mut draw_calls = model.allocate_draw_calls();
    model.render(&FrameInfo::single(0), &mut draw_calls).unwrap();

    let body = &draw_calls[0];
    let position = |i: usize| Vec3::from_array(body.vertices[i].position);
    assert_close(position(0), Vec3::new(5.5, 0.0, 20.0));
    assert_close(position(1), Vec3::new(10.0, 2.0, 20.0));
    assert_close(position(2), Vec3::new(5.0, 0.0, 20.0));
    assert_close(position(3), Vec3::new(0.0, 0.0, 20.0));
    assert_eq!(body.vertices[1].normal, [0.0, 0.0, 1.0]);
    assert_eq!(body.vertices[1].tex_coord, [0.25, 0.75]);
    assert_eq!(body.indices, vec![0, 1, 2, 0, 2, 3]);

    assert_close(Vec3::from_array(draw_calls[2].vertices[0].position), Vec3::new(0.0, 0.0, 21.0));
}

#[test]
fn test_render_rejects_mis_sized_draw_calls() {
    let model = load(&skinned_builder());
    let mut draw_calls = model.allocate_draw_calls();
    draw_calls[1].vertices.push(Default::default());

    assert!(matches!(
        model.render(&FrameInfo::single(0), &mut draw_calls),
        Err(MdsError::Data(DataError::BufferSizeMismatch { .. }))
    ));
    assert!(matches!(
        model.render(&FrameInfo::single(4), &mut model.allocate_draw_calls()),
        Err(MdsError::FrameOutOfRange { .. })
    ));
}

#[test]
fn test_weight_outside_bone_references_rejected() {
    let builder = head_model(BoneSpec::new("tag_head", Some(0), 10.0), 0).add_surface(SurfaceSpec {
        name: "loose".into(),
        vertices: vec![vertex(vec![weight(1, 1.0, Vec3::ZERO)])],
        bone_refs: vec![0],
        ..SurfaceSpec::default()
    });
    assert!(matches!(
        SkeletalModel::load(&builder.build().unwrap()),
        Err(MdsError::CorruptModel(_))
    ));
}

#[test]
fn test_parent_cycle_rejected() {
    let builder = MdsBuilder::new("cycle")
        .add_bone(BoneSpec::new("a", Some(1), 1.0))
        .add_bone(BoneSpec::new("b", Some(0), 1.0))
        .add_frame(FramePose::new(Vec3::ZERO, vec![BonePose::default(); 2]));
    assert!(matches!(
        SkeletalModel::load(&builder.build().unwrap()),
        Err(MdsError::CorruptModel(_))
    ));
}

#[test]
fn test_truncated_file_rejected() {
    let bytes = skinned_builder().build().unwrap();
    for len in [8, 100, 300, bytes.len() - 1] {
        assert!(SkeletalModel::load(&bytes[..len]).is_err(), "loaded {len} bytes");
    }
}

#[test]
fn test_surface_count_past_end_of_file_rejected() {
    let mut bytes = skinned_builder().build().unwrap();
    // num_surfaces
    bytes[100..104].copy_from_slice(&i32::MAX.to_le_bytes());

    assert!(SkeletalModel::load(&bytes).is_err());
}

#[test]
fn test_zero_frames_rejected() {
    let builder = MdsBuilder::new("empty").add_bone(BoneSpec::new("root", None, 0.0));
    assert!(matches!(
        SkeletalModel::load(&builder.build().unwrap()),
        Err(MdsError::NoFrames)
    ));
}

#[test]
fn test_load_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("body.mds");
    skinned_builder().write_to_file(&path).unwrap();

    let model = SkeletalModel::load_path(&path).unwrap();
    assert_eq!(model.name(), "models/players/test/body.mds");
    assert_eq!(model.bone_count(), 2);
    assert_eq!(model.find_bone("tag_head"), Some(1));

    assert!(matches!(
        SkeletalModel::load_path(dir.path().join("missing.mds")),
        Err(MdsError::Io(_))
    ));
}
