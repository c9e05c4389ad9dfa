use criterion::{Criterion, criterion_group, criterion_main};
use glam::{Mat3, Vec2, Vec3};
use wolf_data::SurfaceSource;
use wolf_mds::builder::{BonePose, BoneSpec, FramePose, MdsBuilder, SurfaceSpec, VertexSpec, WeightSpec};
use wolf_mds::{FrameInfo, SkeletalModel, Skeleton};

const BONES: usize = 60;
const FRAMES: usize = 30;
const VERTS: usize = 800;

fn create_test_model() -> Vec<u8> {
    let mut builder = MdsBuilder::new("bench.mds").with_torso_parent(10);
    for b in 0..BONES {
        let parent = b.checked_sub(1).map(|p| p / 2);
        let bone = BoneSpec::new(format!("bone{b}"), parent, 3.0)
            .with_torso_weight(if b > 10 && b % 3 == 0 { 0.5 } else { 0.0 });
        builder = builder.add_bone(bone);
    }
    for f in 0..FRAMES {
        let poses = (0..BONES)
            .map(|b| {
                let t = (f * 7 + b * 13) as f32;
                BonePose::new(Vec3::new(t % 40.0, t % 360.0, 0.0), Vec2::new(t % 30.0, t % 90.0))
            })
            .collect();
        builder = builder.add_frame(FramePose::new(Vec3::new(0.0, 0.0, 24.0), poses));
    }
    builder = builder.add_tag("tag_head", BONES - 1);

    let vertices = (0..VERTS)
        .map(|v| VertexSpec {
            normal: Vec3::Z,
            tex_coord: Vec2::ZERO,
            weights: (0..3)
                .map(|w| WeightSpec {
                    bone: (v + w * 17) % BONES,
                    weight: 1.0 / 3.0,
                    offset: Vec3::new(w as f32, 1.0, 2.0),
                })
                .collect(),
        })
        .collect();
    builder
        .add_surface(SurfaceSpec {
            name: "body".into(),
            triangles: (0..VERTS as i32 - 2).map(|i| [i, i + 1, i + 2]).collect(),
            vertices,
            ..SurfaceSpec::default()
        })
        .build()
        .unwrap()
}

fn bench_evaluate(c: &mut Criterion) {
    let model = SkeletalModel::load(&create_test_model()).unwrap();
    let all: Vec<usize> = (0..BONES).collect();
    let info = FrameInfo::blend(5, 4, 0.3)
        .with_torso(9, 8, 0.6)
        .with_torso_rotation(Mat3::from_rotation_z(0.3));

    c.bench_function("evaluate_full_skeleton", |b| {
        b.iter(|| Skeleton::evaluate(&model, &info, &all).unwrap())
    });
    c.bench_function("lerp_tag_head", |b| {
        b.iter(|| model.lerp_tag("tag_head", &info, 0).unwrap())
    });
}

fn bench_render(c: &mut Criterion) {
    let model = SkeletalModel::load(&create_test_model()).unwrap();
    let mut draw_calls = model.allocate_draw_calls();

    c.bench_function("render_blended_frame", |b| {
        let mut frame = 0;
        b.iter(|| {
            frame = (frame + 1) % FRAMES;
            let info = FrameInfo::blend(frame, (frame + FRAMES - 1) % FRAMES, 0.5);
            model.render(&info, &mut draw_calls).unwrap();
        })
    });
}

criterion_group!(benches, bench_evaluate, bench_render);
criterion_main!(benches);
