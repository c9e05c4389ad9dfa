use criterion::{Criterion, criterion_group, criterion_main};
use glam::Vec2;
use wolf_data::SurfaceSource;
use wolf_md3::builder::{RigidModelBuilder, SurfaceFrames, SurfaceSpec};
use wolf_md3::{ModelFormat, RigidModel, XyzNormal};

const FRAMES: usize = 40;
const VERTS: usize = 600;

fn create_test_model(format: ModelFormat) -> Vec<u8> {
    let vertex = |v: usize, f: usize| XyzNormal {
        xyz: [v as i16, (v * f) as i16 % 2048, f as i16],
        normal: (v * 37) as i16,
    };
    let frames = match format {
        ModelFormat::Md3 => SurfaceFrames::Md3(
            (0..FRAMES)
                .map(|f| (0..VERTS).map(|v| vertex(v, f)).collect())
                .collect(),
        ),
        ModelFormat::Mdc => SurfaceFrames::Mdc {
            base_frames: (0..FRAMES / 4)
                .map(|f| (0..VERTS).map(|v| vertex(v, f)).collect())
                .collect(),
            comp_frames: vec![vec![0x0080_7e81; VERTS]],
            frame_base: (0..FRAMES).map(|f| (f / 4) as i16).collect(),
            frame_comp: (0..FRAMES).map(|f| if f % 4 == 0 { -1 } else { 0 }).collect(),
        },
    };

    let mut builder = RigidModelBuilder::new(format).with_frame_count(FRAMES);
    for name in ["head", "hat", "eyes"] {
        builder = builder.add_surface(SurfaceSpec {
            name: name.to_string(),
            shaders: vec![format!("models/{name}.tga")],
            triangles: (0..VERTS as i32 - 2).map(|i| [i, i + 1, i + 2]).collect(),
            tex_coords: vec![Vec2::ZERO; VERTS],
            frames: frames.clone(),
        });
    }
    builder.build().unwrap()
}

fn bench_decode(c: &mut Criterion) {
    let md3 = create_test_model(ModelFormat::Md3);
    let mdc = create_test_model(ModelFormat::Mdc);

    c.bench_function("decode_md3", |b| {
        b.iter(|| RigidModel::load(&md3).unwrap())
    });
    c.bench_function("decode_mdc", |b| {
        b.iter(|| RigidModel::load(&mdc).unwrap())
    });
}

fn bench_render(c: &mut Criterion) {
    let model = RigidModel::load(&create_test_model(ModelFormat::Mdc)).unwrap();
    let mut draw_calls = model.allocate_draw_calls();

    c.bench_function("render_mdc_frame", |b| {
        let mut frame = 0;
        b.iter(|| {
            frame = (frame + 1) % FRAMES;
            model.render(frame, &mut draw_calls).unwrap();
        })
    });
}

criterion_group!(benches, bench_decode, bench_render);
criterion_main!(benches);
