use criterion::{Criterion, black_box, criterion_group, criterion_main};

use uiframe_core::math::{Rect, Vec2};
use uiframe_graphics::backend::{GeometryId, MaterialId};
use uiframe_graphics::graph::{CompositeOptions, DrawItem, GraphBuilder, LayerStack};
use uiframe_graphics::{
    BlendMode, Dictionary, DummyBackend, GeometryHandle, LayerHandle, PassKind, PassSequence,
    PassSettings, RenderConfig, RenderInterface, TextureId, Variant, Vertex,
};

const EXTERNALS: [TextureId; 2] = [TextureId(1), TextureId(2)];

fn item(i: usize) -> DrawItem {
    DrawItem {
        geometry: GeometryId(i as u64 % 16),
        translation: Vec2::new(i as f32, 0.0),
        material: MaterialId(1),
    }
}

/// `batches` render passes of `per_batch` draws, separated by scissor changes.
fn record_batches(seq: &mut PassSequence, batches: usize, per_batch: usize) {
    for b in 0..batches {
        let settings = PassSettings {
            scissor: Some(Rect::from_xywh(b as i32, 0, 64, 64)),
            ..Default::default()
        };
        for i in 0..per_batch {
            seq.queue_draw(PassKind::Render, &settings, item(i));
        }
    }
}

// ---------------------------------------------------------------------------
// Recording
// ---------------------------------------------------------------------------

fn bench_record_coalesced(c: &mut Criterion) {
    c.bench_function("pass_sequence_record_1024_draws_1_batch", |b| {
        let mut seq = PassSequence::new();
        b.iter(|| {
            seq.clear();
            record_batches(&mut seq, 1, 1024);
            black_box(&seq);
        });
    });
}

fn bench_record_layers(c: &mut Criterion) {
    c.bench_function("layer_stack_record_32_layers", |b| {
        let mut seq = PassSequence::new();
        let mut layers = LayerStack::new(true);
        b.iter(|| {
            seq.clear();
            layers.reset();
            for i in 0..32 {
                let top = layers.push(&mut seq);
                seq.queue_draw(PassKind::Render, &PassSettings::default(), item(i));
                layers.composite(
                    &mut seq,
                    top,
                    LayerHandle::ROOT,
                    &CompositeOptions::new(MaterialId(2)),
                    false,
                    |_| {},
                );
                layers.pop(&mut seq);
            }
            black_box(&seq);
        });
    });
}

// ---------------------------------------------------------------------------
// Population
// ---------------------------------------------------------------------------

fn bench_populate_steady(c: &mut Criterion) {
    c.bench_function("graph_populate_64_batches_steady_state", |b| {
        let mut backend = DummyBackend::new();
        let mut builder = GraphBuilder::new("Rml", 3);
        let mut seq = PassSequence::new();
        record_batches(&mut seq, 64, 16);
        builder
            .populate(&mut backend, &seq, &EXTERNALS, (1920, 1080))
            .unwrap();
        b.iter(|| {
            black_box(
                builder
                    .populate(&mut backend, &seq, &EXTERNALS, (1920, 1080))
                    .unwrap(),
            );
        });
    });
}

fn bench_populate_rebuild(c: &mut Criterion) {
    c.bench_function("graph_populate_64_batches_first_frame", |b| {
        let mut seq = PassSequence::new();
        record_batches(&mut seq, 64, 16);
        b.iter(|| {
            let mut backend = DummyBackend::new();
            let mut builder = GraphBuilder::new("Rml", 3);
            black_box(
                builder
                    .populate(&mut backend, &seq, &EXTERNALS, (1920, 1080))
                    .unwrap(),
            );
        });
    });
}

// ---------------------------------------------------------------------------
// Full frame
// ---------------------------------------------------------------------------

fn quad(ui: &mut RenderInterface<DummyBackend, DummyBackend>) -> GeometryHandle {
    let white = [255, 255, 255, 255];
    let vertices = [
        Vertex::new([0.0, 0.0], white, [0.0, 0.0]),
        Vertex::new([16.0, 0.0], white, [1.0, 0.0]),
        Vertex::new([0.0, 16.0], white, [0.0, 1.0]),
        Vertex::new([16.0, 16.0], white, [1.0, 1.0]),
    ];
    ui.compile_geometry(&vertices, &[0, 1, 2, 2, 1, 3]).unwrap()
}

fn bench_interface_frame(c: &mut Criterion) {
    c.bench_function("render_interface_frame_blurred_panels", |b| {
        let mut ui = RenderInterface::new(
            RenderConfig::default(),
            DummyBackend::new(),
            DummyBackend::new(),
            TextureId(1),
            TextureId(2),
            (1920, 1080),
        )
        .unwrap();
        let geometry = quad(&mut ui);
        let blur = ui
            .compile_filter("blur", &Dictionary::new().with("sigma", Variant::Float(6.0)))
            .unwrap();

        b.iter(|| {
            ui.begin_frame();
            for panel in 0..8 {
                for i in 0..32 {
                    ui.render_geometry(geometry, Vec2::new(i as f32 * 20.0, panel as f32), None);
                }
                let layer = ui.push_layer();
                ui.render_geometry(geometry, Vec2::new(0.0, panel as f32 * 100.0), None);
                ui.composite_layers(layer, LayerHandle::ROOT, BlendMode::Normal, &[blur]);
                ui.pop_layer();
            }
            black_box(ui.end_frame().unwrap());
        });
    });
}

criterion_group!(
    benches,
    bench_record_coalesced,
    bench_record_layers,
    bench_populate_steady,
    bench_populate_rebuild,
    bench_interface_frame,
);
criterion_main!(benches);
