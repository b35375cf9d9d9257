use criterion::{Criterion, criterion_group, criterion_main};
use jbig2_generic::{
    ArithmeticDecoder, DecodeStatus, GenericRegionDecoder, GenericRegionParams, NeverPause,
    ProgressiveDecoder, Template,
};
use std::hint::black_box;

const WIDTH: u32 = 1024;
const HEIGHT: u32 = 256;

/// Coded data long enough for a `WIDTH` x `HEIGHT` region.
fn coded_data() -> Vec<u8> {
    let mut state = 0x2545_F491_u32;
    (0..WIDTH as usize * HEIGHT as usize)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            // Keep clear of marker codes.
            (state as u8) & 0x7F
        })
        .collect()
}

fn bench_paths(c: &mut Criterion) {
    let data = coded_data();

    for template in [
        Template::Template0,
        Template::Template1,
        Template::Template2,
        Template::Template3,
    ] {
        let mut group = c.benchmark_group(format!("{template:?}"));

        for general in [false, true] {
            let name = if general { "general" } else { "optimized" };

            group.bench_function(name, |b| {
                b.iter(|| {
                    let params = GenericRegionParams::new(WIDTH, HEIGHT, template);
                    let mut contexts = params.new_contexts();
                    let mut decoder = GenericRegionDecoder::new(params);
                    if general {
                        decoder = decoder.force_general_path();
                    }

                    decoder
                        .decode_arith(ArithmeticDecoder::new(black_box(&data)), &mut contexts)
                        .unwrap()
                });
            });
        }

        group.finish();
    }
}

fn bench_progressive(c: &mut Criterion) {
    let data = coded_data();

    c.bench_function("progressive_every_row", |b| {
        b.iter(|| {
            let params = GenericRegionParams::new(WIDTH, HEIGHT, Template::Template0)
                .with_typical_prediction(true);
            let mut contexts = params.new_contexts();
            let mut source = ArithmeticDecoder::new(black_box(&data));
            let mut decoder = ProgressiveDecoder::new(params);
            let mut pause = || true;

            let mut status = decoder.start_decode_arith(&mut source, &mut contexts, &mut pause);
            while status == DecodeStatus::ToBeContinued {
                status = decoder.continue_decode(&mut source, &mut contexts, &mut pause);
            }

            status
        });
    });

    c.bench_function("progressive_no_pause", |b| {
        b.iter(|| {
            let params = GenericRegionParams::new(WIDTH, HEIGHT, Template::Template0)
                .with_typical_prediction(true);
            let mut contexts = params.new_contexts();
            let mut source = ArithmeticDecoder::new(black_box(&data));
            let mut decoder = ProgressiveDecoder::new(params);

            decoder.start_decode_arith(&mut source, &mut contexts, &mut NeverPause)
        });
    });
}

criterion_group!(benches, bench_paths, bench_progressive);
criterion_main!(benches);
