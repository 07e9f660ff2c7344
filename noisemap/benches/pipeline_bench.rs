use criterion::{black_box, criterion_group, criterion_main, Criterion};
use noisemap::prelude::*;
use noisemap::{Floorplan, PowerTrace, Region};

const GRID: usize = 40;

/// A GRID x GRID floorplan over a 1000 x 1000 netlist with one current
/// source and one inductor per grid cell.
fn synthetic_inputs() -> RunInputs {
    let cell = 25.0;
    let mut regions = Vec::new();
    let mut columns = Vec::new();
    for i in 0..GRID {
        for j in 0..GRID {
            let name = format!("u{}_{}", i, j);
            regions.push(Region::from_placement(
                name.clone(),
                name.clone(),
                cell,
                cell,
                i as f64 * cell,
                j as f64 * cell,
            ));
            columns.push((name, (0..64).map(|c| ((c + i + j) % 7) as f64).collect()));
        }
    }

    let mut text = String::from("R0 n0_0_0 n0_1000_1000 1\n");
    for i in 0..GRID {
        for j in 0..GRID {
            let (x, y) = (i as f64 * 25.0 + 12.5, j as f64 * 25.0 + 12.5);
            text.push_str(&format!("I{}_{} n1_{}_{} 0 PULSE(0 1 0 0 0 0 0)\n", i, j, x, y));
            text.push_str(&format!("L{}_{} n2_{}_{} n3_{}_{} 1n\n", i, j, x, y, x, y));
        }
    }

    RunInputs {
        floorplan: regions.into_iter().collect::<Floorplan>(),
        power_trace: PowerTrace::from_columns(columns),
        netlist: Netlist::parse(&text),
    }
}

fn bench_run(c: &mut Criterion) {
    let inputs = synthetic_inputs();
    let options = MapOptions::default();

    c.bench_function("run_pipeline", |b| {
        b.iter(|| NoiseMapCore::run(black_box(inputs.clone()), black_box(&options)));
    });
}

fn bench_waveforms(c: &mut Criterion) {
    let inputs = synthetic_inputs();
    let options = MapOptions::default();

    c.bench_function("synthesize_waveforms", |b| {
        b.iter(|| NoiseMapCore::waveforms(black_box(&inputs.power_trace), black_box(&options)));
    });
}

criterion_group!(benches, bench_run, bench_waveforms);
criterion_main!(benches);
