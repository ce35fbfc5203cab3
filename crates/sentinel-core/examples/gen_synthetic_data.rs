//! Generate synthetic train/test Parquet files for exercising the
//! train → detect pipeline without a real ECG dataset.
//!
//! Usage: cargo run -p sentinel-core --example gen_synthetic_data -- data/

use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use dataset::{DatasetWriter, SampleLabel, SampleRecord};

const WIDTH: usize = 140;

/// A smooth cycle: one sine period with mild amplitude/phase jitter.
fn normal_sample(rng: &mut StdRng) -> SampleRecord {
    let amplitude = 1.0 + rng.gen_range(-0.1..0.1);
    let phase = rng.gen_range(-0.2..0.2);
    let values = (0..WIDTH)
        .map(|i| {
            let t = i as f32 / WIDTH as f32 * std::f32::consts::TAU;
            amplitude * (t + phase).sin() + rng.gen_range(-0.05..0.05)
        })
        .collect();
    SampleRecord {
        values,
        label: SampleLabel::Normal,
    }
}

/// A distorted cycle: inflated amplitude plus a high-frequency component.
fn anomalous_sample(rng: &mut StdRng) -> SampleRecord {
    let amplitude = 2.5 + rng.gen_range(0.0..0.5);
    let values = (0..WIDTH)
        .map(|i| {
            let t = i as f32 / WIDTH as f32 * std::f32::consts::TAU;
            amplitude * t.sin() + 0.8 * (t * 9.0).sin() + rng.gen_range(-0.1..0.1)
        })
        .collect();
    SampleRecord {
        values,
        label: SampleLabel::Anomalous,
    }
}

fn write_file(
    path: &Path,
    normal: usize,
    anomalous: usize,
    rng: &mut StdRng,
) -> anyhow::Result<()> {
    let mut writer = DatasetWriter::new(path.to_path_buf());
    for _ in 0..normal {
        writer.record(normal_sample(rng));
    }
    for _ in 0..anomalous {
        writer.record(anomalous_sample(rng));
    }
    writer.finish()?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let out_dir = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "data".to_string());
    let out_dir = Path::new(&out_dir);
    std::fs::create_dir_all(out_dir)?;

    let mut rng = StdRng::seed_from_u64(140);

    write_file(&out_dir.join("train.parquet"), 400, 100, &mut rng)?;
    write_file(&out_dir.join("test.parquet"), 80, 40, &mut rng)?;

    println!(
        "Wrote {} and {}",
        out_dir.join("train.parquet").display(),
        out_dir.join("test.parquet").display()
    );
    Ok(())
}
