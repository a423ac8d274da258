use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use raman_identify::data::loader::write_spectrum;
use raman_identify::Spectrum;

/// Write a small synthetic reference library plus noisy samples.
#[derive(Debug, Parser)]
struct Cli {
    /// Output directory; `library/` and `samples/` are created inside it
    #[arg(default_value = "sample_data")]
    out_dir: PathBuf,
}

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

fn generate_intensities(
    wavenumbers: &[f64],
    peaks: &[(f64, f64, f64)],
    baseline: f64,
    noise_level: f64,
    noise: &mut Noise,
) -> Vec<f64> {
    wavenumbers
        .iter()
        .map(|&wn| {
            let signal: f64 = peaks
                .iter()
                .map(|&(mu, sigma, amp)| gaussian(wn, mu, sigma, amp))
                .sum();
            baseline + signal + noise.normal(noise_level)
        })
        .collect()
}

/// Deterministic detector noise: a SplitMix64 stream fed through the
/// Marsaglia polar method. The spare normal deviate is kept for the next call.
struct Noise {
    counter: u64,
    spare: Option<f64>,
}

impl Noise {
    const GOLDEN_GAMMA: u64 = 0x9e37_79b9_7f4a_7c15;

    fn seeded(seed: u64) -> Self {
        Noise {
            counter: seed,
            spare: None,
        }
    }

    fn next_bits(&mut self) -> u64 {
        self.counter = self.counter.wrapping_add(Self::GOLDEN_GAMMA);
        let mut z = self.counter;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    /// Uniform on `[-1, 1)`.
    fn symmetric_unit(&mut self) -> f64 {
        (self.next_bits() >> 11) as f64 / (1u64 << 52) as f64 - 1.0
    }

    fn normal(&mut self, std_dev: f64) -> f64 {
        if let Some(z) = self.spare.take() {
            return std_dev * z;
        }
        loop {
            let (u, v) = (self.symmetric_unit(), self.symmetric_unit());
            let s = u * u + v * v;
            if s > 0.0 && s < 1.0 {
                let factor = (-2.0 * s.ln() / s).sqrt();
                self.spare = Some(v * factor);
                return std_dev * u * factor;
            }
        }
    }
}

fn write_csv(dir: &Path, spectrum: &Spectrum) -> Result<()> {
    let path = dir.join(format!("{}.csv", spectrum.name()));
    let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    write_spectrum(BufWriter::new(file), spectrum)
        .with_context(|| format!("writing {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut noise = Noise::seeded(42);

    // Wavenumbers: 200 → 2197, step 1 (cm⁻¹)
    let wavenumbers: Vec<f64> = (0..1998).map(|i| 200.0 + i as f64).collect();

    // (centre cm⁻¹, sigma cm⁻¹, amplitude counts)
    let compounds: Vec<(&str, Vec<(f64, f64, f64)>)> = vec![
        ("Acetone", vec![(787.0, 6.0, 4000.0), (1710.0, 8.0, 1500.0)]),
        ("Cyclohexane", vec![(801.0, 5.0, 5000.0), (1028.0, 5.0, 2000.0), (1444.0, 7.0, 1800.0)]),
        ("Ethanol", vec![(882.0, 7.0, 3500.0), (1052.0, 6.0, 1200.0), (1454.0, 8.0, 1500.0)]),
    ];

    let library_dir = cli.out_dir.join("library");
    let sample_dir = cli.out_dir.join("samples");
    fs::create_dir_all(&library_dir).context("creating library directory")?;
    fs::create_dir_all(&sample_dir).context("creating samples directory")?;

    for (name, peaks) in &compounds {
        let clean = generate_intensities(&wavenumbers, peaks, 200.0, 5.0, &mut noise);
        write_csv(&library_dir, &Spectrum::new(*name, wavenumbers.clone(), clean)?)?;

        // samples: shifted by up to a few cm⁻¹, weaker, noisier
        for (k, shift) in [-2.0, 0.0, 3.0].into_iter().enumerate() {
            let shifted: Vec<(f64, f64, f64)> = peaks
                .iter()
                .map(|&(mu, sigma, amp)| (mu + shift, sigma, amp * 0.4))
                .collect();
            let noisy = generate_intensities(&wavenumbers, &shifted, 150.0, 15.0, &mut noise);
            let sample_name = format!("{name}_sample_{k}");
            write_csv(&sample_dir, &Spectrum::new(sample_name, wavenumbers.clone(), noisy)?)?;
        }
    }

    println!(
        "Wrote {} reference spectra and {} samples ({} wavenumbers each) to {}",
        compounds.len(),
        compounds.len() * 3,
        wavenumbers.len(),
        cli.out_dir.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noise_is_reproducible_and_roughly_standard() {
        let mut a = Noise::seeded(7);
        let mut b = Noise::seeded(7);
        let draws: Vec<f64> = (0..20_000).map(|_| a.normal(2.0)).collect();
        assert!(draws.iter().all(|&x| x == b.normal(2.0)));

        let mean = draws.iter().sum::<f64>() / draws.len() as f64;
        let var = draws.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / draws.len() as f64;
        assert!(mean.abs() < 0.1, "mean {mean}");
        assert!((var.sqrt() - 2.0).abs() < 0.1, "std dev {}", var.sqrt());
    }
}
