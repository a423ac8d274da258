use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::Serialize;

use super::matcher::{check_fit_logged, Coordinate, Wavenumber};
use super::peaks::detect_peaks;
use crate::config::Config;
use crate::data::loader::load_spectrum;
use crate::data::model::Spectrum;
use crate::error::{IdentifyError, Result};

// ---------------------------------------------------------------------------
// PeakSet – the signature of one reference compound
// ---------------------------------------------------------------------------

/// Peak locations of one reference compound. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct PeakSet<C> {
    name: String,
    peaks: Vec<C>,
}

impl<C> PeakSet<C> {
    /// `None` when there are no peaks; such a compound could never match.
    pub fn new(name: impl Into<String>, peaks: Vec<C>) -> Option<Self> {
        if peaks.is_empty() {
            return None;
        }
        Some(Self {
            name: name.into(),
            peaks,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn peaks(&self) -> &[C] {
        &self.peaks
    }
}

/// The best-scoring compound for a sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identification {
    pub name: String,
    pub score: f64,
}

// ---------------------------------------------------------------------------
// Library
// ---------------------------------------------------------------------------

/// Reference compounds keyed by name, in the coordinate system `C`.
///
/// A library is built once and only read afterwards. To pick up new
/// reference files, build a new one and swap it in.
#[derive(Debug, Clone)]
pub struct Library<C = Wavenumber> {
    compounds: BTreeMap<String, PeakSet<C>>,
    config: Config,
}

impl<C: Coordinate> Library<C> {
    /// An empty library; see [`Library::add`].
    pub fn new(config: Config) -> Self {
        Self {
            compounds: BTreeMap::new(),
            config,
        }
    }

    /// Build a library from every reference file in `dir`.
    ///
    /// Files are visited in name order. Dot-files and files without the
    /// configured extension are ignored; files that cannot be read are
    /// logged and skipped. Fails if the directory cannot be listed or if no
    /// compound ends up in the library.
    pub fn from_dir(dir: &Path, config: Config) -> Result<Self> {
        let mut library = Self::new(config);
        for path in reference_files(dir, &library.config.extension)? {
            match load_spectrum(&path) {
                Ok(spectrum) => {
                    library.add(&spectrum);
                }
                Err(err) => warn!("skipping {}: {err}", path.display()),
            }
        }

        if library.is_empty() {
            return Err(IdentifyError::EmptyLibrary(dir.to_path_buf()));
        }
        info!(
            "loaded {} compounds from {}",
            library.len(),
            dir.display()
        );
        Ok(library)
    }

    /// Build a library from spectra already in memory. May be empty.
    pub fn from_spectra<'a>(spectra: impl IntoIterator<Item = &'a Spectrum>, config: Config) -> Self {
        let mut library = Self::new(config);
        for spectrum in spectra {
            library.add(spectrum);
        }
        library
    }

    /// Detect the peaks of a reference spectrum and store them under its
    /// name, replacing any compound of the same name.
    ///
    /// Returns `false` (and stores nothing) when no peaks were found.
    pub fn add(&mut self, spectrum: &Spectrum) -> bool {
        let pixels = detect_peaks(spectrum, &self.config.library);
        let peaks = C::locate(spectrum, &pixels);
        let Some(peak_set) = PeakSet::new(spectrum.name(), peaks) else {
            debug!("{}: no peaks found, not added", spectrum.name());
            return false;
        };

        debug!("{}: peaks {:?}", spectrum.name(), peak_set.peaks());
        self.compounds.insert(spectrum.name().to_string(), peak_set);
        true
    }

    /// Peak locations of `sample`, detected with the sample settings.
    pub fn sample_peaks(&self, sample: &Spectrum) -> Vec<C> {
        let pixels = detect_peaks(sample, &self.config.sample);
        C::locate(sample, &pixels)
    }

    /// Find the compound that best explains `sample`.
    ///
    /// Compounds scoring zero are never reported. On equal scores the
    /// compound that comes first by name wins.
    pub fn identify(&self, sample: &Spectrum) -> Option<Identification> {
        let verbose = self.config.verbose;
        let domain = C::domain(&self.config);

        let peaks = self.sample_peaks(sample);
        if peaks.is_empty() {
            debug!("identify: no peaks found in {}", sample.name());
            return None;
        }
        debug!("identify: {} peaks {peaks:?}", sample.name());

        let mut best: Option<(&str, f64)> = None;
        for (name, reference) in &self.compounds {
            let score = check_fit_logged(&peaks, reference.peaks(), &domain, verbose);
            if verbose {
                debug!("identify: {name} scored {score:.2}");
            }
            if score.is_nan() || score <= 0.0 {
                continue;
            }
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((name.as_str(), score));
            }
        }

        let found = best.map(|(name, score)| Identification {
            name: name.to_string(),
            score,
        });
        match &found {
            Some(hit) => debug!("identify: {} is {} ({:.2})", sample.name(), hit.name, hit.score),
            None => debug!("identify: {} matched nothing", sample.name()),
        }
        found
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.compounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compounds.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&PeakSet<C>> {
        self.compounds.get(name)
    }

    /// Compound names in iteration (and tie-break) order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.compounds.keys().map(String::as_str)
    }

    /// Peak sets in the same order as [`Library::names`].
    pub fn iter(&self) -> impl Iterator<Item = &PeakSet<C>> {
        self.compounds.values()
    }
}

/// Reference files in `dir`, sorted by file name.
fn reference_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let io_error = |source| IdentifyError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("skipping unreadable entry in {}: {err}", dir.display());
                continue;
            }
        };
        let path = entry.path();
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        let wanted = path
            .extension()
            .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension));
        if !hidden && wanted {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identify::matcher::Pixel;

    fn gaussian_spectrum(name: &str, apexes: &[usize], height: f64) -> Spectrum {
        let wavenumbers: Vec<f64> = (0..600).map(|i| 400.0 + i as f64 * 2.0).collect();
        let intensities = (0..600)
            .map(|i| {
                apexes
                    .iter()
                    .map(|&apex| {
                        let d = i as f64 - apex as f64;
                        height * (-d * d / 200.0).exp()
                    })
                    .sum()
            })
            .collect();
        Spectrum::new(name, wavenumbers, intensities).unwrap()
    }

    #[test]
    fn peak_sets_are_never_empty() {
        assert!(PeakSet::<Wavenumber>::new("none", Vec::new()).is_none());
        let set = PeakSet::new("one", vec![1000.0]).unwrap();
        assert_eq!(set.name(), "one");
        assert_eq!(set.peaks(), &[1000.0]);
    }

    #[test]
    fn compounds_without_peaks_are_dropped() {
        let flat = Spectrum::new("flat", vec![1.0; 100], vec![10.0; 100]).unwrap();
        let mut library = Library::<Wavenumber>::new(Config::default());
        assert!(!library.add(&flat));
        assert!(library.is_empty());
    }

    #[test]
    fn later_compound_of_same_name_replaces_earlier() {
        let first = gaussian_spectrum("dup", &[100], 2000.0);
        let second = gaussian_spectrum("dup", &[300], 2000.0);
        let library = Library::<Wavenumber>::from_spectra([&first, &second], Config::default());
        assert_eq!(library.len(), 1);
        assert_eq!(library.get("dup").unwrap().peaks(), &[1000.0]);
    }

    #[test]
    fn identifies_best_compound() {
        let library = Library::<Wavenumber>::from_spectra(
            [
                &gaussian_spectrum("alpha", &[100, 300], 2000.0),
                &gaussian_spectrum("beta", &[200], 2000.0),
            ],
            Config::default(),
        );
        assert_eq!(library.names().collect::<Vec<_>>(), vec!["alpha", "beta"]);

        let hit = library
            .identify(&gaussian_spectrum("sample", &[101, 300], 1000.0))
            .unwrap();
        assert_eq!(hit.name, "alpha");
        // 2 cm⁻¹ off on one of two peaks
        assert!((hit.score - 90.0).abs() < 1e-9);
    }

    #[test]
    fn iteration_follows_name_order() {
        let library = Library::<Pixel>::from_spectra(
            [
                &gaussian_spectrum("gamma", &[450], 2000.0),
                &gaussian_spectrum("alpha", &[100, 300], 2000.0),
            ],
            Config::default(),
        );
        let sets: Vec<(&str, &[usize])> = library.iter().map(|set| (set.name(), set.peaks())).collect();
        assert_eq!(sets, vec![("alpha", &[100, 300][..]), ("gamma", &[450][..])]);
        assert!(library.iter().map(PeakSet::name).eq(library.names()));
    }

    #[test]
    fn libraries_can_be_shared_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Library<Wavenumber>>();
        assert_send_sync::<Library<Pixel>>();

        let library = Library::<Wavenumber>::from_spectra(
            [&gaussian_spectrum("alpha", &[100], 2000.0)],
            Config::default(),
        );
        let sample = gaussian_spectrum("sample", &[100], 1000.0);
        let hits: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| library.identify(&sample)))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(hits.iter().all(|hit| hit == &hits[0] && hit.is_some()));
    }

    #[test]
    fn ties_go_to_the_first_compound() {
        let library = Library::<Pixel>::from_spectra(
            [
                &gaussian_spectrum("b-second", &[200], 2000.0),
                &gaussian_spectrum("a-first", &[200], 2000.0),
            ],
            Config::default(),
        );
        let hit = library
            .identify(&gaussian_spectrum("sample", &[200], 1000.0))
            .unwrap();
        assert_eq!(hit.name, "a-first");
        assert_eq!(hit.score, 1.0);
    }

    #[test]
    fn no_sample_peaks_means_no_match() {
        let library = Library::<Wavenumber>::from_spectra(
            [&gaussian_spectrum("alpha", &[100], 2000.0)],
            Config::default(),
        );
        let flat = Spectrum::new("flat", vec![1.0; 50], vec![0.0; 50]).unwrap();
        assert_eq!(library.identify(&flat), None);
    }

    #[test]
    fn distant_peaks_do_not_match() {
        let library = Library::<Wavenumber>::from_spectra(
            [&gaussian_spectrum("alpha", &[100], 2000.0)],
            Config::default(),
        );
        assert_eq!(library.identify(&gaussian_spectrum("far", &[400], 1000.0)), None);
    }

    #[test]
    fn verbose_config_does_not_change_results() {
        let spectra = [gaussian_spectrum("alpha", &[100, 300], 2000.0)];
        let quiet = Library::<Wavenumber>::from_spectra(&spectra, Config::default());
        let loud = Library::<Wavenumber>::from_spectra(&spectra, Config::default().with_verbose(true));
        let sample = gaussian_spectrum("sample", &[100, 302], 1000.0);
        assert_eq!(quiet.identify(&sample), loud.identify(&sample));
    }
}
