//! Line-delimited JSON request loop.
//!
//! Each input line is one request object; each request gets exactly one
//! output line. Decoding keeps no state between lines.

use std::io::{BufRead, ErrorKind, Write};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::data::model::Spectrum;
use crate::error::Result;
use crate::identify::library::{Identification, Library};
use crate::identify::matcher::Coordinate;

/// Written once before the first request is read.
pub const READY_LINE: &str = r#"{"status":"ready"}"#;

// ---------------------------------------------------------------------------
// Request / response
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StreamRequest {
    /// Intensities.
    pub spectrum: Vec<f64>,
    pub wavenumbers: Vec<f64>,
    #[serde(default)]
    pub min_confidence: f64,
    /// Accepted for compatibility; only the single best match is reported.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_max_results() -> usize {
    20
}

impl StreamRequest {
    pub fn from_line(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line)
    }

    pub fn to_spectrum(&self) -> Result<Spectrum> {
        Spectrum::new(
            "stream",
            self.wavenumbers.clone(),
            self.spectrum.clone(),
        )
    }
}

/// One output line: the best match, or an empty list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StreamResponse {
    Match(Identification),
    NoMatch(Vec<Identification>),
}

impl StreamResponse {
    pub fn no_match() -> Self {
        StreamResponse::NoMatch(Vec::new())
    }
}

/// Answer a single request against `library`.
pub fn respond<C: Coordinate>(library: &Library<C>, request: &StreamRequest) -> StreamResponse {
    let sample = match request.to_spectrum() {
        Ok(sample) => sample,
        Err(err) => {
            warn!("stream: {err}");
            return StreamResponse::no_match();
        }
    };
    match library.identify(&sample) {
        Some(hit) if hit.score >= request.min_confidence => StreamResponse::Match(hit),
        Some(hit) => {
            debug!(
                "stream: best match {} ({:.2}) below min_confidence {:.2}",
                hit.name, hit.score, request.min_confidence
            );
            StreamResponse::no_match()
        }
        None => StreamResponse::no_match(),
    }
}

// ---------------------------------------------------------------------------
// Request loop
// ---------------------------------------------------------------------------

/// Serve requests from `input` until end of input, an empty line, or a line
/// that is not a valid request (including one that is not UTF-8). Returns the number of requests answered.
pub fn serve<C, R, W>(library: &Library<C>, mut input: R, mut output: W) -> std::io::Result<usize>
where
    C: Coordinate,
    R: BufRead,
    W: Write,
{
    writeln!(output, "{READY_LINE}")?;
    output.flush()?;

    let mut answered = 0;
    let mut line = String::new();
    loop {
        line.clear();
        match input.read_line(&mut line) {
            Ok(0) => {
                debug!("stream: end of input");
                break;
            }
            Ok(_) => {}
            Err(err) if err.kind() == ErrorKind::InvalidData => {
                warn!("stream: unreadable request: {err}");
                break;
            }
            Err(err) => return Err(err),
        }
        let text = line.trim();
        if text.is_empty() {
            debug!("stream: empty line");
            break;
        }

        let request = match StreamRequest::from_line(text) {
            Ok(request) => request,
            Err(err) => {
                warn!("stream: unreadable request: {err}");
                break;
            }
        };
        debug!(
            "stream: request with {} wavenumbers, {} intensities, min_confidence {:.2}, max_results {}",
            request.wavenumbers.len(),
            request.spectrum.len(),
            request.min_confidence,
            request.max_results
        );

        let response = respond(library, &request);
        serde_json::to_writer(&mut output, &response)?;
        writeln!(output)?;
        output.flush()?;
        answered += 1;
    }

    info!("stream: answered {answered} requests");
    Ok(answered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_fields_default() {
        let request = StreamRequest::from_line(r#"{"spectrum":[1,2],"wavenumbers":[3,4]}"#).unwrap();
        assert_eq!(request.min_confidence, 0.0);
        assert_eq!(request.max_results, 20);
        assert_eq!(request.spectrum, vec![1.0, 2.0]);
    }

    #[test]
    fn required_fields_are_required() {
        assert!(StreamRequest::from_line(r#"{"spectrum":[1,2]}"#).is_err());
        assert!(StreamRequest::from_line(r#"{"wavenumbers":[1,2]}"#).is_err());
    }

    #[test]
    fn mismatched_lengths_make_no_spectrum() {
        let request =
            StreamRequest::from_line(r#"{"spectrum":[1,2,3],"wavenumbers":[3,4]}"#).unwrap();
        assert!(request.to_spectrum().is_err());
    }

    #[test]
    fn responses_serialize_as_object_or_empty_list() {
        let hit = StreamResponse::Match(Identification {
            name: "Acetone".to_string(),
            score: 95.5,
        });
        assert_eq!(
            serde_json::to_string(&hit).unwrap(),
            r#"{"name":"Acetone","score":95.5}"#
        );
        assert_eq!(serde_json::to_string(&StreamResponse::no_match()).unwrap(), "[]");
    }
}
