//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::api::Language;
use crate::classify::VoiceLabel;
use crate::detector::{ClassificationResult, VoiceDetector};
use crate::engine::AudioDecoder;
use crate::error::Result;

/// File extensions `scan` picks up
pub const AUDIO_EXTENSIONS: [&str; 6] = ["wav", "mp3", "flac", "ogg", "m4a", "aac"];

/// Classify one file and print the verdict.
pub fn analyze(detector: &VoiceDetector, file: &Path, language: Language, json: bool) -> Result<()> {
    info!("Analyzing: {}", file.display());

    let result = match detector.analyze_file(file) {
        Ok(analysis) => analysis.to_result().with_language(language.as_str()),
        Err(e) => {
            warn!("{}: {}", file.display(), e);
            ClassificationResult::from_error(&e)
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(file, &result);
    }

    Ok(())
}

/// One file's outcome in a directory scan
#[derive(Debug, Clone, Serialize)]
pub struct ScanEntry {
    pub path: PathBuf,
    pub result: ClassificationResult,
    /// Full error text for failures; the result only carries the client message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Whether a path has one of the scanned extensions
pub fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| AUDIO_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Classify every audio file under `dir`; per-file failures are recorded, not raised.
pub fn scan_directory(detector: &VoiceDetector, dir: &Path) -> Vec<ScanEntry> {
    let mut entries = Vec::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file() || !is_audio_file(path) {
            continue;
        }

        let scan_entry = match detector.analyze_file(path) {
            Ok(analysis) => ScanEntry {
                path: path.to_path_buf(),
                result: analysis.to_result(),
                error: None,
            },
            Err(e) => {
                warn!("{}: {}", path.display(), e);
                ScanEntry {
                    path: path.to_path_buf(),
                    result: ClassificationResult::from_error(&e),
                    error: Some(e.to_string()),
                }
            }
        };
        entries.push(scan_entry);
    }

    entries
}

/// Scan a directory and print a summary.
pub fn scan(detector: &VoiceDetector, dir: &Path, json: bool) -> Result<()> {
    info!("Scanning: {}", dir.display());
    let entries = scan_directory(detector, dir);

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for entry in &entries {
        print_result(&entry.path, &entry.result);
        if let Some(error) = &entry.error {
            println!("    {}", error);
        }
    }

    let count = |label| {
        entries
            .iter()
            .filter(|e| e.result.classification == Some(label))
            .count()
    };
    let failed = entries.iter().filter(|e| !e.result.is_success()).count();
    println!();
    println!(
        "{} files: {} AI_GENERATED, {} HUMAN, {} failed",
        entries.len(),
        count(VoiceLabel::AiGenerated),
        count(VoiceLabel::Human),
        failed
    );

    Ok(())
}

/// Raw backend reading for one calibration clip
#[derive(Debug, Clone, Serialize)]
pub struct ClipCalibration {
    pub path: PathBuf,
    pub class_index: usize,
    pub tag: String,
    pub probability: f64,
    pub label: VoiceLabel,
}

/// Whether the backend's class orientation matches the label table
#[derive(Debug, Clone, Serialize)]
pub struct CalibrationReport {
    pub human: ClipCalibration,
    pub ai: ClipCalibration,
    /// Both clips landed on the same class
    pub same_class: bool,
    /// The AI clip's tag resolves to AI_GENERATED
    pub ai_maps_to_synthetic: bool,
    /// The human clip's tag resolves to HUMAN
    pub human_maps_to_natural: bool,
}

impl CalibrationReport {
    pub fn is_consistent(&self) -> bool {
        !self.same_class && self.ai_maps_to_synthetic && self.human_maps_to_natural
    }
}

/// Run the backend directly on a clip, bypassing the silence gate
fn probe(detector: &VoiceDetector, path: &Path) -> Result<ClipCalibration> {
    let engine = detector.engine();
    let audio = AudioDecoder::decode_file(path)?;
    let canonical = engine.canonicalize(&audio)?;
    let prediction = engine.predict(canonical.samples())?;
    let label = engine.label_for(&prediction.tag);

    Ok(ClipCalibration {
        path: path.to_path_buf(),
        class_index: prediction.class_index,
        probability: prediction.probabilities[prediction.class_index],
        tag: prediction.tag,
        label,
    })
}

/// Compare backend readings for a known human clip and a known AI clip.
pub fn calibrate_clips(detector: &VoiceDetector, human: &Path, ai: &Path) -> Result<CalibrationReport> {
    let human = probe(detector, human)?;
    let ai = probe(detector, ai)?;

    Ok(CalibrationReport {
        same_class: human.class_index == ai.class_index,
        ai_maps_to_synthetic: ai.label == VoiceLabel::AiGenerated,
        human_maps_to_natural: human.label == VoiceLabel::Human,
        human,
        ai,
    })
}

/// Print a calibration report.
pub fn calibrate(detector: &VoiceDetector, human: &Path, ai: &Path, json: bool) -> Result<()> {
    info!("Calibrating with human={} ai={}", human.display(), ai.display());
    let report = calibrate_clips(detector, human, ai)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Backend: {}", detector.engine().backend().id());
    println!("Classes: {:?}", detector.engine().backend().class_tags());
    for (name, clip) in [("Human", &report.human), ("AI", &report.ai)] {
        println!(
            "{:<6} {} -> class {} '{}' (p={:.4}) => {}",
            name,
            clip.path.display(),
            clip.class_index,
            clip.tag,
            clip.probability,
            clip.label
        );
    }

    if report.same_class {
        warn!("Both clips landed on the same class; the backend cannot tell them apart");
    }
    if !report.ai_maps_to_synthetic {
        warn!(
            "AI clip tag '{}' maps to {}; check label_mapping",
            report.ai.tag, report.ai.label
        );
    }
    if !report.human_maps_to_natural {
        warn!(
            "Human clip tag '{}' maps to {}; check label_mapping",
            report.human.tag, report.human.label
        );
    }
    println!(
        "Mapping {}",
        if report.is_consistent() { "OK" } else { "NEEDS ATTENTION" }
    );

    Ok(())
}

fn print_result(path: &Path, result: &ClassificationResult) {
    match (&result.classification, result.confidence_score, &result.explanation) {
        (Some(label), Some(confidence), Some(explanation)) => {
            println!("{}: {} ({:.2})", path.display(), label, confidence);
            println!("    {}", explanation);
        }
        _ => {
            println!(
                "{}: error: {}",
                path.display(),
                result.message.as_deref().unwrap_or("unknown error")
            );
        }
    }
}
