//! Configuration types for the scanner.
//!
//! Loads settings from config.json at startup. Provides Packet Tracer
//! locations, capture timing, and the consensus OCR parameters.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use crate::ocr::engine::PsmMode;
use crate::ocr::preprocess::Technique;

/// Global configuration instance, initialized once at startup.
static CONFIG: OnceLock<ScannerConfig> = OnceLock::new();

/// A screen rectangle in absolute pixel coordinates.
///
/// Packet Tracer activity windows are positioned into this zone before
/// capture, so the zone bounds what the screenshot contains.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct CaptureZone {
    /// X position of the top-left corner
    pub x: i32,
    /// Y position of the top-left corner
    pub y: i32,
    /// Zone width in pixels
    pub width: u32,
    /// Zone height in pixels
    pub height: u32,
}

impl Default for CaptureZone {
    fn default() -> Self {
        Self {
            x: 50,
            y: 50,
            width: 800,
            height: 600,
        }
    }
}

/// Settings for the consensus OCR extractor.
///
/// Passed into `MarkExtractor::new` as an explicit immutable value; the
/// extractor never reads the global config.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Preprocessing techniques to derive enhanced images from
    #[serde(default = "default_techniques")]
    pub techniques: Vec<Technique>,
    /// Tesseract page segmentation modes to try per enhanced image
    #[serde(default = "default_psm_modes")]
    pub psm_modes: Vec<PsmMode>,
    /// Cluster membership band in percentage points
    #[serde(default = "default_tolerance")]
    pub tolerance: u32,
    /// Minimum cluster size required to accept a reading
    #[serde(default = "default_min_agreement")]
    pub min_agreement: usize,
    /// Inclusive lower bound for valid percentage candidates
    #[serde(default)]
    pub value_min: u32,
    /// Inclusive upper bound for valid percentage candidates
    #[serde(default = "default_value_max")]
    pub value_max: u32,
    /// Budget for one Tesseract invocation (milliseconds)
    #[serde(default = "default_ocr_timeout_ms")]
    pub ocr_timeout_ms: u64,
}

fn default_techniques() -> Vec<Technique> {
    Technique::ALL.to_vec()
}

fn default_psm_modes() -> Vec<PsmMode> {
    PsmMode::ALL.to_vec()
}

fn default_tolerance() -> u32 {
    2
}

fn default_min_agreement() -> usize {
    3
}

fn default_value_max() -> u32 {
    100
}

fn default_ocr_timeout_ms() -> u64 {
    10_000
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            techniques: default_techniques(),
            psm_modes: default_psm_modes(),
            tolerance: default_tolerance(),
            min_agreement: default_min_agreement(),
            value_min: 0,
            value_max: default_value_max(),
            ocr_timeout_ms: default_ocr_timeout_ms(),
        }
    }
}

/// Complete scanner configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Packet Tracer installation candidates, checked in order
    #[serde(default = "default_packet_tracer_paths")]
    pub packet_tracer_paths: Vec<String>,
    /// Image file extensions recognized for student screenshots
    #[serde(default = "default_image_formats")]
    pub image_formats: Vec<String>,
    /// Screen region captured for each activity window
    #[serde(default)]
    pub capture_zone: CaptureZone,
    /// Wait after launching Packet Tracer before the first capture (seconds)
    #[serde(default = "default_launch_wait_secs")]
    pub launch_wait_secs: u64,
    /// Total budget for the activity window to finish rendering (seconds)
    #[serde(default = "default_window_wait_secs")]
    pub window_wait_secs: u64,
    /// Interval between capture attempts while waiting (seconds)
    #[serde(default = "default_window_wait_interval_secs")]
    pub window_wait_interval_secs: u64,
    /// Settling delay after the process is told to exit (seconds)
    #[serde(default = "default_cleanup_delay_secs")]
    pub cleanup_delay_secs: u64,
    /// Consensus OCR parameters
    #[serde(default)]
    pub extractor: ExtractorConfig,
}

fn default_packet_tracer_paths() -> Vec<String> {
    [
        r"C:\Program Files\Cisco Packet Tracer 8.2.2\bin\PacketTracer.exe",
        r"C:\Program Files\Cisco Packet Tracer 8.2.1\bin\PacketTracer.exe",
        r"C:\Program Files\Cisco Packet Tracer 8.2.0\bin\PacketTracer.exe",
        r"C:\Program Files\Cisco Packet Tracer 8.1.1\bin\PacketTracer.exe",
        r"C:\Program Files (x86)\Cisco Packet Tracer 8.2.2\bin\PacketTracer.exe",
        r"C:\Program Files (x86)\Cisco Packet Tracer 8.2.1\bin\PacketTracer.exe",
        r"C:\Program Files (x86)\Cisco Packet Tracer 8.1.1\bin\PacketTracer.exe",
        "/opt/pt/bin/PacketTracer",
        "/usr/local/bin/packettracer",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_image_formats() -> Vec<String> {
    [".jpg", ".jpeg", ".png", ".bmp", ".tiff"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_launch_wait_secs() -> u64 {
    15
}

fn default_window_wait_secs() -> u64 {
    60
}

fn default_window_wait_interval_secs() -> u64 {
    2
}

fn default_cleanup_delay_secs() -> u64 {
    2
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            packet_tracer_paths: default_packet_tracer_paths(),
            image_formats: default_image_formats(),
            capture_zone: CaptureZone::default(),
            launch_wait_secs: default_launch_wait_secs(),
            window_wait_secs: default_window_wait_secs(),
            window_wait_interval_secs: default_window_wait_interval_secs(),
            cleanup_delay_secs: default_cleanup_delay_secs(),
            extractor: ExtractorConfig::default(),
        }
    }
}

/// Loads configuration from config.json or returns defaults.
/// Looks for config.json in the same directory as the executable.
fn load_config() -> ScannerConfig {
    let config_path = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|p| p.join("config.json")))
        .unwrap_or_else(|| Path::new("config.json").to_path_buf());

    crate::log(&format!("Looking for config at: {}", config_path.display()));

    if config_path.exists() {
        match fs::read_to_string(config_path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    crate::log("Config loaded from config.json");
                    return config;
                }
                Err(e) => {
                    crate::log(&format!(
                        "Failed to parse config.json: {}. Using defaults.",
                        e
                    ));
                }
            },
            Err(e) => {
                crate::log(&format!(
                    "Failed to read config.json: {}. Using defaults.",
                    e
                ));
            }
        }
    } else {
        crate::log("config.json not found. Using default config.");
    }

    ScannerConfig::default()
}

/// Initializes the global configuration. Call once at startup.
pub fn init_config() {
    let _ = CONFIG.set(load_config());
}

/// Returns a reference to the global configuration.
/// Panics if called before init_config().
pub fn get_config() -> &'static ScannerConfig {
    CONFIG
        .get()
        .expect("Config not initialized. Call init_config() first.")
}
