//! Tesseract discovery and language data setup.
//!
//! The scanner shells out to an installed tesseract binary. Discovery
//! checks the system PATH first, then common install locations. Language
//! data is resolved the same way, with a one-time download of
//! eng.traineddata into the local app data directory as the fallback.

use anyhow::{anyhow, Result};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use crate::log;

const TESSDATA_REPO: &str = "https://github.com/tesseract-ocr/tessdata/raw/main";

/// Common tesseract install locations, checked after PATH.
const TESSERACT_PATHS: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR\tesseract.exe",
    r"C:\Program Files (x86)\Tesseract-OCR\tesseract.exe",
    "/usr/bin/tesseract",
    "/usr/local/bin/tesseract",
    "/opt/homebrew/bin/tesseract",
];

/// System tessdata locations, checked before downloading.
const SYSTEM_TESSDATA_PATHS: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR\tessdata",
    r"C:\Program Files (x86)\Tesseract-OCR\tessdata",
    "/usr/share/tesseract-ocr/5/tessdata",
    "/usr/share/tesseract-ocr/4.00/tessdata",
    "/usr/share/tessdata",
    "/usr/local/share/tessdata",
    "/opt/homebrew/share/tessdata",
];

/// Returns the directory for locally downloaded language data.
pub fn get_tessdata_download_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pka-mark-scanner")
        .join("tessdata")
}

/// Finds the tesseract executable, checking PATH first, then common
/// install locations.
pub fn find_tesseract_executable() -> Result<PathBuf> {
    if let Ok(output) = std::process::Command::new("tesseract")
        .arg("--version")
        .output()
    {
        if output.status.success() {
            return Ok(PathBuf::from("tesseract"));
        }
    }

    for path in TESSERACT_PATHS {
        let p = PathBuf::from(path);
        if p.exists() {
            return Ok(p);
        }
    }

    Err(anyhow!(
        "Tesseract not found. Please install Tesseract-OCR:\n\
         - Windows: https://github.com/UB-Mannheim/tesseract/releases\n\
         - Linux: apt install tesseract-ocr\n\
         - macOS: brew install tesseract"
    ))
}

/// Finds a tessdata directory containing eng.traineddata.
///
/// Checks the local download directory, system install locations, and
/// the TESSDATA_PREFIX environment variable.
pub fn find_tessdata_dir() -> Result<PathBuf> {
    let local = get_tessdata_download_dir();
    if local.join("eng.traineddata").exists() {
        return Ok(local);
    }

    for path in SYSTEM_TESSDATA_PATHS {
        let p = PathBuf::from(path);
        if p.join("eng.traineddata").exists() {
            return Ok(p);
        }
    }

    if let Ok(prefix) = std::env::var("TESSDATA_PREFIX") {
        let p = PathBuf::from(&prefix);
        if p.join("eng.traineddata").exists() {
            return Ok(p);
        }
        let p = PathBuf::from(&prefix).join("tessdata");
        if p.join("eng.traineddata").exists() {
            return Ok(p);
        }
    }

    Err(anyhow!(
        "tessdata directory not found. Please ensure eng.traineddata is available."
    ))
}

/// Ensures English language data exists, downloading it if necessary.
/// Returns the tessdata directory to use.
pub fn ensure_tessdata() -> Result<PathBuf> {
    if let Ok(dir) = find_tessdata_dir() {
        log(&format!("tessdata found at: {}", dir.display()));
        return Ok(dir);
    }

    let download_dir = get_tessdata_download_dir();
    fs::create_dir_all(&download_dir)?;

    download_traineddata(&download_dir)?;
    Ok(download_dir)
}

/// Downloads eng.traineddata from the tessdata GitHub repository.
fn download_traineddata(tessdata_dir: &PathBuf) -> Result<()> {
    let eng_url = format!("{}/eng.traineddata", TESSDATA_REPO);
    let eng_path = tessdata_dir.join("eng.traineddata");

    log("Downloading eng.traineddata...");

    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(300))
        .build()?;

    let response = client
        .get(&eng_url)
        .header("User-Agent", "pka-mark-scanner")
        .send()?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Failed to download eng.traineddata: HTTP {}",
            response.status()
        ));
    }

    let bytes = response.bytes()?;
    let mut file = fs::File::create(&eng_path)?;
    file.write_all(&bytes)?;

    log(&format!("Downloaded eng.traineddata ({} bytes)", bytes.len()));

    Ok(())
}
