//! PKA Mark Scanner
//!
//! Automates grading of Cisco Packet Tracer activities: captures a
//! screenshot of each activity window, extracts the completion
//! percentage with consensus-validated OCR, and writes per-student
//! scores to a CSV report.

mod capture;
mod config;
mod ocr;
mod paths;
mod scan;
mod validate;

use anyhow::Result;
use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;

use scan::{print_results_table, scan_all, scan_student, write_report, StudentRecord};

/// Logs a message to both console and log file with timestamp.
pub fn log(msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] {}\n", timestamp, msg);
    print!("{}", line);
    let log_path = paths::get_logs_dir().join("mark_scanner.log");
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        let _ = file.write_all(line.as_bytes());
    }
}

fn main() -> Result<()> {
    // Log panics before the process dies
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let location = if let Some(loc) = panic_info.location() {
            format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column())
        } else {
            String::new()
        };
        let log_msg = format!("[PANIC]{} {}\n", location, msg);
        eprintln!("{}", log_msg);
        if let Ok(mut file) = OpenOptions::new()
            .create(true)
            .append(true)
            .open(paths::get_logs_dir().join("mark_scanner.log"))
        {
            let _ = file.write_all(log_msg.as_bytes());
        }
    }));

    paths::ensure_directories()?;
    config::init_config();

    if let Err(e) = ocr::ensure_tessdata() {
        log(&format!("Warning: Failed to set up tessdata: {}", e));
        log("OCR features may not work correctly.");
    }

    menu_loop()
}

fn print_menu() {
    println!();
    println!("{}", "=".repeat(60));
    println!("PKA MARK SCANNER");
    println!("{}", "=".repeat(60));
    println!("1. Validate setup");
    println!("2. Capture activity screenshots");
    println!("3. Scan marks (individual or all students)");
    println!("4. Batch process (capture + scan)");
    println!("5. Exit");
    println!();
}

/// Prompts and reads one trimmed line from stdin. None on EOF.
fn read_line(prompt: &str) -> Result<Option<String>> {
    print!("{}", prompt);
    std::io::stdout().flush()?;

    let mut line = String::new();
    if std::io::stdin().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn menu_loop() -> Result<()> {
    loop {
        print_menu();

        let Some(choice) = read_line("Enter your choice (1-5): ")? else {
            break;
        };

        match choice.as_str() {
            "1" => validate::run_validation(config::get_config()),
            "2" => run_capture(),
            "3" => run_scan_menu()?,
            "4" => run_batch()?,
            "5" | "q" | "quit" | "exit" => break,
            _ => println!("Invalid choice. Please enter 1-5."),
        }
    }

    println!("Goodbye!");
    Ok(())
}

fn run_capture() {
    let config = config::get_config();
    match capture::capture_all(config) {
        Ok((successful, failed)) => {
            println!(
                "Capture complete: {} succeeded, {} failed",
                successful, failed
            );
        }
        Err(e) => log(&format!("Capture failed: {}", e)),
    }
}

/// Individual/all scanning submenu.
fn run_scan_menu() -> Result<()> {
    let config = config::get_config();
    let images_dir = paths::get_images_dir();

    let available = scan::roster::student_ids(&images_dir, &config.image_formats);
    if available.is_empty() {
        println!("No student images found in {}", images_dir.display());
        println!("Expected format: StudentID.extension (e.g. 24075450.jpg)");
        return Ok(());
    }

    println!("Found images for {} student(s)", available.len());

    let extractor = ocr::MarkExtractor::new(config.extractor.clone());

    loop {
        let Some(input) =
            read_line("\nEnter ID Number ('all' scans everyone, 'back' returns): ")?
        else {
            return Ok(());
        };

        match input.as_str() {
            "" => continue,
            "back" | "b" => return Ok(()),
            "all" => {
                let records = scan_all(&extractor, &images_dir, &config.image_formats);
                finish_scan(&records)?;
                return Ok(());
            }
            id => match scan_student(&extractor, &images_dir, &config.image_formats, id) {
                Some(record) => print_results_table(&[record]),
                None => println!("No image found for ID {}", id),
            },
        }
    }
}

/// Capture everything, then scan everything.
fn run_batch() -> Result<()> {
    let config = config::get_config();

    run_capture();

    let images_dir = paths::get_images_dir();
    let extractor = ocr::MarkExtractor::new(config.extractor.clone());
    let records = scan_all(&extractor, &images_dir, &config.image_formats);
    finish_scan(&records)
}

fn finish_scan(records: &[StudentRecord]) -> Result<()> {
    if records.is_empty() {
        return Ok(());
    }
    print_results_table(records);
    write_report(records, &paths::get_results_dir())?;
    Ok(())
}
