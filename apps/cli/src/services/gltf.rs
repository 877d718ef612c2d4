// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! glTF/GLB export via the IfcConvert binary.
//!
//! IfcConvert can exit 0 while producing no output at all (a file without
//! geometry converts to nothing), so success requires both a zero exit code
//! and the output file existing afterwards.

use crate::error::ExtractError;
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

/// Output format for geometry export
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum GltfFormat {
    /// Binary glTF
    Glb,
    /// JSON glTF
    Gltf,
}

impl GltfFormat {
    fn extension(self) -> &'static str {
        match self {
            GltfFormat::Glb => "glb",
            GltfFormat::Gltf => "gltf",
        }
    }
}

/// Export options, each mapping to one IfcConvert flag
#[derive(Debug, Clone)]
pub struct GltfExportOptions {
    /// Use IFC GlobalIds as mesh names (stable across exports)
    pub use_element_guids: bool,
    /// Use IFC element names as mesh names
    pub use_element_names: bool,
    /// Use material names instead of ids
    pub use_material_names: bool,
    /// Center the model at the origin
    pub center_model: bool,
    /// Skip normal computation
    pub no_normals: bool,
    /// Y-up coordinate convention (default is Z-up)
    pub y_up: bool,
}

impl Default for GltfExportOptions {
    fn default() -> Self {
        Self {
            use_element_guids: true,
            use_element_names: false,
            use_material_names: true,
            center_model: false,
            no_normals: false,
            y_up: false,
        }
    }
}

/// Outcome of one export run
#[derive(Debug, Clone, Serialize)]
pub struct GltfExportResult {
    pub success: bool,
    pub output_path: Option<String>,
    pub file_size: Option<u64>,
    pub error_message: Option<String>,
    // Captured streams can be large; they stay out of the JSON document.
    #[serde(skip)]
    pub stdout: String,
    #[serde(skip)]
    pub stderr: String,
}

impl GltfExportResult {
    fn failure(message: String, stdout: String, stderr: String) -> Self {
        Self {
            success: false,
            output_path: None,
            file_size: None,
            error_message: Some(message),
            stdout,
            stderr,
        }
    }
}

/// IfcConvert subprocess wrapper
pub struct GltfExporter {
    binary_path: String,
    timeout: Duration,
}

impl GltfExporter {
    pub fn new(binary_path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary_path: binary_path.into(),
            timeout,
        }
    }

    /// Export an IFC file to glTF/GLB.
    ///
    /// Fails with `NotFound` when the input is missing and with `Timeout`
    /// when IfcConvert exceeds its deadline (the child is killed). Every
    /// other failure mode is reported in the returned result.
    pub fn export(
        &self,
        input: &Path,
        output: &Path,
        format: GltfFormat,
        options: &GltfExportOptions,
    ) -> Result<GltfExportResult, ExtractError> {
        if !input.exists() {
            return Err(ExtractError::NotFound(format!(
                "IFC file not found: {}",
                input.display()
            )));
        }

        let output = ensure_extension(output, format);
        let args = build_args(input, &output, options);

        tracing::debug!(binary = %self.binary_path, ?args, "running IfcConvert");

        let child = Command::new(&self.binary_path)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(Stdio::null())
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(GltfExportResult::failure(
                    format!("IfcConvert binary not found at: {}", self.binary_path),
                    String::new(),
                    String::new(),
                ));
            }
            Err(e) => {
                return Ok(GltfExportResult::failure(
                    format!("Failed to start IfcConvert: {}", e),
                    String::new(),
                    String::new(),
                ));
            }
        };

        let (status, stdout, stderr) = self.wait_with_deadline(child)?;

        if status == 0 && output.exists() {
            let file_size = std::fs::metadata(&output).map(|m| m.len()).unwrap_or(0);
            tracing::info!(output = %output.display(), file_size, "export complete");
            Ok(GltfExportResult {
                success: true,
                output_path: Some(output.display().to_string()),
                file_size: Some(file_size),
                error_message: None,
                stdout,
                stderr,
            })
        } else {
            let message = if status == 0 {
                // Exit 0 with no output: geometry-less input.
                format!("IfcConvert produced no output at {}", output.display())
            } else if !stderr.trim().is_empty() {
                stderr.trim().to_string()
            } else if !stdout.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                format!("IfcConvert exited with code {}", status)
            };
            tracing::warn!(status, "export failed");
            Ok(GltfExportResult::failure(message, stdout, stderr))
        }
    }

    /// Wait for the child, polling with a deadline. Output pipes are drained
    /// on reader threads so a chatty child cannot block on a full pipe.
    fn wait_with_deadline(
        &self,
        mut child: Child,
    ) -> Result<(i32, String, String), ExtractError> {
        let stdout_reader = child.stdout.take().map(spawn_reader);
        let stderr_reader = child.stderr.take().map(spawn_reader);
        let deadline = Instant::now() + self.timeout;

        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        // Orphaned grandchildren can keep the pipes open;
                        // the reader threads are dropped, not joined.
                        drop(stdout_reader);
                        drop(stderr_reader);
                        return Err(ExtractError::Timeout {
                            command: self.binary_path.clone(),
                            seconds: self.timeout.as_secs(),
                        });
                    }
                    std::thread::sleep(Duration::from_millis(50));
                }
                Err(e) => {
                    let _ = child.kill();
                    return Err(ExtractError::NotFound(format!(
                        "IfcConvert wait failed: {}",
                        e
                    )));
                }
            }
        };

        let stdout = drain(stdout_reader);
        let stderr = drain(stderr_reader);
        Ok((status.code().unwrap_or(-1), stdout, stderr))
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut source: R) -> std::thread::JoinHandle<String> {
    std::thread::spawn(move || {
        let mut buffer = String::new();
        let _ = source.read_to_string(&mut buffer);
        buffer
    })
}

fn drain(reader: Option<std::thread::JoinHandle<String>>) -> String {
    reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}

/// Translate options into the IfcConvert argument list.
fn build_args(input: &Path, output: &Path, options: &GltfExportOptions) -> Vec<String> {
    let mut args = Vec::new();

    if options.use_element_guids {
        args.push("--use-element-guids".to_string());
    }
    if options.use_element_names {
        args.push("--use-element-names".to_string());
    }
    if options.use_material_names {
        args.push("--use-material-names".to_string());
    }
    if options.center_model {
        args.push("--center-model".to_string());
    }
    if options.no_normals {
        args.push("--no-normals".to_string());
    }
    if options.y_up {
        args.push("--y-up".to_string());
    }

    args.push(input.display().to_string());
    args.push(output.display().to_string());
    args
}

/// Force the output extension to match the requested format.
fn ensure_extension(output: &Path, format: GltfFormat) -> PathBuf {
    let expected = format.extension();
    let matches = output
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case(expected))
        .unwrap_or(false);
    if matches {
        output.to_path_buf()
    } else {
        output.with_extension(expected)
    }
}
