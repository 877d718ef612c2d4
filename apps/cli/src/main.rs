// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC-Intel - IFC data extraction for BIM viewer backends.
//!
//! Every subcommand reads an IFC file, emits exactly one JSON document on
//! stdout and exits 0. On failure a `{"error": ...}` document goes to
//! stderr and the exit code is 1. Diagnostics are tracing events on stderr,
//! never mixed into the data stream.
//!
//! # Subcommands
//!
//! - `parse <file>` - project metadata and entity census
//! - `spatial <file> [--flat | --storey <GUID>]` - spatial hierarchy
//! - `properties <file> <guid>` - all properties of one element
//! - `elements <file>` - bulk element extraction for database load
//! - `export-gltf <input> <output>` - geometry export via IfcConvert

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::{Duration, Instant};

mod config;
mod error;
mod services;

use config::Config;
use error::ExtractError;
use services::cache::ModelCache;
use services::gltf::{GltfExportOptions, GltfExporter, GltfFormat};

#[derive(Parser)]
#[command(name = "ifc-intel")]
#[command(about = "Extract structured data from IFC building models", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse file metadata: project identity, schema, entity counts
    Parse {
        /// Path to the IFC file
        file: PathBuf,
    },
    /// Extract the spatial hierarchy
    Spatial {
        /// Path to the IFC file
        file: PathBuf,
        /// Emit spatial elements as a flat list instead of a tree
        #[arg(long)]
        flat: bool,
        /// Emit the decomposition of one building storey (by GUID)
        #[arg(long, value_name = "GUID", conflicts_with = "flat")]
        storey: Option<String>,
    },
    /// Extract all properties of one element
    Properties {
        /// Path to the IFC file
        file: PathBuf,
        /// GlobalId of the element
        guid: String,
    },
    /// Extract every physical element with its properties
    Elements {
        /// Path to the IFC file
        file: PathBuf,
    },
    /// Export geometry to glTF/GLB via IfcConvert
    ExportGltf {
        /// Input IFC file
        input: PathBuf,
        /// Output file (extension normalized to the format)
        output: PathBuf,
        /// Output format
        #[arg(long, value_enum, default_value = "glb")]
        format: GltfFormat,
        /// Use internal ids instead of element GUIDs as mesh names
        #[arg(long)]
        no_guids: bool,
        /// Use element names as mesh names
        #[arg(long)]
        use_names: bool,
        /// Use material ids instead of material names
        #[arg(long)]
        no_material_names: bool,
        /// Center the model at the origin
        #[arg(long)]
        center: bool,
        /// Skip normal computation
        #[arg(long)]
        no_normals: bool,
        /// Y-up coordinate convention (default is Z-up)
        #[arg(long)]
        y_up: bool,
        /// Deadline for the IfcConvert run in seconds
        #[arg(long, value_name = "SECS")]
        timeout_secs: Option<u64>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();
    let mut cache = ModelCache::new(
        config.cache_max_files,
        Duration::from_secs(config.cache_ttl_hours * 3600),
    );

    let exit_code = match run(cli.command, &mut cache, &config) {
        Ok(code) => code,
        Err(e) => {
            let document = serde_json::json!({ "error": e.to_string() });
            eprintln!("{}", document);
            1
        }
    };

    tracing::debug!(stats = ?cache.stats(), "cache statistics");
    std::process::exit(exit_code);
}

fn run(command: Commands, cache: &mut ModelCache, config: &Config) -> Result<i32, ExtractError> {
    match command {
        Commands::Parse { file } => {
            let model = cache.get_or_load(&file)?;
            let metadata = services::metadata::parse(&model)?;
            emit(&metadata);
            Ok(0)
        }

        Commands::Spatial { file, flat, storey } => {
            let model = cache.get_or_load(&file)?;
            if let Some(storey_guid) = storey {
                let elements = services::spatial::storey_decomposition(&model, &storey_guid)?;
                emit(&serde_json::json!({
                    "storey_guid": storey_guid,
                    "element_count": elements.len(),
                    "elements": elements,
                }));
            } else if flat {
                let elements = services::spatial::flat_elements(&model);
                emit(&serde_json::json!({
                    "element_count": elements.len(),
                    "elements": elements,
                }));
            } else {
                let tree = services::spatial::build_tree(&model)?;
                emit(&tree);
            }
            Ok(0)
        }

        Commands::Properties { file, guid } => {
            let model = cache.get_or_load(&file)?;
            let properties = services::properties::extract(&model, &guid)?;
            emit(&properties);
            Ok(0)
        }

        Commands::Elements { file } => {
            let parse_start = Instant::now();
            let model = cache.get_or_load(&file)?;
            let parse_ms = parse_start.elapsed().as_millis() as u64;
            let result = services::bulk::extract_all(&model, parse_ms);
            emit(&result);
            Ok(0)
        }

        Commands::ExportGltf {
            input,
            output,
            format,
            no_guids,
            use_names,
            no_material_names,
            center,
            no_normals,
            y_up,
            timeout_secs,
        } => {
            let options = GltfExportOptions {
                use_element_guids: !no_guids,
                use_element_names: use_names,
                use_material_names: !no_material_names,
                center_model: center,
                no_normals,
                y_up,
            };
            let timeout =
                Duration::from_secs(timeout_secs.unwrap_or(config.export_timeout_secs));
            let exporter = GltfExporter::new(config.ifcconvert_path.clone(), timeout);
            let result = exporter.export(&input, &output, format, &options)?;
            let success = result.success;
            emit(&result);
            Ok(if success { 0 } else { 1 })
        }
    }
}

/// Print the single JSON result document to stdout.
fn emit<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            // Serialization of our own output types cannot realistically
            // fail, but a panic would bypass the error contract.
            eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
            std::process::exit(1);
        }
    }
}
