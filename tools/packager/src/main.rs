use clap::{Parser, Subcommand};
use log::{error, info, warn, LevelFilter};
use std::path::{Path, PathBuf};
use xpak::generator::generate_asset;
use xpak::project::ProjectDescriptor;
use xpak::{
    fetch_asset_data, read_pak_index, AssetType, CompressionLevel, IdGenerator, PakBuilder,
    PackConfig, PakResult, ReadMode,
};
use xpak_util::logging::CommonLogger;
use xpak_util::profile::Measure;

const PAK_EXTENSION: &str = "xpak";

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Print per-asset details and timings
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build an archive from a project's content directory
    Pack {
        /// Path to the .xproj file
        project_file: PathBuf,

        /// Archive name, the project name by default.
        /// The archive is written next to the project file
        #[arg(short, long)]
        name: Option<String>,

        /// Compression level for compressed assets (fast, default, best)
        #[arg(short, long, default_value_t = CompressionLevel::Default)]
        level: CompressionLevel,

        /// Also pack every nested directory of the content directory
        #[arg(short, long)]
        recursive: bool,
    },
    /// Extract every asset of an archive to <id>.bin
    Unpack {
        pak_file: PathBuf,

        /// Output directory, the current directory by default
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write a descriptor sidecar for a single source file
    Generate {
        asset_file: PathBuf,

        /// Asset type, inferred from the file extension if omitted
        #[arg(short = 't', long = "type")]
        asset_type: Option<AssetType>,
    },
    /// Print the table of contents of an archive
    Dump { pak_file: PathBuf },
}

fn pack(project_file: &Path, name: Option<&str>, config: PackConfig) -> PakResult<PathBuf> {
    let project = ProjectDescriptor::from_file(project_file)?;
    info!(
        "Packing project {} (engine {}) from {}",
        project.name,
        project.engine_version,
        project.content_directory.display()
    );

    let _measure = Measure::new(format!("Packed project {}", project.name));
    let directories = project.asset_directories(config.read_mode)?;
    let mut builder = PakBuilder::new(config);
    for directory in &directories {
        builder.add_directory(directory)?;
    }
    let archive = builder.finish();

    let file_name = format!("{}.{}", name.unwrap_or(&project.name), PAK_EXTENSION);
    let output = project_file
        .parent()
        .unwrap_or(Path::new("."))
        .join(file_name);
    archive.write_to_file(&output)?;
    Ok(output)
}

/// Returns the number of assets that could not be extracted
fn unpack(pak_file: &Path, output: &Path) -> PakResult<usize> {
    let (_, table) = read_pak_index(pak_file)?;
    std::fs::create_dir_all(output)?;

    let mut failed = 0;
    for entry in &table {
        let data = match fetch_asset_data(pak_file, entry) {
            Ok(data) => data,
            Err(err) => {
                error!("Failed to fetch asset {}: {}", entry.asset_id, err);
                failed += 1;
                continue;
            }
        };

        let path = output.join(format!("{}.bin", entry.asset_id));
        std::fs::write(&path, &data)?;
        info!("Extracted {} ({} bytes)", path.display(), data.len());
    }

    Ok(failed)
}

/// Returns the written sidecar, or `None` if the type could not be determined
fn generate(asset_file: &Path, asset_type: Option<AssetType>) -> PakResult<Option<PathBuf>> {
    let asset_type = asset_type.or_else(|| {
        asset_file
            .extension()
            .and_then(|e| e.to_str())
            .and_then(AssetType::from_extension)
    });
    let Some(asset_type) = asset_type else {
        warn!("Could not determine asset type of {}", asset_file.display());
        return Ok(None);
    };

    let output_dir = match asset_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut ids = IdGenerator::from_entropy();
    generate_asset(&mut ids, asset_file, asset_type, output_dir).map(Some)
}

fn dump(pak_file: &Path) -> PakResult<Vec<String>> {
    let (header, table) = read_pak_index(pak_file)?;
    let mut lines = Vec::with_capacity(table.len() + 1);
    lines.push(header.describe());
    lines.extend(table.iter().map(|entry| entry.describe()));
    Ok(lines)
}

fn main() {
    let cli = Cli::parse();
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    if let Err(err) = CommonLogger::install(level) {
        eprintln!("Failed to install logger: {}", err);
    }

    let result = match cli.command {
        Command::Pack {
            project_file,
            name,
            level,
            recursive,
        } => {
            let config = PackConfig {
                compression_level: level,
                read_mode: if recursive {
                    ReadMode::Recursive
                } else {
                    ReadMode::Flat
                },
            };
            pack(&project_file, name.as_deref(), config).map(|_| ())
        }
        Command::Unpack { pak_file, output } => {
            let output = output.unwrap_or_else(|| PathBuf::from("."));
            unpack(&pak_file, &output).map(|failed| {
                if failed > 0 {
                    error!("{} assets could not be extracted", failed);
                    std::process::exit(1);
                }
            })
        }
        Command::Generate {
            asset_file,
            asset_type,
        } => generate(&asset_file, asset_type).map(|_| ()),
        Command::Dump { pak_file } => dump(&pak_file).map(|lines| {
            for line in lines {
                println!("{}", line);
            }
        }),
    };

    result.unwrap_or_else(|err| {
        error!("{}", err);
        std::process::exit(1);
    });
}
