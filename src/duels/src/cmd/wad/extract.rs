use std::{
    fs,
    io::Cursor,
    path::{Component, Path, PathBuf},
};

use duels_wad::{Archive, FileEntry, Inflater};
use eyre::{bail, Context};
use memmap2::Mmap;
use rayon::prelude::*;

use super::HEADER_FILE_NAME;

pub struct Options {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub overwrite: bool,
    pub lowercase: bool,
    pub filter: Option<String>,
}

fn validate_extract_path(base: &Path, archive_path: &str) -> eyre::Result<PathBuf> {
    let path = Path::new(archive_path);

    // Reject absolute paths outright.
    if path.is_absolute() {
        bail!("absolute path not allowed in archive: '{archive_path}'");
    }

    // Traverse the path while checking for directory escapes.
    let mut result = base.to_path_buf();
    let base_depth = base.components().count();

    for component in path.components() {
        match component {
            Component::Normal(c) => {
                result.push(c);
            }
            Component::ParentDir => {
                if result.components().count() <= base_depth {
                    bail!("path traversal detected in archive path '{archive_path}'");
                }
                result.pop();
            }
            Component::CurDir => (),
            Component::Prefix(_) | Component::RootDir => {
                bail!("invalid path component in archive path '{archive_path}'");
            }
        }
    }

    Ok(result)
}

fn default_output(input: &Path) -> PathBuf {
    let mut name = input.with_extension("").into_os_string();
    name.push("_unpacked");
    PathBuf::from(name)
}

fn extract_file(
    archive: &Archive,
    raw: &[u8],
    inflater: &mut Inflater,
    out: &Path,
    name: &str,
    file: &FileEntry,
    overwrite: bool,
) -> eyre::Result<()> {
    let path = validate_extract_path(out, name)?;
    if !overwrite && path.exists() {
        log::debug!("Skipping existing file '{}'", path.display());
        return Ok(());
    }

    log::debug!(">> {name}");
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory '{}'", parent.display()))?;
    }

    let record = archive.file_data(raw, file)?;
    let contents = if archive.has_compressed_files() {
        inflater
            .unpack(record)
            .with_context(|| format!("failed to unpack '{name}'"))?
    } else {
        record
    };

    fs::write(&path, contents)
        .with_context(|| format!("failed to write file at '{}'", path.display()))
}

pub fn extract(opts: Options) -> eyre::Result<()> {
    let file = fs::File::open(&opts.input)
        .with_context(|| format!("failed to open archive '{}'", opts.input.display()))?;

    // SAFETY: The mapping is only read and dropped before `file`.
    // Archives are treated as read-only by us and by the game, so we
    // won't run into synchronization conflicts we need to account for.
    let mapping = unsafe { Mmap::map(&file)? };
    let raw: &[u8] = &mapping;

    log::info!("Reading header...");
    let archive = Archive::parse(&mut Cursor::new(raw))
        .with_context(|| format!("failed to parse archive '{}'", opts.input.display()))?;

    if archive.flags.unknown_bits() != 0 {
        log::warn!(
            "Unknown archive flags present! (things may blow up past this point) {:?}",
            archive.flags
        );
    }

    let out = opts.output.unwrap_or_else(|| default_output(&opts.input));

    log::info!("Writing files...");
    if archive.version.has_header_xml() {
        let xml = archive.header_xml.as_deref().unwrap_or_default();
        fs::create_dir_all(&out)?;
        fs::write(out.join(HEADER_FILE_NAME), xml).context("failed to write header file")?;
    }

    let selected: Vec<(String, &FileEntry)> = match &opts.filter {
        Some(pattern) => archive.iter_glob(pattern)?.collect(),
        None => archive
            .files
            .files()
            .map(|f| (archive.files.file_path(f), f))
            .collect(),
    };

    selected
        .par_iter()
        .try_for_each_init(Inflater::new, |inflater, (name, file)| {
            let name = if opts.lowercase {
                name.to_ascii_lowercase()
            } else {
                name.clone()
            };

            extract_file(&archive, raw, inflater, &out, &name, file, opts.overwrite)
        })?;

    log::info!("Done!");
    Ok(())
}
