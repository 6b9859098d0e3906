use std::{
    collections::BTreeMap,
    fs,
    io::BufWriter,
    path::{Path, PathBuf},
};

use duels_wad::{ArchiveBuilder, ArchiveFlags, Deflater, FileId, Version};
use eyre::{bail, Context};
use rayon::prelude::*;

// Number of files read and compressed concurrently before their
// records are appended to the archive.
const BATCH_SIZE: usize = 64;

pub struct Options {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub compress: bool,
    pub uppercase: bool,
    pub header: PathBuf,
    pub version: Version,
}

struct PendingFile {
    id: FileId,
    name: String,
    path: PathBuf,
}

fn archive_name(base: &Path, path: &Path, uppercase: bool) -> eyre::Result<String> {
    let relative = path.strip_prefix(base)?;

    let mut components = Vec::new();
    for component in relative.components() {
        match component.as_os_str().to_str() {
            Some(c) => components.push(c),
            None => bail!("path '{}' is not valid Unicode", path.display()),
        }
    }

    let name = components.join("/");
    Ok(if uppercase { name.to_ascii_uppercase() } else { name })
}

fn collect_files(
    input: &Path,
    header: &Path,
    uppercase: bool,
) -> eyre::Result<BTreeMap<String, PathBuf>> {
    let mut files = BTreeMap::new();

    for entry in walkdir::WalkDir::new(input) {
        let entry = entry.context("failed to query input directory")?;
        if !entry
            .metadata()
            .context("failed to obtain metadata for path")?
            .is_file()
        {
            continue;
        }

        let path = entry.path();
        if path == header {
            continue;
        }

        let name = archive_name(input, path, uppercase)?;
        if files.contains_key(&name) {
            log::warn!("Skipping '{}' which collides with '{name}'", path.display());
            continue;
        }

        files.insert(name, path.to_path_buf());
    }

    Ok(files)
}

fn read_record(
    deflater: &mut Deflater,
    file: &PendingFile,
    compress: bool,
) -> eyre::Result<Vec<u8>> {
    let contents = fs::read(&file.path)
        .with_context(|| format!("failed to read file at '{}'", file.path.display()))?;
    if !compress {
        return Ok(contents);
    }

    let mut record = Vec::with_capacity(contents.len() + 4);
    deflater
        .pack(&contents, &mut record)
        .with_context(|| format!("failed to compress '{}'", file.name))?;

    Ok(record)
}

fn write_archive(
    builder: ArchiveBuilder,
    files: &[PendingFile],
    output: &Path,
    compress: bool,
) -> eyre::Result<()> {
    let out = fs::File::create(output)
        .with_context(|| format!("failed to create output archive at '{}'", output.display()))?;

    log::info!("Writing stub header...");
    let mut writer = builder.begin(BufWriter::new(out))?;

    log::info!("Writing file data...");
    for batch in files.chunks(BATCH_SIZE) {
        let records = batch
            .par_iter()
            .map_init(Deflater::new, |deflater, file| {
                read_record(deflater, file, compress)
            })
            .collect::<eyre::Result<Vec<_>>>()?;

        // Records reach the output in the order the files were added.
        for (file, record) in batch.iter().zip(records) {
            log::debug!(">> {}", file.name);
            writer.write_stored(file.id, &record)?;
        }
    }

    log::info!("Writing header...");
    writer.finish()?;

    Ok(())
}

pub fn pack(opts: Options) -> eyre::Result<()> {
    if !opts.input.is_dir() {
        bail!("input for packing must be a directory");
    }

    let input = opts
        .input
        .canonicalize()
        .context("failed to resolve input directory")?;
    let output = opts.output.unwrap_or_else(|| input.with_extension("wad"));

    if !matches!(opts.version, Version::V201 | Version::V202) {
        log::warn!("Unexpected WAD version {} specified", opts.version);
    }

    let mut flags = ArchiveFlags::UNKNOWN6_OBSERVED | ArchiveFlags::HAS_DATA_TYPES;
    if opts.compress {
        flags |= ArchiveFlags::HAS_COMPRESSED_FILES;
    }

    let header = input.join(&opts.header);
    let header = header.canonicalize().unwrap_or(header);

    let mut builder = ArchiveBuilder::new(opts.version, flags);
    if opts.version.has_header_xml() {
        let xml = fs::read(&header).with_context(|| {
            format!("could not read header file at '{}'", header.display())
        })?;
        builder = builder.with_header_xml(xml);
    }

    log::info!("Collecting files...");
    let mut files = Vec::new();
    for (name, path) in collect_files(&input, &header, opts.uppercase)? {
        let id = builder
            .add_file(&name)
            .with_context(|| format!("failed to add '{name}' to the archive"))?;
        files.push(PendingFile { id, name, path });
    }
    log::debug!("Collected {} files", files.len());

    // A partially written archive is useless, so don't leave it around.
    if let Err(e) = write_archive(builder, &files, &output, opts.compress) {
        let _ = fs::remove_file(&output);
        return Err(e);
    }

    log::info!("Done!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_names() {
        let base = Path::new("input");
        let path = base.join("data").join("cards").join("goblin.xml");

        assert_eq!(
            archive_name(base, &path, false).unwrap(),
            "data/cards/goblin.xml"
        );
        assert_eq!(
            archive_name(base, &path, true).unwrap(),
            "DATA/CARDS/GOBLIN.XML"
        );
        assert!(archive_name(Path::new("elsewhere"), &path, false).is_err());

        // Case mapping never changes the length of a name.
        let path = base.join("straße.xml");
        assert_eq!(archive_name(base, &path, true).unwrap(), "STRAßE.XML");
    }
}
