use std::path::PathBuf;

use clap::{Args, Subcommand};
use duels_wad::Version;

use super::Command;

mod extract;
mod info;
mod pack;

/// The default name of the embedded XML header file.
pub const HEADER_FILE_NAME: &str = "@header.xml";

/// Subcommand for working with WAD archives.
#[derive(Debug, Args)]
pub struct Wad {
    #[clap(subcommand)]
    command: WadCommand,
}

#[derive(Debug, Subcommand)]
enum WadCommand {
    /// Packs a directory into a WAD archive.
    Pack {
        /// The path to the input directory to pack.
        ///
        /// The directory will be recursively scanned and all its
        /// subdirectories and files will be added to the archive.
        ///
        /// Note that this does not follow symbolic links.
        input: PathBuf,

        /// The optional output file to write the archive to.
        ///
        /// If missing, the input path with a `.wad` extension is used.
        #[clap(short)]
        output: Option<PathBuf>,

        /// Compresses the archived files with zlib.
        ///
        /// Files which do not shrink are stored uncompressed.
        #[clap(short, long)]
        compress: bool,

        /// Converts all archive paths to uppercase.
        #[clap(short, long)]
        uppercase: bool,

        /// The XML header file to embed into 0x202 archives.
        ///
        /// Relative paths are resolved against the input directory.
        #[clap(long, default_value = HEADER_FILE_NAME)]
        wad_header: PathBuf,

        /// The format version of the archive, decimal or 0x-prefixed hex.
        #[clap(long, default_value = "0x202", value_parser = parse_version)]
        wad_version: Version,
    },

    /// Unpacks all files in a given WAD archive into a directory.
    Unpack {
        /// The path to the archive file to unpack.
        input: PathBuf,

        /// The optional output directory for the unpacked files.
        ///
        /// If missing, the input path without extension and with an
        /// `_unpacked` suffix is used.
        #[clap(short)]
        output: Option<PathBuf>,

        /// Overwrites files which already exist in the output.
        #[clap(short = 'w', long)]
        overwrite: bool,

        /// Converts all extracted paths to lowercase.
        #[clap(short, long)]
        lowercase: bool,

        /// Only extracts files whose archive path matches this UNIX
        /// glob pattern.
        #[clap(long)]
        filter: Option<String>,
    },

    /// Prints the metadata of a WAD archive as JSON.
    Info {
        /// The path to the archive file to inspect.
        input: PathBuf,
    },
}

fn parse_version(s: &str) -> Result<Version, String> {
    let raw = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse(),
    }
    .map_err(|e| e.to_string())?;

    Version::try_from(raw).map_err(|e| e.to_string())
}

impl Command for Wad {
    fn handle(self) -> eyre::Result<()> {
        match self.command {
            WadCommand::Pack {
                input,
                output,
                compress,
                uppercase,
                wad_header,
                wad_version,
            } => pack::pack(pack::Options {
                input,
                output,
                compress,
                uppercase,
                header: wad_header,
                version: wad_version,
            }),

            WadCommand::Unpack {
                input,
                output,
                overwrite,
                lowercase,
                filter,
            } => extract::extract(extract::Options {
                input,
                output,
                overwrite,
                lowercase,
                filter,
            }),

            WadCommand::Info { input } => info::info(&input),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn pack_options(input: PathBuf, output: PathBuf, compress: bool) -> pack::Options {
        pack::Options {
            input,
            output: Some(output),
            compress,
            uppercase: false,
            header: PathBuf::from(HEADER_FILE_NAME),
            version: Version::V202,
        }
    }

    fn unpack_options(input: PathBuf, output: PathBuf) -> extract::Options {
        extract::Options {
            input,
            output: Some(output),
            overwrite: false,
            lowercase: false,
            filter: None,
        }
    }

    #[test]
    fn pack_unpack_repack() -> eyre::Result<()> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("input");
        fs::create_dir_all(input.join("DATA").join("CARDS"))?;
        fs::write(input.join(HEADER_FILE_NAME), b"")?;
        fs::write(input.join("ROOT.TXT"), b"top level")?;
        fs::write(
            input.join("DATA").join("CARDS").join("GOBLIN.XML"),
            b"<card/>".repeat(64),
        )?;

        for compress in [false, true] {
            let wad = dir.path().join(format!("packed_{compress}.wad"));
            let unpacked = dir.path().join(format!("unpacked_{compress}"));
            pack::pack(pack_options(input.clone(), wad.clone(), compress))?;
            extract::extract(unpack_options(wad, unpacked.clone()))?;

            // The empty header survives, so the output can be packed again.
            assert_eq!(fs::read(unpacked.join(HEADER_FILE_NAME))?, b"");
            assert_eq!(fs::read(unpacked.join("ROOT.TXT"))?, b"top level");
            assert_eq!(
                fs::read(unpacked.join("DATA").join("CARDS").join("GOBLIN.XML"))?,
                b"<card/>".repeat(64)
            );

            let repacked = dir.path().join(format!("repacked_{compress}.wad"));
            pack::pack(pack_options(unpacked, repacked.clone(), compress))?;
            assert!(fs::metadata(&repacked)?.len() > 0);
        }

        Ok(())
    }

    #[test]
    fn unpack_with_filter() -> eyre::Result<()> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("input");
        fs::create_dir_all(input.join("AUDIO"))?;
        fs::create_dir_all(input.join("DATA"))?;
        fs::write(input.join(HEADER_FILE_NAME), b"<wad/>")?;
        fs::write(input.join("AUDIO").join("THEME.OGG"), b"ogg")?;
        fs::write(input.join("DATA").join("DECK.XML"), b"deck")?;

        let wad = dir.path().join("filtered.wad");
        pack::pack(pack_options(input, wad.clone(), true))?;

        let unpacked = dir.path().join("unpacked");
        extract::extract(extract::Options {
            filter: Some("DATA/*".to_owned()),
            lowercase: true,
            ..unpack_options(wad, unpacked.clone())
        })?;

        assert_eq!(fs::read(unpacked.join(HEADER_FILE_NAME))?, b"<wad/>");
        assert_eq!(fs::read(unpacked.join("data").join("deck.xml"))?, b"deck");
        assert!(!unpacked.join("audio").exists());

        Ok(())
    }

    #[test]
    fn version_arguments() {
        assert_eq!(parse_version("0x202"), Ok(Version::V202));
        assert_eq!(parse_version("513"), Ok(Version::V201));
        assert!(parse_version("0x199").is_err());
        assert!(parse_version("wad").is_err());
    }
}
