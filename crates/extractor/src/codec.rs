//! Codec capabilities: the decoders the dispatcher routes archives to.
//!
//! Each codec receives an archive path and an existing destination directory
//! and writes every entry beneath it. Partial output is left in place when
//! decoding fails.

use crate::error::ExtractError;
use crate::format::{stem, ArchiveFormat};
use crate::safety::resolve_entry;
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::Path;
use tracing::{debug, warn};

/// A decoding capability for one or more archive formats.
pub trait Codec: Send + Sync {
    /// Decode `source` into `dest`, which must already exist.
    fn extract(&self, format: ArchiveFormat, source: &Path, dest: &Path)
        -> Result<(), ExtractError>;
}

/// ZIP decoder backed by the `zip` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipCodec;

impl Codec for ZipCodec {
    fn extract(
        &self,
        _format: ArchiveFormat,
        source: &Path,
        dest: &Path,
    ) -> Result<(), ExtractError> {
        let file = File::open(source)?;
        let mut archive = zip::ZipArchive::new(BufReader::new(file)).map_err(map_zip_error)?;
        debug!(entries = archive.len(), "Opened ZIP archive");
        archive.extract(dest).map_err(map_zip_error)
    }
}

fn map_zip_error(e: zip::result::ZipError) -> ExtractError {
    use zip::result::ZipError;

    match e {
        ZipError::Io(err) => ExtractError::from_archive_io(err),
        ZipError::InvalidArchive(msg) => ExtractError::BadArchive(msg.to_string()),
        ZipError::UnsupportedArchive(msg) => ExtractError::MissingCodec(msg.to_string()),
        other => ExtractError::BadArchive(other.to_string()),
    }
}

/// 7z decoder backed by `sevenz-rust2`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SevenZipCodec;

impl Codec for SevenZipCodec {
    fn extract(
        &self,
        _format: ArchiveFormat,
        source: &Path,
        dest: &Path,
    ) -> Result<(), ExtractError> {
        // Surface unreadable sources as filesystem errors before decoding
        File::open(source)?;
        sevenz_rust2::decompress_file(source, dest).map_err(map_7z_error)
    }
}

fn map_7z_error(e: sevenz_rust2::Error) -> ExtractError {
    use sevenz_rust2::Error;

    match e {
        Error::Io(err, _) | Error::FileOpen(err, _) => ExtractError::from_archive_io(err),
        Error::UnsupportedCompressionMethod(method) => ExtractError::MissingCodec(method),
        Error::Unsupported(what) => ExtractError::MissingCodec(what.to_string()),
        Error::ExternalUnsupported => {
            ExtractError::MissingCodec("external 7z headers".to_string())
        }
        other => ExtractError::BadArchive(other.to_string()),
    }
}

/// Multi-format decoder for RAR, TAR, GZIP and BZIP2.
///
/// GZIP and BZIP2 streams whose stem ends in `.tar` are unpacked as tarballs;
/// anything else is written out as a single decompressed file named after the
/// stem.
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericCodec;

impl Codec for GenericCodec {
    fn extract(
        &self,
        format: ArchiveFormat,
        source: &Path,
        dest: &Path,
    ) -> Result<(), ExtractError> {
        match format {
            ArchiveFormat::Rar => extract_rar(source, dest),
            ArchiveFormat::Tar => {
                let reader = BufReader::new(File::open(source)?);
                unpack_tar(reader, dest, "TAR")
            }
            ArchiveFormat::Gzip => {
                let reader = flate2::read::GzDecoder::new(BufReader::new(File::open(source)?));
                unpack_stream(reader, source, dest, "GZIP")
            }
            ArchiveFormat::Bzip2 => {
                let reader = bzip2::read::BzDecoder::new(BufReader::new(File::open(source)?));
                unpack_stream(reader, source, dest, "BZIP2")
            }
            ArchiveFormat::Zip | ArchiveFormat::SevenZip => Err(ExtractError::MissingCodec(
                format!("generic decoder does not handle {}", format),
            )),
        }
    }
}

fn unpack_tar<R: Read>(reader: R, dest: &Path, label: &'static str) -> Result<(), ExtractError> {
    tar::Archive::new(reader)
        .unpack(dest)
        .map_err(|e| ExtractError::from_decode_io(label, e))
}

/// Decompress a single-stream format, unpacking it as a tarball when the
/// name says so.
fn unpack_stream<R: Read>(
    mut reader: R,
    source: &Path,
    dest: &Path,
    label: &'static str,
) -> Result<(), ExtractError> {
    let inner_name = stem(source);

    if inner_name.to_ascii_lowercase().ends_with(".tar") {
        debug!(archive = %source.display(), "Unpacking compressed tarball");
        return unpack_tar(reader, dest, label);
    }

    let target = dest.join(&inner_name);
    let mut out = File::create(&target)?;
    io::copy(&mut reader, &mut out).map_err(|e| ExtractError::from_decode_io(label, e))?;
    Ok(())
}

fn extract_rar(source: &Path, dest: &Path) -> Result<(), ExtractError> {
    File::open(source)?;

    let mut archive = unrar::Archive::new(source)
        .open_for_processing()
        .map_err(rar_error)?;

    while let Some(header) = archive.read_header().map_err(rar_error)? {
        let entry = header.entry();
        let name = entry.filename.clone();

        let target = match resolve_entry(dest, &name) {
            Ok(target) => target,
            Err(e) => {
                warn!(archive = %source.display(), "Skipping unsafe RAR entry: {}", e);
                archive = header.skip().map_err(rar_error)?;
                continue;
            }
        };

        archive = if entry.is_directory() {
            fs::create_dir_all(&target)?;
            header.skip().map_err(rar_error)?
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            header.extract_to(&target).map_err(rar_error)?
        };
    }

    Ok(())
}

fn rar_error(e: unrar::error::UnrarError) -> ExtractError {
    ExtractError::Decode {
        format: "RAR",
        message: e.to_string(),
    }
}
