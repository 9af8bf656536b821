//! Resource loading: turns a URI-like string into bytes, from one of
//! three sources, with transparent gzip/zip unwrapping (spec.md §6,
//! grounded on `original_source/resources.go`'s `LoadResource`).

use std::io::Read;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ResourceError;

const INTERNAL_PREFIX: &str = "<internal>/";
const HTTP_PREFIX: &str = "http://";
const HTTPS_PREFIX: &str = "https://";

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const ZIP_MAGIC: [u8; 4] = [b'P', b'K', 0x03, 0x04];

/// Where a resource string points. `FromStr` never fails — anything that
/// isn't `<internal>/...` or `http(s)://...` is a filesystem path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceUri {
    Internal(String),
    Http(String),
    FilePath(PathBuf),
}

impl FromStr for ResourceUri {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix('"').and_then(|s| s.strip_suffix('"')).unwrap_or(s);

        if let Some(rest) = s.strip_prefix(INTERNAL_PREFIX) {
            return Ok(ResourceUri::Internal(rest.to_string()));
        }
        if s.starts_with(HTTP_PREFIX) || s.starts_with(HTTPS_PREFIX) {
            return Ok(ResourceUri::Http(s.to_string()));
        }

        let expanded = if let Some(rest) = s.strip_prefix('~') {
            dirs::home_dir().map(|home| home.join(rest.trim_start_matches('/'))).unwrap_or_else(|| PathBuf::from(s))
        } else {
            PathBuf::from(s)
        };
        Ok(ResourceUri::FilePath(expanded))
    }
}

/// The names this crate embeds directly into the binary via
/// `include_bytes!`. There is no Disk II boot PROM or Apple firmware ROM
/// here — those are copyrighted and must be supplied externally through
/// `--rom`/`--disk*` pointing at a file or URL.
fn internal_resource(name: &str) -> Result<&'static [u8], ResourceError> {
    Err(ResourceError::NotFound(format!("<internal>/{name}")))
}

/// Loads a resource, returning its bytes and whether the backing store is
/// writable (filesystem paths are; embedded resources and HTTP responses
/// aren't).
pub fn load_resource(uri: &ResourceUri) -> Result<(Vec<u8>, bool), ResourceError> {
    let (mut data, mut writeable) = match uri {
        ResourceUri::Internal(name) => (internal_resource(name)?.to_vec(), false),
        ResourceUri::Http(url) => {
            let response = reqwest::blocking::get(url).map_err(|e| ResourceError::Http(e.to_string()))?;
            let bytes = response.bytes().map_err(|e| ResourceError::Http(e.to_string()))?;
            (bytes.to_vec(), false)
        }
        ResourceUri::FilePath(path) => {
            let data = std::fs::read(path)?;
            (data, true)
        }
    };

    if data.len() >= 2 && data[0..2] == GZIP_MAGIC {
        writeable = false;
        data = decompress_gzip(&data)?;
    } else if data.len() >= 4 && data[0..4] == ZIP_MAGIC {
        writeable = false;
        data = extract_first_diskette(&data)?.unwrap_or(data);
    }

    Ok((data, writeable))
}

fn decompress_gzip(data: &[u8]) -> Result<Vec<u8>, ResourceError> {
    let mut decoder = flate2::read::GzDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out).map_err(ResourceError::Io)?;
    Ok(out)
}

/// Walks a zip archive's members and returns the first one that looks
/// like a disk image (WOZ/NIB/DSK/PO magic or a plausible raw image
/// size), matching `resources.go`'s `storage.IsDiskette` sniff.
fn extract_first_diskette(data: &[u8]) -> Result<Option<Vec<u8>>, ResourceError> {
    let reader = std::io::Cursor::new(data);
    let mut archive = zip::ZipArchive::new(reader).map_err(|e| ResourceError::UnsupportedFormat(e.to_string()))?;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| ResourceError::UnsupportedFormat(e.to_string()))?;
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes).map_err(ResourceError::Io)?;
        if looks_like_diskette(&bytes) {
            return Ok(Some(bytes));
        }
    }
    Ok(None)
}

fn looks_like_diskette(bytes: &[u8]) -> bool {
    if bytes.len() >= 4 && (bytes[0..4] == *b"WOZ1" || bytes[0..4] == *b"WOZ2") {
        return true;
    }
    matches!(bytes.len(), 113_664 | 143_360 | 116_480 | 232_960)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_internal_uri() {
        assert_eq!(ResourceUri::from_str("<internal>/Apple2CardFirmware.bin").unwrap(), ResourceUri::Internal("Apple2CardFirmware.bin".into()));
    }

    #[test]
    fn parses_http_uri() {
        assert_eq!(ResourceUri::from_str("https://example.com/disk.woz").unwrap(), ResourceUri::Http("https://example.com/disk.woz".into()));
    }

    #[test]
    fn strips_surrounding_quotes() {
        assert_eq!(ResourceUri::from_str("\"disk.woz\"").unwrap(), ResourceUri::FilePath(PathBuf::from("disk.woz")));
    }

    #[test]
    fn plain_path_is_filesystem() {
        assert_eq!(ResourceUri::from_str("disk.woz").unwrap(), ResourceUri::FilePath(PathBuf::from("disk.woz")));
    }

    #[test]
    fn recognizes_woz_magic_as_diskette() {
        assert!(looks_like_diskette(b"WOZ2\xff\x0a\x0d\x0a"));
        assert!(!looks_like_diskette(b"not a disk"));
    }
}
