//! Vendoring of pinned Temml release artifacts.
//!
//! The build-support binary (`texglue-vendor`) drives [`run`]: read the
//! release tag from the `TEMML-VERSION` pin file, wipe and recreate the
//! vendor directory, download the license and the tagged source tarball from
//! upstream, and extract exactly four build artifacts flat into the vendor
//! directory. On success the directory holds five files: `LICENSE` plus the
//! four artifact basenames.
//!
//! There are no retries and no partial-state cleanup: the first failing step
//! aborts the run, which may leave the vendor directory empty or incomplete
//! (the wipe happens up front). Re-running after a success produces an
//! identical directory listing.
//!
//! Every artifact's SHA-256 digest is computed and logged; a JSON manifest
//! of expected digests can be supplied to turn that into a hard check.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use itertools::Itertools;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::errors::{GlueError, Result};

/// Sidecar file (relative to the project root) holding the pinned release
/// tag, e.g. `0.11.02`.
pub const VERSION_PIN_FILE: &str = "TEMML-VERSION";

/// Vendor directory (relative to the project root), destroyed and recreated
/// on every run.
pub const VENDOR_DIR: &str = "vendor/temml";

/// Name the fetched license is stored under.
pub const LICENSE_FILE: &str = "LICENSE";

/// The four artifact paths extracted from the release archive, relative to
/// the archive's top-level directory. They are written flat (basename only)
/// into the vendor directory.
pub const ARTIFACT_PATHS: [&str; 4] = [
    "dist/temml.min.js",
    "contrib/mhchem/mhchem.min.js",
    "contrib/texvc/texvc.min.js",
    "contrib/physics/physics.js",
];

/// Default host for release archives.
pub const UPSTREAM_REPO: &str = "https://github.com/ronkok/Temml";

/// Default host for raw file fetches (the license).
pub const UPSTREAM_RAW: &str = "https://raw.githubusercontent.com/ronkok/Temml";

/// URL of the tagged source archive for a release, under the given base.
pub fn tarball_url_at(base: &str, version: &str) -> String {
    format!("{base}/archive/refs/tags/v{version}.tar.gz")
}

/// URL of the tagged source archive for a release.
pub fn tarball_url(version: &str) -> String {
    tarball_url_at(UPSTREAM_REPO, version)
}

/// URL of the license file under the given base, pinned to the same tag as
/// the tarball.
pub fn license_url_at(base: &str, version: &str) -> String {
    format!("{base}/v{version}/LICENSE")
}

/// URL of the license file, pinned to the same tag as the tarball.
pub fn license_url(version: &str) -> String {
    license_url_at(UPSTREAM_RAW, version)
}

/// Reject version strings that are empty or could not be a release tag
/// (whitespace, path separators, parent references).
pub fn validate_version(version: &str) -> Result<()> {
    if version.is_empty() {
        return Err(GlueError::Version("empty version pin".to_owned()));
    }
    if version.chars().any(char::is_whitespace)
        || version.contains('/')
        || version.contains('\\')
        || version.contains("..")
    {
        return Err(GlueError::Version(format!(
            "release tag contains unexpected characters: {version:?}"
        )));
    }
    Ok(())
}

/// Read and validate the release tag from the pin file. Surrounding
/// whitespace (trailing newline in particular) is trimmed.
pub fn read_version_pin(path: &Path) -> Result<String> {
    let raw = fs::read_to_string(path).map_err(|e| GlueError::Io {
        step: "read version pin",
        source: e,
    })?;
    let version = raw.trim();
    validate_version(version)?;
    Ok(version.to_owned())
}

/// Destroy and recreate the vendor directory. Never merges with prior
/// contents; a missing directory is not an error.
pub fn reset_vendor_dir(dir: &Path) -> Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(GlueError::Io {
                step: "clear vendor directory",
                source: e,
            })
        }
    }
    fs::create_dir_all(dir).map_err(|e| GlueError::Io {
        step: "create vendor directory",
        source: e,
    })
}

/// Hex-encoded SHA-256 digest.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// One file written into the vendor directory.
#[derive(Clone, Debug)]
pub struct FetchedFile {
    /// Basename within the vendor directory.
    pub name: String,
    pub len: u64,
    pub sha256: String,
}

/// Expected digests, loaded from a JSON object mapping vendored file names
/// to hex SHA-256 strings.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct Checksums {
    entries: HashMap<String, String>,
}

impl Checksums {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read(path).map_err(|e| GlueError::Io {
            step: "read checksum manifest",
            source: e,
        })?;
        serde_json::from_slice(&raw).map_err(|e| GlueError::Manifest(e.to_string()))
    }

    /// Names of fetched files the manifest does not cover.
    pub fn unverified<'a>(&self, files: &'a [FetchedFile]) -> Vec<&'a str> {
        files
            .iter()
            .filter(|f| !self.entries.contains_key(&f.name))
            .map(|f| f.name.as_str())
            .collect()
    }

    /// Check every manifest entry against the fetched files. A manifest
    /// entry naming a file that was not fetched is an error; fetched files
    /// absent from the manifest pass unchecked, but are called out in the
    /// log so a partial manifest does not overstate the check.
    pub fn verify(&self, files: &[FetchedFile]) -> Result<()> {
        let unverified = self.unverified(files);
        if !unverified.is_empty() {
            warn!(
                "files not covered by checksum manifest: {}",
                unverified.iter().join(", ")
            );
        }
        for (name, expected) in &self.entries {
            let Some(file) = files.iter().find(|f| &f.name == name) else {
                return Err(GlueError::Manifest(format!(
                    "manifest names unknown file {name:?}"
                )));
            };
            if !expected.eq_ignore_ascii_case(&file.sha256) {
                return Err(GlueError::Checksum {
                    file: name.clone(),
                    expected: expected.clone(),
                    actual: file.sha256.clone(),
                });
            }
        }
        Ok(())
    }
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Extract the four pinned artifacts from a gzipped release tarball into
/// `dest`, stripping the archive's top-level directory component and any
/// intermediate directories. Fails if any artifact is absent.
pub fn extract_artifacts(archive: &[u8], dest: &Path) -> Result<Vec<FetchedFile>> {
    let io_err = |source| GlueError::Io {
        step: "read release archive",
        source,
    };

    let mut found: Vec<Option<FetchedFile>> = ARTIFACT_PATHS.iter().map(|_| None).collect();
    let mut tar = tar::Archive::new(GzDecoder::new(archive));
    for entry in tar.entries().map_err(io_err)? {
        let mut entry = entry.map_err(io_err)?;
        let path = entry.path().map_err(io_err)?.into_owned();
        // Strip the `Temml-<version>/` top-level component.
        let rel: PathBuf = path.components().skip(1).collect();
        let Some(idx) = ARTIFACT_PATHS
            .iter()
            .position(|want| Path::new(want) == rel.as_path())
        else {
            continue;
        };
        let mut buf = Vec::new();
        entry.read_to_end(&mut buf).map_err(io_err)?;
        let name = basename(ARTIFACT_PATHS[idx]).to_owned();
        fs::write(dest.join(&name), &buf).map_err(|e| GlueError::Io {
            step: "write vendored artifact",
            source: e,
        })?;
        found[idx] = Some(FetchedFile {
            name,
            len: buf.len() as u64,
            sha256: sha256_hex(&buf),
        });
    }

    let mut files = Vec::with_capacity(ARTIFACT_PATHS.len());
    for (idx, slot) in found.into_iter().enumerate() {
        match slot {
            Some(file) => files.push(file),
            None => return Err(GlueError::MissingEntry(ARTIFACT_PATHS[idx].to_owned())),
        }
    }
    Ok(files)
}

/// Blocking GET; redirects are followed, any non-success status is an error.
pub fn download(client: &reqwest::blocking::Client, url: &str) -> Result<Vec<u8>> {
    let wrap = |source| GlueError::Download {
        url: url.to_owned(),
        source,
    };
    let response = client.get(url).send().map_err(wrap)?;
    let response = response.error_for_status().map_err(wrap)?;
    Ok(response.bytes().map_err(wrap)?.to_vec())
}

/// Parameters for one vendor-fetch run.
#[derive(Clone, Debug)]
pub struct FetchJob {
    /// Project root holding the version pin file and the vendor directory.
    pub root: PathBuf,
    /// Release tag override; when unset the pin file is read.
    pub tag: Option<String>,
    /// Optional path to a checksum manifest to verify against.
    pub checksums: Option<PathBuf>,
    /// Archive host override (mirrors, tests); defaults to [`UPSTREAM_REPO`].
    pub repo_base: Option<String>,
    /// Raw-file host override (mirrors, tests); defaults to [`UPSTREAM_RAW`].
    pub raw_base: Option<String>,
}

/// Outcome of a successful run.
#[derive(Clone, Debug)]
pub struct FetchReport {
    pub version: String,
    pub vendor_dir: PathBuf,
    /// The five vendored files (license first).
    pub files: Vec<FetchedFile>,
}

/// Run the full fetch: resolve the root, read the pin, reset the vendor
/// directory, download license and tarball, extract the artifacts, and
/// verify digests when a manifest was given.
pub fn run(job: &FetchJob) -> Result<FetchReport> {
    let root = job.root.canonicalize().map_err(|e| GlueError::Io {
        step: "resolve project root",
        source: e,
    })?;

    let version = match &job.tag {
        Some(tag) => {
            validate_version(tag)?;
            tag.clone()
        }
        None => read_version_pin(&root.join(VERSION_PIN_FILE))?,
    };
    info!(%version, "vendoring Temml release");

    let vendor_dir = root.join(VENDOR_DIR);
    reset_vendor_dir(&vendor_dir)?;
    info!(dir = %vendor_dir.display(), "vendor directory reset");

    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("texglue-vendor/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let raw_base = job.raw_base.as_deref().unwrap_or(UPSTREAM_RAW);
    let license_url = license_url_at(raw_base, &version);
    info!(url = %license_url, "fetching license");
    let license = download(&client, &license_url)?;
    fs::write(vendor_dir.join(LICENSE_FILE), &license).map_err(|e| GlueError::Io {
        step: "write license",
        source: e,
    })?;

    let repo_base = job.repo_base.as_deref().unwrap_or(UPSTREAM_REPO);
    let tarball_url = tarball_url_at(repo_base, &version);
    info!(url = %tarball_url, "fetching release archive");
    let tarball = download(&client, &tarball_url)?;
    info!(
        bytes = tarball.len(),
        sha256 = %sha256_hex(&tarball),
        "release archive downloaded"
    );

    let mut files = vec![FetchedFile {
        name: LICENSE_FILE.to_owned(),
        len: license.len() as u64,
        sha256: sha256_hex(&license),
    }];
    files.extend(extract_artifacts(&tarball, &vendor_dir)?);

    if let Some(manifest_path) = &job.checksums {
        Checksums::load(manifest_path)?.verify(&files)?;
        info!(manifest = %manifest_path.display(), "checksums verified");
    }

    for file in &files {
        info!(name = %file.name, len = file.len, sha256 = %file.sha256, "vendored");
    }
    info!(
        "vendored files: {}",
        files.iter().map(|f| f.name.as_str()).join(", ")
    );

    Ok(FetchReport {
        version,
        vendor_dir,
        files,
    })
}
