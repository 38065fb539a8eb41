//! Resolve an index selection against a torrent into a download plan.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use rudder_core::{TorrentDetail, TorrentSummary};

use crate::error::{DownloadError, DownloadResult};

/// One file destined for the tar archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Absolute path on disk.
    pub source: PathBuf,
    /// Path recorded inside the archive, relative to the torrent root.
    pub entry_name: String,
}

/// What to send for a download request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadPlan {
    /// Exactly one file was selected; stream it verbatim.
    Single {
        /// Absolute path on disk.
        path: PathBuf,
        /// Attachment filename offered to the client.
        name: String,
    },
    /// Multiple files were selected; stream them as one tar archive.
    Archive {
        /// Entries in depth-first tree order.
        entries: Vec<ArchiveEntry>,
        /// Attachment filename offered to the client, `<torrent>.tar`.
        name: String,
    },
}

impl DownloadPlan {
    /// Resolve `indices` against the torrent's file tree.
    ///
    /// Indices are compared as strings; `None` selects every file. Files are
    /// collected depth-first, so archive order matches tree order.
    ///
    /// # Errors
    ///
    /// Fails when the selection matches no files.
    pub fn resolve(
        torrent: &TorrentSummary,
        detail: &TorrentDetail,
        indices: Option<&HashSet<String>>,
    ) -> DownloadResult<Self> {
        let selected = detail.file_tree.select_by_indices(indices);
        let base = Path::new(&torrent.directory);

        match selected.as_slice() {
            [] => Err(DownloadError::NoFilesSelected {
                hash: torrent.hash.clone(),
            }),
            [only] => Ok(Self::Single {
                path: base.join(&only.path),
                name: only.filename.clone(),
            }),
            files => Ok(Self::Archive {
                entries: files
                    .iter()
                    .map(|file| ArchiveEntry {
                        source: base.join(&file.path),
                        entry_name: file.path.clone(),
                    })
                    .collect(),
                name: format!("{}.tar", torrent.name),
            }),
        }
    }

    /// Attachment filename offered to the client.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Single { name, .. } | Self::Archive { name, .. } => name,
        }
    }

    /// Check that every planned file exists before streaming starts, so a
    /// missing file surfaces as a proper error instead of a torn response.
    ///
    /// # Errors
    ///
    /// Fails with the first missing file.
    pub fn verify(&self) -> DownloadResult<()> {
        let paths: Vec<&PathBuf> = match self {
            Self::Single { path, .. } => vec![path],
            Self::Archive { entries, .. } => entries.iter().map(|entry| &entry.source).collect(),
        };
        for path in paths {
            fs::metadata(path).map_err(|source| DownloadError::Missing {
                path: path.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rudder_core::{FileTree, FlatFile, StatusFlag};

    fn torrent(directory: &str) -> TorrentSummary {
        TorrentSummary {
            hash: "AAA".into(),
            name: "bundle".into(),
            directory: directory.into(),
            status: vec![StatusFlag::Complete, StatusFlag::Stopped],
            tags: vec![],
            size_bytes: 155,
            bytes_done: 155,
            down_rate: 0,
            up_rate: 0,
        }
    }

    fn detail() -> TorrentDetail {
        TorrentDetail {
            hash: "AAA".into(),
            file_tree: FileTree::from_flat(&[
                FlatFile {
                    index: 0,
                    path: "intro.mkv".into(),
                    size_bytes: 100,
                },
                FlatFile {
                    index: 1,
                    path: "extras/bonus.mkv".into(),
                    size_bytes: 50,
                },
                FlatFile {
                    index: 2,
                    path: "extras/notes.txt".into(),
                    size_bytes: 5,
                },
            ]),
            peers: vec![],
            trackers: vec![],
        }
    }

    fn selection(indices: &[&str]) -> HashSet<String> {
        indices.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn single_selection_streams_the_file_verbatim() -> DownloadResult<()> {
        let plan = DownloadPlan::resolve(
            &torrent("/downloads/bundle"),
            &detail(),
            Some(&selection(&["1"])),
        )?;
        assert_eq!(
            plan,
            DownloadPlan::Single {
                path: PathBuf::from("/downloads/bundle/extras/bonus.mkv"),
                name: "bonus.mkv".into(),
            }
        );
        Ok(())
    }

    #[test]
    fn multiple_selection_becomes_an_archive_in_tree_order() -> DownloadResult<()> {
        let plan = DownloadPlan::resolve(&torrent("/downloads/bundle"), &detail(), None)?;
        let DownloadPlan::Archive { entries, name } = plan else {
            panic!("expected an archive plan");
        };
        assert_eq!(name, "bundle.tar");
        let names: Vec<&str> = entries.iter().map(|e| e.entry_name.as_str()).collect();
        assert_eq!(names, vec!["intro.mkv", "extras/bonus.mkv", "extras/notes.txt"]);
        Ok(())
    }

    #[test]
    fn empty_selection_is_rejected() {
        let error = DownloadPlan::resolve(
            &torrent("/downloads/bundle"),
            &detail(),
            Some(&selection(&["99"])),
        )
        .expect_err("nothing selected");
        assert!(matches!(error, DownloadError::NoFilesSelected { hash } if hash == "AAA"));
    }

    #[test]
    fn verify_reports_the_missing_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("intro.mkv"), b"data")?;

        let plan = DownloadPlan::resolve(
            &torrent(&dir.path().to_string_lossy()),
            &detail(),
            Some(&selection(&["0"])),
        )?;
        plan.verify()?;

        let plan = DownloadPlan::resolve(
            &torrent(&dir.path().to_string_lossy()),
            &detail(),
            Some(&selection(&["0", "1"])),
        )?;
        let error = plan.verify().expect_err("bonus.mkv does not exist");
        assert!(
            matches!(error, DownloadError::Missing { path, .. } if path.ends_with("extras/bonus.mkv"))
        );
        Ok(())
    }
}
