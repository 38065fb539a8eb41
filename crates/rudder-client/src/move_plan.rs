//! Relocation plan: an enumerated stage sequence computed up front.

use rudder_core::TorrentSummary;
use serde::{Deserialize, Serialize};

use crate::types::MoveOptions;

/// One stage of a relocation. Stages always execute in declaration order;
/// [`MoveStage::MoveData`] and [`MoveStage::Restart`] appear only when the
/// plan calls for them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MoveStage {
    /// Stop and close every torrent being moved.
    Stop,
    /// Point the torrents at the new directory.
    SetPath,
    /// Move payload data on the daemon host's filesystem.
    MoveData,
    /// Re-verify payload data at the new location.
    CheckHash,
    /// Restart the torrents that were running before the move.
    Restart,
}

/// Fully-resolved relocation plan for one batch of torrents.
///
/// The restart subset is computed from cached status before anything stops,
/// so torrents that were already stopped stay stopped after the move.
#[derive(Debug, Clone)]
pub struct MovePlan {
    /// Stages to execute, in order.
    pub stages: Vec<MoveStage>,
    /// Every torrent being moved.
    pub hashes: Vec<String>,
    /// Subset of `hashes` that was running when the plan was built.
    pub restart: Vec<String>,
    /// Payload names parallel to `hashes`, for the data move.
    pub filenames: Vec<String>,
    /// Current directories parallel to `hashes`, for the data move.
    pub sources: Vec<String>,
    /// New storage directory.
    pub destination: String,
    /// Treat the destination as the torrent's base path.
    pub is_base_path: bool,
}

impl MovePlan {
    /// Build a plan from the cached rows of the torrents being moved.
    #[must_use]
    pub fn build(torrents: &[TorrentSummary], options: &MoveOptions) -> Self {
        let hashes: Vec<String> = torrents.iter().map(|t| t.hash.clone()).collect();
        let restart: Vec<String> = torrents
            .iter()
            .filter(|t| !t.is_stopped())
            .map(|t| t.hash.clone())
            .collect();
        let filenames = torrents.iter().map(|t| t.name.clone()).collect();
        let sources = torrents.iter().map(|t| t.directory.clone()).collect();

        let mut stages = vec![MoveStage::Stop, MoveStage::SetPath];
        if options.move_data {
            stages.push(MoveStage::MoveData);
        }
        stages.push(MoveStage::CheckHash);
        if !restart.is_empty() {
            stages.push(MoveStage::Restart);
        }

        Self {
            stages,
            hashes,
            restart,
            filenames,
            sources,
            destination: options.destination.clone(),
            is_base_path: options.is_base_path,
        }
    }
}
