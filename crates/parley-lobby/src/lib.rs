//! The lobby directory: a JSON file listing the public rooms on a host.
//!
//! Several room processes share one file, each registering itself on
//! startup and keeping its member count current. Clients read the file to
//! discover rooms. The file is the single source of truth — there is no
//! lobby server.
//!
//! Every operation is a full read-modify-write of the file. A missing or
//! corrupt file always reads as an empty directory, so a bad write by one
//! room never wedges the others.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

mod error;

pub use error::LobbyError;

/// One public room as advertised in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomListing {
    /// Display name of the room.
    pub name: String,
    /// TCP port the room listens on. Listings are keyed by port.
    pub port: u16,
    /// Current member count.
    pub members: u32,
    /// Member capacity; `0` means unlimited.
    pub max: u32,
}

/// Handle to the shared directory file.
#[derive(Debug, Clone)]
pub struct LobbyDirectory {
    path: PathBuf,
}

impl LobbyDirectory {
    /// Points at a directory file. The file need not exist yet; the first
    /// [`add`](Self::add) creates it.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The path of the directory file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads all listings. A missing or corrupt file is an empty lobby.
    pub fn read(&self) -> Vec<RoomListing> {
        let Ok(raw) = fs::read_to_string(&self.path) else {
            return Vec::new();
        };
        match serde_json::from_str(&raw) {
            Ok(listings) => listings,
            Err(error) => {
                tracing::warn!(path = %self.path.display(), %error, "corrupt lobby file, treating as empty");
                Vec::new()
            }
        }
    }

    /// Registers a room. Idempotent per port: an existing listing on the
    /// same port is replaced, with its member count reset to zero.
    pub fn add(&self, name: &str, port: u16, max: u32) -> Result<(), LobbyError> {
        let mut listings = self.read();
        listings.retain(|listing| listing.port != port);
        listings.push(RoomListing {
            name: name.to_owned(),
            port,
            members: 0,
            max,
        });
        self.write(&listings)
    }

    /// Removes the listing for a port, if present.
    pub fn remove(&self, port: u16) -> Result<(), LobbyError> {
        let mut listings = self.read();
        listings.retain(|listing| listing.port != port);
        self.write(&listings)
    }

    /// Adjusts a listing's member count by `delta`, clamping at zero.
    /// A port with no listing is ignored.
    pub fn update_count(&self, port: u16, delta: i32) -> Result<(), LobbyError> {
        let mut listings = self.read();
        for listing in &mut listings {
            if listing.port == port {
                listing.members = listing.members.saturating_add_signed(delta);
            }
        }
        self.write(&listings)
    }

    fn write(&self, listings: &[RoomListing]) -> Result<(), LobbyError> {
        let encoded = serde_json::to_string_pretty(listings)?;
        fs::write(&self.path, encoded)?;
        Ok(())
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// A directory file in a unique temp location, removed on drop.
    struct TempLobby {
        dir: LobbyDirectory,
    }

    impl TempLobby {
        fn new(tag: &str) -> Self {
            let path = std::env::temp_dir().join(format!(
                "parley-lobby-{tag}-{}.json",
                std::process::id()
            ));
            let _ = fs::remove_file(&path);
            Self {
                dir: LobbyDirectory::new(path),
            }
        }
    }

    impl Drop for TempLobby {
        fn drop(&mut self) {
            let _ = fs::remove_file(self.dir.path());
        }
    }

    #[test]
    fn test_read_missing_file_is_empty() {
        let lobby = TempLobby::new("missing");
        assert!(lobby.dir.read().is_empty());
    }

    #[test]
    fn test_read_corrupt_file_is_empty() {
        let lobby = TempLobby::new("corrupt");
        fs::write(lobby.dir.path(), "{not json").unwrap();
        assert!(lobby.dir.read().is_empty());
    }

    #[test]
    fn test_add_then_read_round_trips() {
        let lobby = TempLobby::new("add");
        lobby.dir.add("General", 9100, 8).unwrap();

        let listings = lobby.dir.read();
        assert_eq!(
            listings,
            vec![RoomListing {
                name: "General".into(),
                port: 9100,
                members: 0,
                max: 8,
            }]
        );
    }

    #[test]
    fn test_add_same_port_replaces_listing() {
        // A room restarting on the same port takes over its old slot with
        // a fresh count rather than duplicating it.
        let lobby = TempLobby::new("replace");
        lobby.dir.add("Old", 9100, 8).unwrap();
        lobby.dir.update_count(9100, 3).unwrap();
        lobby.dir.add("New", 9100, 16).unwrap();

        let listings = lobby.dir.read();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].name, "New");
        assert_eq!(listings[0].members, 0);
        assert_eq!(listings[0].max, 16);
    }

    #[test]
    fn test_remove_deletes_only_that_port() {
        let lobby = TempLobby::new("remove");
        lobby.dir.add("One", 9100, 0).unwrap();
        lobby.dir.add("Two", 9101, 0).unwrap();
        lobby.dir.remove(9100).unwrap();

        let listings = lobby.dir.read();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].port, 9101);
    }

    #[test]
    fn test_update_count_tracks_joins_and_leaves() {
        let lobby = TempLobby::new("count");
        lobby.dir.add("General", 9100, 8).unwrap();
        lobby.dir.update_count(9100, 1).unwrap();
        lobby.dir.update_count(9100, 1).unwrap();
        lobby.dir.update_count(9100, -1).unwrap();

        assert_eq!(lobby.dir.read()[0].members, 1);
    }

    #[test]
    fn test_update_count_clamps_at_zero() {
        let lobby = TempLobby::new("clamp");
        lobby.dir.add("General", 9100, 8).unwrap();
        lobby.dir.update_count(9100, -5).unwrap();

        assert_eq!(lobby.dir.read()[0].members, 0);
    }

    #[test]
    fn test_update_count_unknown_port_is_noop() {
        let lobby = TempLobby::new("noop");
        lobby.dir.add("General", 9100, 8).unwrap();
        lobby.dir.update_count(9999, 1).unwrap();

        assert_eq!(lobby.dir.read()[0].members, 0);
    }
}
