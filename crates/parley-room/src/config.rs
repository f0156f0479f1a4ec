//! Room configuration.

/// Configuration for one room process.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// Display name of the room.
    pub name: String,

    /// TCP port the room listens on. Also keys the lobby listing.
    pub port: u16,

    /// Password required to join. `None` disables the password step.
    pub password: Option<String>,

    /// Member capacity. 0 means unbounded.
    pub max_members: usize,

    /// Whether the room is advertised in the lobby directory.
    pub public: bool,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            name: "Parley".to_owned(),
            port: 9100,
            password: None,
            max_members: 0,
            public: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_config_default() {
        let config = RoomConfig::default();
        assert_eq!(config.max_members, 0);
        assert!(config.password.is_none());
        assert!(!config.public);
    }
}
