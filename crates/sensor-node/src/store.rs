use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use protocol::Channel;
use tracing::warn;

/// Persisted per-channel actuator state, the node's stand in for a
/// board's EEPROM slots. Only the dimmer uses it today.
pub trait StateStore {
    fn load(&self, channel: Channel) -> Option<u8>;
    fn save(&mut self, channel: Channel, value: u8) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Could not write state file: {0}")]
    Io(#[from] io::Error),
    #[error("Could not serialize state: {0}")]
    Serialize(#[from] ron::Error),
}

/// Levels keyed by channel id in a RON map on disk. The file is
/// disposable: a corrupt one is dropped with a warning and defaults
/// apply.
pub struct RonStore {
    path: PathBuf,
    state: HashMap<u8, u8>,
}

impl RonStore {
    pub fn open(path: PathBuf) -> Result<Self, StoreError> {
        let state = match fs::read_to_string(&path) {
            Ok(content) => match ron::from_str(&content) {
                Ok(state) => state,
                Err(err) => {
                    warn!("state file is corrupt, starting fresh: {err}");
                    HashMap::new()
                }
            },
            Err(err) if err.kind() == io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => return Err(StoreError::Io(err)),
        };

        Ok(Self { path, state })
    }
}

impl StateStore for RonStore {
    fn load(&self, channel: Channel) -> Option<u8> {
        self.state.get(&channel.0).copied()
    }

    fn save(&mut self, channel: Channel, value: u8) -> Result<(), StoreError> {
        self.state.insert(channel.0, value);
        let serialized = ron::to_string(&self.state)?;
        fs::write(&self.path, serialized)?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn scratch_file(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("sensor-node-{}-{name}.ron", std::process::id()))
    }

    #[test]
    fn saved_levels_survive_a_reopen() {
        let path = scratch_file("roundtrip");
        let _ = fs::remove_file(&path);

        let mut store = RonStore::open(path.clone()).unwrap();
        assert_eq!(store.load(Channel(6)), None);
        store.save(Channel(6), 80).unwrap();

        let reopened = RonStore::open(path.clone()).unwrap();
        assert_eq!(reopened.load(Channel(6)), Some(80));
        assert_eq!(reopened.load(Channel(7)), None);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn corrupt_state_file_is_dropped() {
        let path = scratch_file("corrupt");
        fs::write(&path, "not ron at all {{{").unwrap();

        let store = RonStore::open(path.clone()).unwrap();
        assert_eq!(store.load(Channel(6)), None);

        let _ = fs::remove_file(&path);
    }
}
