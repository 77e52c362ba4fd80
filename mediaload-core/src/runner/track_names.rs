use std::collections::HashMap;

use mediaload_stats::TrackId;
use parking_lot::Mutex;

/// Display names for published tracks (`"<seq>A"`, `"<seq>V"`), written by publisher tasks.
#[derive(Debug, Default)]
pub struct TrackNames {
    names: Mutex<HashMap<TrackId, String>>,
}

impl TrackNames {
    /// Assigns `name` to `track_id`. A track keeps the first name it was given;
    /// returns `false` if it already had one.
    pub fn register(&self, track_id: TrackId, name: String) -> bool {
        let mut names = self.names.lock();
        if names.contains_key(&track_id) {
            return false;
        }
        names.insert(track_id, name);
        true
    }

    pub fn get(&self, track_id: &str) -> Option<String> {
        self.names.lock().get(track_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.names.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.lock().is_empty()
    }
}
