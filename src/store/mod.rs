pub mod preferences;
pub mod profile;
pub mod profile_store;
pub mod storage;

pub use preferences::Preferences;
pub use profile::{PinnedApp, Profile, ProfileId, SpaceId};
pub use profile_store::{DesktopSource, ProfileStore};
pub use storage::{JsonFileBackend, Storage};
