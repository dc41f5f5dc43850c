// Version history: recording edits into a page's bounded window, spilling
// evicted entries into the archive, and rebuilding past versions.

pub mod archive;
pub mod reconstruct;
pub mod recorder;

pub use archive::Archive;
pub use reconstruct::Reconstructor;
pub use recorder::{VersionWindow, DEFAULT_DESCRIPTION};
