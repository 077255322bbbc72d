//! The core stage kinds (spec §4.7): `UseVolume`, `WriteFiles`, `UseSandbox`.

pub mod use_sandbox;
pub mod use_volume;
pub mod write_files;

pub use use_sandbox::{UseSandbox, UseSandboxParams, SandboxMountParams};
pub use use_volume::{UseVolume, UseVolumeParams};
pub use write_files::{WriteFiles, WriteFilesParams};
