//! Cross-platform AR launch orchestration.
//!
//! ## Architecture
//!
//! ```text
//! CapabilityDetector ──> PlatformRouter ──> LaunchPlan { primary, fallback, format }
//!                                                │
//! PermissionNegotiator ──(gates)──┐              ▼
//!                                 └──> ProviderTable[method].launch(url, options)
//!                                        ├─ native-session  ──> ArSession states
//!                                        ├─ os-ar-viewer    (AR Quick Look)
//!                                        ├─ intent-launcher (Scene Viewer)
//!                                        └─ qr-fallback     (viewer + scannable code)
//! ```
//!
//! Environment access goes through the traits in [`host`]; the [`web`] module
//! implements them for browsers and only builds on wasm32.

pub mod capability;
pub mod config;
pub mod error;
pub mod events;
pub mod host;
pub mod launcher;
pub mod logging;
pub mod permissions;
pub mod providers;
pub mod router;
pub mod rpc;
pub mod session;
pub mod timeout;
pub mod types;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use capability::{CapabilityDetector, CapabilityProfile};
pub use config::LaunchConfig;
pub use error::{HostError, LaunchError};
pub use launcher::{ArLauncher, LaunchReport, ModelSources};
pub use permissions::{PermissionNegotiator, PermissionResult};
pub use providers::{LaunchOptions, LaunchOutcome, LaunchProvider, ProviderTable};
pub use router::{LaunchPlan, PlatformRouter};
pub use session::{ArSession, SessionMetrics, SessionState};
pub use types::{Browser, FeatureName, LaunchMethod, ModelFormat, PermissionState, Platform};
