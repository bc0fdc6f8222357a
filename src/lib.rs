//! # bglocation
//!
//! Background location services for mobile host runtimes.
//!
//! The kit exposes the native location stacks (Android `FusedLocationProvider`,
//! Apple `CoreLocation`) through a method-call and event-stream bridge. The
//! translation logic is split into small crates:
//!
//! - `permission`: reduces platform permission state to an ordinal status code.
//! - `location`: normalizes platform fixes into a canonical record, single-shot
//!   or streamed.
//! - `bridge`: dispatches named method calls and carries the update stream.
//!
//! Use the `full` feature to enable everything. `bridge` (the default) pulls in
//! the other two.
//!
//! ## Example
//!
//! ```toml
//! [dependencies]
//! bglocation = { version = "0.1", features = ["full"] }
//! ```
//!
//! ```rust,ignore
//! use bglocation::bridge::{Bridge, MethodCall};
//!
//! async fn check(bridge: &Bridge) {
//!     let reply = bridge.handle(MethodCall::new("check_permission")).await;
//!     println!("{}", reply.to_value());
//! }
//! ```

#[cfg(feature = "bridge")]
pub use bglocation_bridge as bridge;

#[cfg(feature = "location")]
pub use bglocation_location as location;

#[cfg(feature = "permission")]
pub use bglocation_permission as permission;
