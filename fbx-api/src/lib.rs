//! Typed router API model
//!
//! This crate describes the three router resources the adapter consumes:
//! the phone line status, the call log and the LAN browser host list. It
//! also defines the `RouterClient` trait through which they are fetched.
//!
//! The HTTP transport itself lives outside this workspace. A transport
//! only has to implement `RouterClient`, typically by feeding response
//! bodies through [`decode_response`]:
//!
//! ```rust
//! use fbx_api::{decode_response, PhoneStatus};
//!
//! let body = r#"{"success": true, "result": [{"on_hook": true, "is_ringing": false}]}"#;
//! let lines: Vec<PhoneStatus> = decode_response(body)?;
//! assert!(lines[0].on_hook);
//! # Ok::<(), fbx_api::TransportError>(())
//! ```

pub mod call;
pub mod client;
pub mod error;
pub mod lan;
pub mod phone;

pub use call::{CallEntry, CallType};
pub use client::{decode_response, ApiResponse, RouterClient};
pub use error::{Result, TransportError};
pub use lan::{L2Ident, L3Connectivity, LanHost};
pub use phone::PhoneStatus;
