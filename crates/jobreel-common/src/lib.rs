//! Jobreel-Common: Shared types and utilities.
//!
//! This crate provides the pieces shared by the media library and the
//! render service:
//!
//! - **Typed IDs**: `JobId`, which also prefixes every artifact a job writes
//! - **Core Types**: job status state machine, tone, scene engine selection
//! - **Colors**: hex parsing, ASS color reordering, WCAG contrast
//! - **Templates**: `{placeholder}` substitution
//! - **Error Handling**: the pipeline error taxonomy and result alias
//!
//! # Examples
//!
//! ```
//! use jobreel_common::{EngineKind, HexColor, JobId, JobStatus};
//!
//! let id = JobId::new();
//! assert!(JobStatus::Queued.can_transition_to(JobStatus::Running));
//! assert_eq!(EngineKind::from_identifier(Some("veo")), EngineKind::Generative);
//!
//! let brand = HexColor::parse("#0B5FFF").unwrap();
//! assert_eq!(brand.to_ass(0x40), "&H40FF5F0B");
//! # let _ = id;
//! ```

pub mod color;
pub mod error;
pub mod ids;
pub mod template;
pub mod types;

pub use color::{check_contrast, check_hex_contrast, contrast_ratio, ContrastCheck, HexColor};
pub use error::{Error, Result};
pub use ids::*;
pub use template::TemplateContext;
pub use types::*;
