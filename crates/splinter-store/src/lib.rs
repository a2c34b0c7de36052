//! Fragment record format, streaming splitter, and reassembly planner/driver
//! for splinter. All filesystem I/O for the format lives here;
//! `splinter-core` supplies the codec and cryptographic primitives this
//! crate builds on.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod fragment;
pub mod group;
pub mod reassemble;
pub mod scan;
pub mod splitter;

pub use fragment::{FragmentHeader, FragmentRecord, MAGIC};
pub use group::{ExtractionPlan, FragmentGroup};
pub use reassemble::JoinOptions;
pub use scan::{discover_groups, scan_and_reassemble};
pub use splitter::{split_file, split_file_default, SplitOptions};
pub use splinter_core::{Error, Result};
