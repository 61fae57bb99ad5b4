//! # Analysis
//!
//! Layout diagnostics over the same symbol table the generator reads.

pub mod padding;

pub use padding::{LayoutRow, MemberLayout, PaddingAnalyzer, PaddingReport};
