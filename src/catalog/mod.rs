//! Catalog operations, one module per record family.

pub mod classification;
pub mod dataset;
pub mod features;
pub mod hmm;
pub mod reference;
pub mod run;
pub mod sequence;
