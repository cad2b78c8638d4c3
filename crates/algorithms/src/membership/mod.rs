//! Membership transformations
//!
//! Turn raw layer values into suitability scores: continuous fuzzy kernels
//! and discrete remaps, each followed by a linear rescale onto a target range.

mod kernel;
mod remap;
mod rescale;
mod spec;
mod transform;

pub use kernel::{Kernel, ResolvedKernel};
pub use remap::{RangeEntry, RangeRemap, UniqueRemap};
pub use rescale::{rescale, Rescaler, ScaleRange};
pub use spec::{KernelParams, Remap, TransformKind, TransformationSpec};
pub use transform::{fuzzy_membership, resolve, FuzzyMembership, ResolvedTransform, TransformMethod};
