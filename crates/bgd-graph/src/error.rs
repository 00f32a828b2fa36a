//! Structural degradation taxonomy for graph loading.

/// A locally-recovered structural problem in a block graph.
///
/// These are warnings, not errors: the loader truncates the affected
/// script and carries on, so a single malformed script cannot abort a
/// whole comparison.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StructuralWarning {
    /// A `next` or input slot referenced an id absent from the block map.
    #[error("referenced block {id} is missing; script truncated")]
    MissingBlock { id: String },

    /// A `next` or input reference re-entered an id already visited during
    /// this script's walk.
    #[error("cycle re-enters block {id}; script truncated")]
    Cycle { id: String },

    /// An array-form block entry with an unrecognized primitive code.
    #[error("unsupported primitive entry at {id}")]
    UnsupportedPrimitive { id: String },
}
