//! Kernel error type.

use thiserror::Error;

/// Failures surfaced by the measurement model.
///
/// Malformed input rows are not represented here: they are recovered by the
/// ingestion layer (see [`crate::ratings::RowSkip`]).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// Lookup of an unknown organization, element, scale, template or entity.
    #[error("unknown {kind} id: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Scale type and semantics disagree, or a value breaks the semantics.
    #[error("semantics violation on scale {scale_id}: {reason}")]
    SemanticsViolation { scale_id: String, reason: String },

    /// A scale definition whose minimum exceeds its maximum.
    #[error("scale {scale_id} has min {min} greater than max {max}")]
    InvalidScaleRange { scale_id: String, min: f64, max: f64 },

    /// A template registered twice under the same element id.
    #[error("element template {0} already registered")]
    DuplicateTemplate(String),

    /// Two families attached the same scale id to one element.
    #[error("scale {scale_id} on element {element_id} already attached by family {owner}")]
    ConflictingScale {
        element_id: String,
        scale_id: String,
        owner: String,
    },

    /// Two rating rows supplied the same (entity, element, scale) key.
    #[error("duplicate rating for ({entity_id}, {element_id}, {scale_id})")]
    DuplicateRating {
        entity_id: String,
        element_id: String,
        scale_id: String,
    },
}

impl ModelError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn semantics(scale_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SemanticsViolation {
            scale_id: scale_id.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ModelError::not_found("organization", "9.Z");
        assert_eq!(err.to_string(), "unknown organization id: 9.Z");

        let err = ModelError::semantics("IM", "value 9 not a category");
        assert!(err.to_string().contains("IM"));
        assert!(err.to_string().contains("value 9"));
    }
}
