/// Contract violations raised by the chart pipeline.
///
/// Degenerate data (empty input, entities that never report a valid value,
/// a missing baseline) is modelled as data and never reaches this type.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChartError {
    #[error("invalid timestamp for entity {entity_id}: {raw:?}")]
    InvalidTimestamp { entity_id: String, raw: String },

    #[error("non-numeric value for entity {entity_id}: {raw:?}")]
    NonNumericValue { entity_id: String, raw: String },

    #[error("entity id {0:?} collides with a reserved chart key")]
    ReservedEntityId(String),

    #[error("entity id must not be empty")]
    EmptyEntityId,

    #[error("bucket width must be greater than zero")]
    InvalidBucketWidth,
}

pub type ChartResult<T> = Result<T, ChartError>;
