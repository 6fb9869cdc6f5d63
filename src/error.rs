use thiserror::Error;

use crate::binding::BindingState;

/// Everything that can go wrong while describing or triggering a patch.
///
/// Deserialization failures (`UnknownKind`, `MissingField`, `InvalidField`,
/// `Description`) surface immediately and construct nothing. The binding
/// state variants reject lifecycle misuse (replaying a consumed binding,
/// releasing before play) instead of leaving the behavior undefined.
#[derive(Debug, Error)]
pub enum PatchError {
    #[error("unknown stage kind `{0}`")]
    UnknownKind(String),

    #[error("`{kind}` description is missing required field `{field}`")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },

    #[error("`{kind}` field `{field}` has an invalid value")]
    InvalidField {
        kind: &'static str,
        field: &'static str,
    },

    #[error("malformed stage description: {0}")]
    Description(#[from] serde_json::Error),

    #[error("binding cannot be played while {state:?}")]
    NotPlayable { state: BindingState },

    #[error("binding cannot be released while {state:?}")]
    NotReleasable { state: BindingState },
}
