//! Typing indicator projection

use serde_json::Value;

use crate::value_objects::UserId;

/// Whether the typing indicator should show for `local`
///
/// Active only when the stored value names someone other than the local user.
pub fn typing_active(value: &Value, local: &UserId) -> bool {
    match value {
        Value::String(who) => !who.is_empty() && who != local.as_str(),
        _ => false,
    }
}
