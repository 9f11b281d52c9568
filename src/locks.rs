use crate::error::{Error, Result};

///
/// Resolve the `apply_locks` / `influence_locks` parameter pair into one flag per influence.
/// With locks applied the list must have exactly one entry per influence.
///
pub(crate) fn resolve(op: &str, apply_locks: bool, influence_locks: &[bool], influence_count: usize) -> Result<Vec<bool>> {
    if !apply_locks {
        return Ok(vec![false; influence_count]);
    }
    if influence_locks.len() != influence_count {
        return Err(Error::validation(format!(
            "{}: There must be exactly one lock per influence ({} locks given for {} influences)",
            op, influence_locks.len(), influence_count)));
    }
    Ok(influence_locks.to_vec())
}
