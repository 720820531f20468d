//! Known notes, keyed by vendor note number

use super::{AfterInstallation, Note, PrepareForSapEnvironments, VmwareGuestIoElevator};
use crate::error::{Result, SaptuneError};
use std::collections::BTreeMap;

/// Every supported note in its uninitialised state
pub fn all_notes() -> BTreeMap<&'static str, Box<dyn Note>> {
    let notes: Vec<Box<dyn Note>> = vec![
        Box::new(PrepareForSapEnvironments::default()),
        Box::new(AfterInstallation::default()),
        Box::new(VmwareGuestIoElevator::default()),
    ];
    notes.into_iter().map(|note| (note.id(), note)).collect()
}

/// Notes matching `ids` in the order given; all notes when `ids` is empty
pub fn select(ids: &[String]) -> Result<Vec<Box<dyn Note>>> {
    let mut notes = all_notes();
    if ids.is_empty() {
        return Ok(notes.into_values().collect());
    }

    let mut selected: Vec<Box<dyn Note>> = Vec::with_capacity(ids.len());
    for id in ids {
        match notes.remove(id.as_str()) {
            Some(note) => selected.push(note),
            None if selected.iter().any(|n| n.id() == id.as_str()) => {
                tracing::debug!("Note {} selected twice", id);
            }
            None => return Err(SaptuneError::UnknownNote(id.clone())),
        }
    }
    Ok(selected)
}
