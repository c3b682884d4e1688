//! Habitat description handling
//!
//! The Metric tool writes habitats as "<Broad habitat> - <Habitat name>",
//! e.g. "Woodland and forest - Lowland mixed deciduous woodland". The habitat
//! name identifies an entry; the broad habitat is kept alongside it.

/// Split a description at its first hyphen into (broad habitat, habitat name)
///
/// Returns `None` if there is no hyphen or either side is blank.
pub fn split_description(description: &str) -> Option<(&str, &str)> {
    let (broad, name) = description.split_once('-')?;
    let (broad, name) = (broad.trim(), name.trim());

    if broad.is_empty() || name.is_empty() {
        return None;
    }

    Some((broad, name))
}
