//! The mascot: a face for every mood.

use crate::color::{self, MaybePaint};
use crate::mood::Mood;

pub(crate) fn face(mood: Mood) -> &'static str {
    match mood {
        Mood::Idle => "(•‿•)",
        Mood::Thinking => "(・_・?)",
        Mood::Talking => "(•o•)",
        Mood::Happy => "(^‿^)",
        Mood::Sleepy => "(-_-)zzZ",
        Mood::Confused => "(⊙_☉)",
        Mood::Excited => "(★ω★)",
        Mood::Sad => "(╥_╥)",
        Mood::Surprised => "(°o°)",
        Mood::Embarrassed => "(⁄ ⁄>⁄▽⁄<⁄ ⁄)",
    }
}

/// The face and name of `mood`, e.g. `(^‿^) happy`.
pub(crate) fn render(mood: Mood) -> String {
    let text = format!("{} {}", face(mood), mood);

    color::MOOD_TEXT.maybe_paint(text).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use strum::IntoEnumIterator;

    #[test]
    fn test_faces_are_distinct() {
        let faces: HashSet<&str> = Mood::iter().map(face).collect();

        assert_eq!(faces.len(), Mood::iter().count());
    }
}
