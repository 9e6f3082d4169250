//! Print rotation resolution

use super::document::{CoreError, DocumentCore, PageInfo};

/// Clockwise rotation in quarter turns
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Rotation {
    #[default]
    None,
    Quarter,
    Half,
    ThreeQuarters,
}

impl Rotation {
    /// Normalize any number of quarter turns, negative included
    #[must_use]
    pub fn from_quarter_turns(turns: i32) -> Self {
        match turns.rem_euclid(4) {
            0 => Rotation::None,
            1 => Rotation::Quarter,
            2 => Rotation::Half,
            _ => Rotation::ThreeQuarters,
        }
    }

    #[must_use]
    pub const fn quarter_turns(self) -> u8 {
        match self {
            Rotation::None => 0,
            Rotation::Quarter => 1,
            Rotation::Half => 2,
            Rotation::ThreeQuarters => 3,
        }
    }

    #[must_use]
    pub const fn is_sideways(self) -> bool {
        matches!(self, Rotation::Quarter | Rotation::ThreeQuarters)
    }

    #[must_use]
    pub fn degrees(self) -> u16 {
        u16::from(self.quarter_turns()) * 90
    }
}

/// Rotation the document itself applies, i.e. the complete rotation minus
/// whatever the viewer added on top
#[must_use]
pub fn document_rotation(core: &dyn DocumentCore, page_index: usize) -> Rotation {
    let page_number = page_index + 1;
    let complete = core.complete_rotation(page_number);
    let viewer = core.rotation(page_number);

    Rotation::from_quarter_turns(complete - viewer + 4)
}

/// Rotation to rasterize with so the printout is upright, turned sideways when
/// that lets landscape content fill more of the sheet. Square pages are left
/// as they are.
#[must_use]
pub fn print_rotation(document: Rotation, info: PageInfo) -> Rotation {
    let mut turns = (4 - i32::from(document.quarter_turns())) % 4;

    if turns % 2 == 0 && info.width > info.height {
        turns += 1;
    } else if turns % 2 == 1 && info.height > info.width {
        turns -= 1;
    }

    Rotation::from_quarter_turns(turns)
}

/// Resolve the print rotation of a page from the document core
pub fn resolve_rotation(core: &dyn DocumentCore, page_index: usize) -> Result<Rotation, CoreError> {
    let info = core.page_info(page_index)?;
    Ok(print_rotation(document_rotation(core, page_index), info))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PORTRAIT: PageInfo = PageInfo::new(612.0, 792.0);
    const LANDSCAPE: PageInfo = PageInfo::new(792.0, 612.0);
    const SQUARE: PageInfo = PageInfo::new(500.0, 500.0);

    #[test]
    fn portrait_page_without_rotation_prints_upright() {
        assert_eq!(print_rotation(Rotation::None, PORTRAIT), Rotation::None);
    }

    #[test]
    fn landscape_page_is_turned_to_fill_sheet() {
        assert_eq!(print_rotation(Rotation::None, LANDSCAPE), Rotation::Quarter);
        assert_eq!(print_rotation(Rotation::Half, LANDSCAPE), Rotation::ThreeQuarters);
    }

    #[test]
    fn rotated_portrait_page_is_turned_back() {
        // document quarter turn -> print three quarters, odd with height > width
        assert_eq!(print_rotation(Rotation::Quarter, PORTRAIT), Rotation::Half);
        assert_eq!(print_rotation(Rotation::ThreeQuarters, PORTRAIT), Rotation::None);
    }

    #[test]
    fn rotated_landscape_page_keeps_inverse_rotation() {
        assert_eq!(
            print_rotation(Rotation::Quarter, LANDSCAPE),
            Rotation::ThreeQuarters
        );
    }

    #[test]
    fn square_pages_are_never_adjusted() {
        for turns in 0..4 {
            let document = Rotation::from_quarter_turns(turns);
            let expected = Rotation::from_quarter_turns(4 - turns);
            assert_eq!(print_rotation(document, SQUARE), expected);
        }
    }

    #[test]
    fn full_turn_does_not_change_result() {
        for info in [PORTRAIT, LANDSCAPE, SQUARE] {
            for turns in -4..8 {
                assert_eq!(
                    print_rotation(Rotation::from_quarter_turns(turns), info),
                    print_rotation(Rotation::from_quarter_turns(turns + 4), info),
                );
            }
        }
    }

    #[test]
    fn normalizes_negative_turns() {
        assert_eq!(Rotation::from_quarter_turns(-1), Rotation::ThreeQuarters);
        assert_eq!(Rotation::from_quarter_turns(6), Rotation::Half);
        assert_eq!(Rotation::ThreeQuarters.degrees(), 270);
    }
}
