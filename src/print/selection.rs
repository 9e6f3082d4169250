//! Page selection policy

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::range::parse_page_ranges;

/// Ordered, duplicate-free list of 1-indexed page numbers.
/// Order is rendering order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageSelection(Vec<usize>);

impl PageSelection {
    /// Build from pages, dropping later duplicates
    #[must_use]
    pub fn from_pages(pages: impl IntoIterator<Item = usize>) -> Self {
        let mut seen = HashSet::new();
        Self(pages.into_iter().filter(|page| seen.insert(*page)).collect())
    }

    /// Wrap pages that are already ascending and duplicate-free
    pub(crate) fn from_sorted(pages: Vec<usize>) -> Self {
        debug_assert!(pages.windows(2).all(|w| w[0] < w[1]));
        Self(pages)
    }

    #[must_use]
    pub fn pages(&self) -> &[usize] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }
}

impl From<PageSelection> for Vec<usize> {
    fn from(selection: PageSelection) -> Self {
        selection.0
    }
}

/// Which pages the user asked for
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrintMode {
    #[default]
    All,
    Current,
    Custom,
}

impl FromStr for PrintMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(PrintMode::All),
            "current" => Ok(PrintMode::Current),
            "custom" => Ok(PrintMode::Custom),
            other => Err(format!("unknown print mode: {other}")),
        }
    }
}

/// How the viewer arranges pages on screen
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayoutMode {
    #[default]
    Single,
    Continuous,
    Facing,
    FacingContinuous,
    /// Cover page alone, then pairs 2-3, 4-5, ...
    #[serde(rename = "CoverFacing")]
    FacingCover,
    #[serde(rename = "CoverContinuous")]
    FacingCoverContinuous,
}

impl LayoutMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutMode::Single => "Single",
            LayoutMode::Continuous => "Continuous",
            LayoutMode::Facing => "Facing",
            LayoutMode::FacingContinuous => "FacingContinuous",
            LayoutMode::FacingCover => "CoverFacing",
            LayoutMode::FacingCoverContinuous => "CoverContinuous",
        }
    }
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayoutMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "single" => Ok(LayoutMode::Single),
            "continuous" => Ok(LayoutMode::Continuous),
            "facing" => Ok(LayoutMode::Facing),
            "facingcontinuous" => Ok(LayoutMode::FacingContinuous),
            "coverfacing" | "facingcover" => Ok(LayoutMode::FacingCover),
            "covercontinuous" | "facingcovercontinuous" => Ok(LayoutMode::FacingCoverContinuous),
            _ => Err(format!("unknown layout mode: {s}")),
        }
    }
}

/// Compute the pages a print request covers.
///
/// `custom_input` is only consulted in [`PrintMode::Custom`]; whitespace in it
/// is ignored.
#[must_use]
pub fn compute_page_selection(
    mode: PrintMode,
    current_page: usize,
    layout: LayoutMode,
    custom_input: &str,
    page_labels: &[String],
    total_pages: usize,
) -> PageSelection {
    match mode {
        PrintMode::All => PageSelection::from_pages(1..=total_pages),
        PrintMode::Current => PageSelection::from_pages(current_pages(current_page, layout, total_pages)),
        PrintMode::Custom => {
            let stripped: String = custom_input.chars().filter(|c| !c.is_whitespace()).collect();
            parse_page_ranges(&stripped, page_labels, total_pages)
        }
    }
}

/// Pages "current" stands for. In two-page layouts both visible pages print.
#[must_use]
pub fn current_pages(current_page: usize, layout: LayoutMode, total_pages: usize) -> Vec<usize> {
    if total_pages == 0 {
        return Vec::new();
    }

    let current = current_page.clamp(1, total_pages);
    let pages = match layout {
        LayoutMode::FacingCover | LayoutMode::FacingCoverContinuous => {
            if current == 1 || (current == total_pages && total_pages % 2 == 0) {
                vec![current]
            } else if current % 2 == 1 {
                vec![current - 1, current]
            } else {
                vec![current, current + 1]
            }
        }
        LayoutMode::Facing | LayoutMode::FacingContinuous => {
            if current == total_pages && total_pages % 2 == 1 {
                vec![current]
            } else if current % 2 == 1 {
                vec![current, current + 1]
            } else {
                vec![current - 1, current]
            }
        }
        LayoutMode::Single | LayoutMode::Continuous => vec![current],
    };

    pages
        .into_iter()
        .filter(|page| (1..=total_pages).contains(page))
        .collect()
}
