//! Notes pages printed after pages that carry comments

use std::sync::Arc;

use serde::Serialize;

use super::annotations::{Annotation, ColorMap, Rgb};
use super::document::DocumentCore;
use super::sort::SortStrategies;
use super::{DEFAULT_NOTE_DATE_FORMAT, DEFAULT_SORT_STRATEGY};

/// Everything needed to lay out notes besides the annotations themselves
#[derive(Clone)]
pub struct NotesContext {
    pub strategies: Arc<SortStrategies>,
    /// Key into `strategies`
    pub sort_key: String,
    pub color_map: ColorMap,
    /// chrono format string for note timestamps
    pub date_format: String,
}

impl Default for NotesContext {
    fn default() -> Self {
        Self {
            strategies: Arc::new(SortStrategies::with_defaults()),
            sort_key: DEFAULT_SORT_STRATEGY.to_string(),
            color_map: ColorMap::with_defaults(),
            date_format: DEFAULT_NOTE_DATE_FORMAT.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NoteIcon {
    /// Icon asset for the annotation kind
    pub asset: Option<&'static str>,
    /// Shown instead of the asset when there is none
    pub label: String,
    pub color: Option<Rgb>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NoteReply {
    pub info: String,
    pub contents: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NoteBlock {
    pub annotation_id: String,
    pub icon: NoteIcon,
    pub info: String,
    pub contents: Option<String>,
    pub replies: Vec<NoteReply>,
}

/// Comments summary for one printed page
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NotesPage {
    pub page_number: usize,
    pub header: String,
    pub notes: Vec<NoteBlock>,
}

impl NotesPage {
    /// Plain-text rendition handed to text-only print surfaces
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut output = String::new();
        output.push_str(&self.header);
        output.push_str("\n\n");

        for note in &self.notes {
            let icon = note.icon.asset.unwrap_or(note.icon.label.as_str());
            output.push_str(&format!("[{icon}] {}\n", note.info));
            if let Some(contents) = &note.contents {
                output.push_str(contents);
                output.push('\n');
            }

            for reply in &note.replies {
                output.push_str(&format!("    {}\n", reply.info));
                if let Some(contents) = &reply.contents {
                    for line in contents.lines() {
                        output.push_str("    ");
                        output.push_str(line);
                        output.push('\n');
                    }
                }
            }
            output.push('\n');
        }

        output
    }
}

/// Annotations that belong on the notes page of `page_number`
#[must_use]
pub fn printable_annotations(annotations: &[Annotation], page_number: usize) -> Vec<Annotation> {
    annotations
        .iter()
        .filter(|a| a.listable && a.page_number == page_number && !a.is_reply() && a.printable)
        .cloned()
        .collect()
}

/// Build the notes page of `page_number`, or `None` when it has no printable
/// comments
#[must_use]
pub fn build_notes_page(
    core: &dyn DocumentCore,
    annotations: &[Annotation],
    page_number: usize,
    ctx: &NotesContext,
) -> Option<NotesPage> {
    let mut notes = printable_annotations(annotations, page_number);
    if notes.is_empty() {
        return None;
    }

    ctx.strategies.sort_notes(&ctx.sort_key, &mut notes);

    Some(NotesPage {
        page_number,
        header: format!("Page {page_number}"),
        notes: notes.iter().map(|note| note_block(core, note, ctx)).collect(),
    })
}

fn note_block(core: &dyn DocumentCore, annotation: &Annotation, ctx: &NotesContext) -> NoteBlock {
    NoteBlock {
        annotation_id: annotation.id.clone(),
        icon: NoteIcon {
            asset: annotation.kind.icon(),
            label: annotation.subject.clone(),
            color: ctx.color_map.icon_color(annotation),
        },
        info: note_info(core, annotation, &ctx.date_format),
        contents: annotation.contents().map(str::to_string),
        replies: annotation
            .replies
            .iter()
            .map(|reply| NoteReply {
                info: note_info(core, reply, &ctx.date_format),
                contents: reply.contents().map(str::to_string),
            })
            .collect(),
    }
}

fn note_info(core: &dyn DocumentCore, annotation: &Annotation, date_format: &str) -> String {
    let author = core.display_author(annotation).unwrap_or_default();
    format!(
        "Author: {author}  Subject: {}  Date: {}",
        annotation.subject,
        annotation.created.format(date_format)
    )
}
