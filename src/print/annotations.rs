//! Annotation model as seen by the print pipeline

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Annotation kinds the pipeline distinguishes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationKind {
    StickyNote,
    Highlight,
    Underline,
    Strikeout,
    Squiggly,
    FreeText,
    FreeHand,
    Rectangle,
    Ellipse,
    Line,
    Polygon,
    Polyline,
    Stamp,
    Signature,
    /// Form field widget; not drawn by the base annotation renderer
    Widget,
    Other,
}

impl AnnotationKind {
    /// Icon asset shown in front of a note. `None` falls back to the subject.
    #[must_use]
    pub fn icon(&self) -> Option<&'static str> {
        match self {
            AnnotationKind::StickyNote => Some("ic_annotation_sticky_note_black_24px"),
            AnnotationKind::Highlight => Some("ic_annotation_highlight_black_24px"),
            AnnotationKind::Underline => Some("ic_annotation_underline_black_24px"),
            AnnotationKind::Strikeout => Some("ic_annotation_strikeout_black_24px"),
            AnnotationKind::Squiggly => Some("ic_annotation_squiggly_black_24px"),
            AnnotationKind::FreeText => Some("ic_annotation_freetext_black_24px"),
            AnnotationKind::FreeHand => Some("ic_annotation_freehand_black_24px"),
            AnnotationKind::Rectangle => Some("ic_annotation_square_black_24px"),
            AnnotationKind::Ellipse => Some("ic_annotation_circle_black_24px"),
            AnnotationKind::Line => Some("ic_annotation_line_black_24px"),
            AnnotationKind::Polygon => Some("ic_annotation_polygon_black_24px"),
            AnnotationKind::Polyline => Some("ic_annotation_polyline_black_24px"),
            AnnotationKind::Stamp => Some("ic_annotation_image_black_24px"),
            AnnotationKind::Signature => Some("ic_annotation_signature_black_24px"),
            AnnotationKind::Widget | AnnotationKind::Other => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    #[must_use]
    pub fn to_hex_string(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Bounding box in page coordinates
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Annotation {
    pub id: String,
    /// Page number (1-indexed)
    pub page_number: usize,
    pub kind: AnnotationKind,
    /// Shown in the notes panel
    pub listable: bool,
    pub printable: bool,
    /// Id of the annotation this one replies to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<String>,
    pub author: String,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contents: Option<String>,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub rect: AnnotRect,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<Rgb>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<Rgb>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<Rgb>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replies: Vec<Annotation>,
}

impl Annotation {
    #[must_use]
    pub fn is_reply(&self) -> bool {
        self.in_reply_to.is_some()
    }

    #[must_use]
    pub fn is_widget(&self) -> bool {
        self.kind == AnnotationKind::Widget
    }

    /// Contents, with whitespace-only text treated as absent
    #[must_use]
    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref().filter(|c| !c.trim().is_empty())
    }

    /// Most recent creation time across the annotation and its replies
    #[must_use]
    pub fn latest_activity(&self) -> DateTime<Utc> {
        self.replies
            .iter()
            .map(|reply| reply.created)
            .fold(self.created, |latest, created| latest.max(created))
    }

    #[must_use]
    pub fn color(&self, source: IconColorSource) -> Option<Rgb> {
        match source {
            IconColorSource::Stroke => self.stroke_color,
            IconColorSource::Fill => self.fill_color,
            IconColorSource::Text => self.text_color,
        }
    }
}

/// Which annotation color tints a note icon
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IconColorSource {
    Stroke,
    Fill,
    Text,
}

/// Per-kind icon tint preferences
#[derive(Clone, Debug, Default)]
pub struct ColorMap {
    entries: HashMap<AnnotationKind, IconColorSource>,
}

impl ColorMap {
    /// The tints used by the notes panel
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut map = Self::default();
        for kind in [
            AnnotationKind::Highlight,
            AnnotationKind::Underline,
            AnnotationKind::Strikeout,
            AnnotationKind::Squiggly,
            AnnotationKind::FreeHand,
            AnnotationKind::Rectangle,
            AnnotationKind::Ellipse,
            AnnotationKind::Line,
            AnnotationKind::Polygon,
            AnnotationKind::Polyline,
            AnnotationKind::StickyNote,
        ] {
            map.set(kind, IconColorSource::Stroke);
        }
        map.set(AnnotationKind::FreeText, IconColorSource::Text);
        map
    }

    pub fn set(&mut self, kind: AnnotationKind, source: IconColorSource) {
        self.entries.insert(kind, source);
    }

    #[must_use]
    pub fn icon_color(&self, annotation: &Annotation) -> Option<Rgb> {
        self.entries
            .get(&annotation.kind)
            .and_then(|source| annotation.color(*source))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn note(created_secs: i64) -> Annotation {
        Annotation {
            id: "a".to_string(),
            page_number: 1,
            kind: AnnotationKind::Highlight,
            listable: true,
            printable: true,
            in_reply_to: None,
            author: "Ada".to_string(),
            subject: "Highlight".to_string(),
            contents: None,
            created: Utc.timestamp_opt(created_secs, 0).unwrap(),
            rect: AnnotRect::default(),
            stroke_color: Some(Rgb::new(255, 205, 69)),
            fill_color: None,
            text_color: None,
            replies: Vec::new(),
        }
    }

    #[test]
    fn latest_activity_includes_replies() {
        let mut root = note(100);
        assert_eq!(root.latest_activity(), root.created);

        let mut reply = note(500);
        reply.in_reply_to = Some("a".to_string());
        root.replies.push(reply);

        assert_eq!(root.latest_activity().timestamp(), 500);
    }

    #[test]
    fn icon_color_follows_color_map() {
        let annot = note(0);
        let map = ColorMap::with_defaults();
        assert_eq!(
            map.icon_color(&annot).map(|c| c.to_hex_string()),
            Some("#ffcd45".to_string())
        );

        assert_eq!(ColorMap::default().icon_color(&annot), None);
    }

    #[test]
    fn blank_contents_are_absent() {
        let mut annot = note(0);
        annot.contents = Some("   ".to_string());
        assert_eq!(annot.contents(), None);
    }
}
