//! SVG position markers
//!
//! Marker images are self-contained `data:` URIs so backends can use them as
//! icon sources directly. The outline and the optional halo come from two
//! pure generators, [`marker_path`] and [`marker_extra`].

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use ulog_core::Track;

use crate::config::ColorSettings;

/// Characters escaped in a URI component: all but `A-Za-z0-9-_.!~*'()`
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub const SVG_DATA_PREFIX: &str = "data:image/svg+xml,";

const OUTLINE_COLOR: &str = "#555555";
const HALO_COLOR: &str = "#3377ff";

/// Marker canvas `(width, height)`
pub fn marker_size(is_large: bool) -> (u32, u32) {
    if is_large {
        (30, 45)
    } else {
        (20, 30)
    }
}

/// Path data of the pin outline with a hole in its head
pub fn marker_path(is_large: bool) -> &'static str {
    if is_large {
        "M15,44 C15,44 3,29 3,15 A12,12 0 1 1 27,15 C27,29 15,44 15,44 Z \
         M15,10 A5,5 0 1 0 15,20 A5,5 0 1 0 15,10 Z"
    } else {
        "M10,29 C10,29 2,19 2,10 A8,8 0 1 1 18,10 C18,19 10,29 10,29 Z \
         M10,6.5 A3.5,3.5 0 1 0 10,13.5 A3.5,3.5 0 1 0 10,6.5 Z"
    }
}

/// Path data of the halo ring drawn around the pin head
pub fn marker_extra(is_large: bool) -> &'static str {
    if is_large {
        "M15,1 A14,14 0 1 1 15,29 A14,14 0 1 1 15,1 Z"
    } else {
        "M10,0.5 A9.5,9.5 0 1 1 10,19.5 A9.5,9.5 0 1 1 10,0.5 Z"
    }
}

/// Marker SVG markup
pub fn marker_svg(fill: &str, is_large: bool, is_extra: bool) -> String {
    let (width, height) = marker_size(is_large);
    let halo = if is_extra {
        format!(
            r#"<path fill="none" stroke="{}" stroke-width="1.5" d="{}"/>"#,
            HALO_COLOR,
            marker_extra(is_large)
        )
    } else {
        String::new()
    };
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">{halo}<path fill="{fill}" fill-rule="evenodd" stroke="{outline}" stroke-width="1" d="{path}"/></svg>"#,
        w = width,
        h = height,
        halo = halo,
        fill = fill,
        outline = OUTLINE_COLOR,
        path = marker_path(is_large),
    )
}

/// Marker image as a percent-encoded `data:image/svg+xml` URI
pub fn get_svg_src(fill: &str, is_large: bool, is_extra: bool) -> String {
    let svg = marker_svg(fill, is_large, is_extra);
    format!(
        "{}{}",
        SVG_DATA_PREFIX,
        utf8_percent_encode(&svg, URI_COMPONENT)
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Marker selection
// ─────────────────────────────────────────────────────────────────────────────

/// Role of a position within its track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Start,
    Stop,
    Normal,
}

/// Marker appearance for one position
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerStyle {
    pub kind: MarkerKind,
    pub fill: String,
    pub is_large: bool,
    /// Position has a comment or image attached
    pub is_extra: bool,
}

impl MarkerStyle {
    /// Style of the position at `index`, or `None` if out of range.
    ///
    /// The last position is the stop marker, which also covers single
    /// position tracks.
    pub fn for_position(track: &Track, index: usize, colors: &ColorSettings) -> Option<Self> {
        let position = track.get(index)?;
        let is_extra = position.has_comment() || position.has_image();
        let kind = if index + 1 == track.len() {
            MarkerKind::Stop
        } else if index == 0 {
            MarkerKind::Start
        } else {
            MarkerKind::Normal
        };
        let fill = match kind {
            MarkerKind::Start => colors.start.clone(),
            MarkerKind::Stop => colors.stop.clone(),
            MarkerKind::Normal if is_extra => colors.extra.clone(),
            MarkerKind::Normal => colors.normal.clone(),
        };
        Some(Self {
            kind,
            fill,
            is_large: kind != MarkerKind::Normal,
            is_extra,
        })
    }

    /// Style of the currently selected position
    pub fn highlight(colors: &ColorSettings, is_large: bool) -> Self {
        Self {
            kind: MarkerKind::Normal,
            fill: colors.hilite.clone(),
            is_large,
            is_extra: false,
        }
    }

    pub fn svg_src(&self) -> String {
        get_svg_src(&self.fill, self.is_large, self.is_extra)
    }
}
