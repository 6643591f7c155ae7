//! Position popup markup

use std::fmt::Display;
use std::fmt::Write as _;

use chrono::TimeZone;
use ulog_core::prelude::*;
use ulog_core::{Position, Track};

use crate::lang::Lang;
use crate::utils::{html_encode, sprintf, TimeString};

/// Placeholder for values a position doesn't carry
const MISSING: &str = "–––";

/// Directory attached images are served from
pub const UPLOADS_DIR: &str = "uploads";

/// Build the popup fragment for position `index` of `track`.
///
/// The statistics panel (`#pright`) is left out only for the latest position
/// while `show_latest` is on.
pub fn popup_html<Tz>(
    lang: &Lang,
    track: &Track,
    index: usize,
    show_latest: bool,
    tz: &Tz,
) -> Result<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let count = track.len();
    let position = track
        .get(index)
        .ok_or(Error::PositionNotFound { index, len: count })?;
    let is_latest = index + 1 == count;

    let (date, time) = match TimeString::from_timestamp(position.timestamp, tz) {
        Some(ts) => (
            format!("{}<br>", ts.date),
            format!(
                r#"{}<span class="smaller">{}</span><br>"#,
                ts.time, ts.zone
            ),
        ),
        None => (MISSING.to_string(), MISSING.to_string()),
    };

    let mut html = String::new();
    html.push_str(r#"<div id="popup">"#);

    html.push_str(r#"<div id="pheader">"#);
    let _ = write!(
        html,
        r#"<div><img alt="{u}" title="{u}" src="images/user_dark.svg"> {}</div>"#,
        html_encode(&position.username),
        u = lang.get("user")?,
    );
    let _ = write!(
        html,
        r#"<div><img alt="{t}" title="{t}" src="images/route_dark.svg"> {}</div>"#,
        html_encode(&position.trackname),
        t = lang.get("track")?,
    );
    html.push_str("</div>");

    html.push_str(r#"<div id="pbody">"#);
    if let Some(comment) = position.comment.as_deref().filter(|c| !c.is_empty()) {
        let _ = write!(html, r#"<div id="pcomments">{}</div>"#, html_encode(comment));
    }
    if let Some(image) = position.image.as_deref().filter(|i| !i.is_empty()) {
        let _ = write!(
            html,
            r#"<div id="pimage"><img src="{}/{}" alt="{}"></div>"#,
            UPLOADS_DIR,
            html_encode(image),
            lang.get("image")?
        );
    }
    html.push_str(&details(lang, &position, &date, &time)?);
    if !(show_latest && is_latest) {
        html.push_str(&stats(lang, &position)?);
    }
    html.push_str("</div>");

    let _ = write!(
        html,
        r#"<div id="pfooter">{}</div>"#,
        sprintf(lang.get("pointof")?, &[&(index + 1), &count])
    );
    html.push_str("</div>");
    Ok(html)
}

/// Left column: time, speed, altitude, accuracy
fn details(lang: &Lang, position: &Position, date: &str, time: &str) -> Result<String> {
    let label = lang.get("time")?;
    let mut html = String::from(r#"<div id="pleft">"#);
    let _ = write!(
        html,
        r#"<img class="icon" alt="{l}" title="{l}" src="images/calendar_dark.svg"> {}"#,
        date,
        l = label
    );
    let _ = write!(
        html,
        r#"<img class="icon" alt="{l}" title="{l}" src="images/clock_dark.svg"> {}"#,
        time,
        l = label
    );
    if let Some(speed) = position.speed {
        let _ = write!(
            html,
            r#"<img class="icon" alt="{l}" title="{l}" src="images/speed_dark.svg">{}<br>"#,
            lang.format_speed(speed)?,
            l = lang.get("speed")?
        );
    }
    if let Some(altitude) = position.altitude {
        let _ = write!(
            html,
            r#"<img class="icon" alt="{l}" title="{l}" src="images/altitude_dark.svg">{}<br>"#,
            lang.format_altitude(altitude)?,
            l = lang.get("altitude")?
        );
    }
    if let Some(accuracy) = position.accuracy {
        let provider = match position.provider.as_deref() {
            Some(p @ ("gps" | "network")) => {
                let name = lang.get(p)?;
                format!(
                    r#" <img class="icon" alt="{n}" title="{n}" src="images/{}_dark.svg">"#,
                    p,
                    n = name
                )
            }
            _ => String::new(),
        };
        let _ = write!(
            html,
            r#"<img class="icon" alt="{l}" title="{l}" src="images/accuracy_dark.svg">{}{}<br>"#,
            lang.format_accuracy(accuracy)?,
            provider,
            l = lang.get("accuracy")?
        );
    }
    html.push_str("</div>");
    Ok(html)
}

/// Right column: running totals up to this position
fn stats(lang: &Lang, position: &Position) -> Result<String> {
    let mut html = String::from(r#"<div id="pright">"#);
    let _ = write!(
        html,
        r#"<img class="icon" alt="{}" src="images/stats_blue.svg"><br>"#,
        lang.get("track")?
    );
    let _ = write!(
        html,
        r#"<img class="icon" alt="{l}" title="{l}" src="images/time_blue.svg"> {}<br>"#,
        lang.locale_duration(position.total_seconds)?,
        l = lang.get("ttime")?
    );
    let _ = write!(
        html,
        r#"<img class="icon" alt="{l}" title="{l}" src="images/speed_blue.svg"> {}<br>"#,
        lang.format_speed(position.average_speed())?,
        l = lang.get("aspeed")?
    );
    let _ = write!(
        html,
        r#"<img class="icon" alt="{l}" title="{l}" src="images/distance_blue.svg"> {}<br>"#,
        lang.format_distance_major(position.total_meters)?,
        l = lang.get("tdistance")?
    );
    html.push_str("</div>");
    Ok(html)
}
