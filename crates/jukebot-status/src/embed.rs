// SPDX-FileCopyrightText: 2026 Jukebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embed rendering for the status message, plus the inter-frame latency
//! statistics shown in the debug footer.

use std::time::{Duration, Instant};

use jukebot_core::{Embed, EmbedField};

/// Formats a duration as `mm:ss`, or `hh:mm:ss` past one hour.
pub fn pretty_time(t: Duration) -> String {
    let total = t.as_secs();
    let hours = total / 3600;
    let min = (total / 60) % 60;
    let sec = total % 60;
    if hours >= 1 {
        format!("{hours:02}:{min:02}:{sec:02}")
    } else {
        format!("{min:02}:{sec:02}")
    }
}

/// Total-duration label: `--:--` when the duration is unknown (live).
fn duration_label(t: Duration) -> String {
    if t.is_zero() {
        "--:--".to_string()
    } else {
        pretty_time(t)
    }
}

/// Builds the status embed for the current play.
pub fn now_playing_embed(
    title: &str,
    paused: bool,
    elapsed: Duration,
    duration: Duration,
    playlist: &[String],
    debug_footer: Option<String>,
) -> Embed {
    let glyph = if paused { "⏸" } else { "▶" };
    let mut embed = Embed {
        title: format!("{glyph} {title}"),
        description: format!("{}/{}", pretty_time(elapsed), duration_label(duration)),
        fields: Vec::new(),
        footer: debug_footer,
    };
    if !playlist.is_empty() {
        embed.fields.push(EmbedField {
            name: "Playlist".to_string(),
            value: playlist.join("\n"),
        });
    }
    embed
}

/// Frame-to-frame latency in milliseconds.
pub fn frame_latencies(times: &[Instant]) -> Vec<f64> {
    times
        .windows(2)
        .map(|w| w[1].duration_since(w[0]).as_secs_f64() * 1e3)
        .collect()
}

/// Average, standard deviation, max, and min of a latency series.
pub fn latency_stats(data: &[f64]) -> (f64, f64, f64, f64) {
    if data.is_empty() {
        return (0.0, 0.0, 0.0, 0.0);
    }
    let mut max = f64::MIN;
    let mut min = f64::MAX;
    let mut sum = 0.0;
    for &v in data {
        if v > max {
            max = v;
        }
        if v < min {
            min = v;
        }
        sum += v;
    }
    let avg = sum / data.len() as f64;
    let mut dev = 0.0;
    for &v in data {
        dev += (v - avg) * (v - avg);
    }
    dev = (dev / data.len() as f64).sqrt();
    (avg, dev, max, min)
}

/// Renders the debug footer from per-frame write timestamps, or `None`
/// when too few frames arrived to compute anything.
pub fn debug_footer(times: &[Instant]) -> Option<String> {
    if times.len() < 2 {
        return None;
    }
    let (avg, dev, max, min) = latency_stats(&frame_latencies(times));
    Some(format!(
        "avg {avg:.3}ms, dev {dev:.3}ms, max {max:.3}ms, min {min:.3}ms"
    ))
}
