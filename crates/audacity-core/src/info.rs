//! `GetInfo:` categories and typed payloads

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category requested with `GetInfo: Type=<category>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InfoType {
    #[default]
    Commands,
    Menus,
    Preferences,
    Tracks,
    Clips,
    Envelopes,
    Labels,
    Boxes,
}

impl InfoType {
    pub const ALL: [InfoType; 8] = [
        InfoType::Commands,
        InfoType::Menus,
        InfoType::Preferences,
        InfoType::Tracks,
        InfoType::Clips,
        InfoType::Envelopes,
        InfoType::Labels,
        InfoType::Boxes,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            InfoType::Commands => "Commands",
            InfoType::Menus => "Menus",
            InfoType::Preferences => "Preferences",
            InfoType::Tracks => "Tracks",
            InfoType::Clips => "Clips",
            InfoType::Envelopes => "Envelopes",
            InfoType::Labels => "Labels",
            InfoType::Boxes => "Boxes",
        }
    }
}

impl fmt::Display for InfoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InfoType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InfoType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown info type: {}", s))
    }
}

/// One entry of `GetInfo: Type=Tracks`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackInfo {
    pub name: String,
    /// `wave`, `label`, `time` or `note`
    pub kind: String,
    #[serde(default)]
    pub focused: i64,
    #[serde(default)]
    pub selected: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pan: Option<f64>,
    /// Linear voltage ratio, not dB
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gain: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channels: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solo: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mute: Option<i64>,
    #[serde(rename = "VZoomMin", skip_serializing_if = "Option::is_none")]
    pub vzoom_min: Option<f64>,
    #[serde(rename = "VZoomMax", skip_serializing_if = "Option::is_none")]
    pub vzoom_max: Option<f64>,
}

impl TrackInfo {
    pub fn is_wave(&self) -> bool {
        self.kind == "wave"
    }
}

/// One entry of `GetInfo: Type=Clips`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipInfo {
    pub track: usize,
    pub start: f64,
    pub end: f64,
    #[serde(default)]
    pub color: i64,
}

/// A label, sent on the wire as `[start, end, text]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64, String)", into = "(f64, f64, String)")]
pub struct Label {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl Label {
    pub fn midpoint(&self) -> f64 {
        (self.start + self.end) / 2.0
    }
}

impl From<(f64, f64, String)> for Label {
    fn from((start, end, text): (f64, f64, String)) -> Self {
        Self { start, end, text }
    }
}

impl From<Label> for (f64, f64, String) {
    fn from(label: Label) -> Self {
        (label.start, label.end, label.text)
    }
}

/// Labels of one label track, sent as `[track_index, [labels...]]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "(usize, Vec<Label>)", into = "(usize, Vec<Label>)")]
pub struct LabelTrack {
    pub track: usize,
    pub labels: Vec<Label>,
}

impl From<(usize, Vec<Label>)> for LabelTrack {
    fn from((track, labels): (usize, Vec<Label>)) -> Self {
        Self { track, labels }
    }
}

impl From<LabelTrack> for (usize, Vec<Label>) {
    fn from(track: LabelTrack) -> Self {
        (track.track, track.labels)
    }
}
