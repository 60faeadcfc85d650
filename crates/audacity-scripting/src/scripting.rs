//! Editing operations over a scripting session

use crate::audio_tracks::{AudioTrack, audio_tracks};
use crate::settings::{CompressorSettings, NormalizeSettings};
use audacity_bridge::{Session, SessionConfig};
use audacity_core::{
    ClipInfo, Command, InfoType, LabelTrack, RawResponse, Result, ScriptError, TrackInfo,
};
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use tracing::{info, warn};

/// High-level client for a running Audacity.
///
/// Every editing operation starts by clearing the selection and most end
/// the same way, so operations can be chained without leaking selection
/// state into each other.
pub struct AudacityScripting {
    session: Session,
}

impl AudacityScripting {
    /// Open the platform's scripting pipes
    pub async fn connect(config: SessionConfig) -> Result<Self> {
        Ok(Self::new(Session::open(config).await?))
    }

    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// The underlying session, for raw commands
    pub fn session(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn close(self) {
        self.session.close();
    }

    /// Run one command and check its status
    pub async fn run_command(&mut self, command: impl Into<String>) -> Result<RawResponse> {
        let command = command.into();
        self.session.run(&command).await
    }

    // ==================== Queries ====================

    /// Decoded `GetInfo:` payload for `info_type`
    pub async fn get_info(&mut self, info_type: InfoType) -> Result<serde_json::Value> {
        self.get_info_as(info_type).await
    }

    pub async fn get_commands_info(&mut self) -> Result<serde_json::Value> {
        self.get_info(InfoType::Commands).await
    }

    pub async fn get_menus_info(&mut self) -> Result<serde_json::Value> {
        self.get_info(InfoType::Menus).await
    }

    pub async fn get_preferences_info(&mut self) -> Result<serde_json::Value> {
        self.get_info(InfoType::Preferences).await
    }

    pub async fn get_tracks_info(&mut self) -> Result<serde_json::Value> {
        self.get_info(InfoType::Tracks).await
    }

    pub async fn get_clips_info(&mut self) -> Result<serde_json::Value> {
        self.get_info(InfoType::Clips).await
    }

    pub async fn get_envelopes_info(&mut self) -> Result<serde_json::Value> {
        self.get_info(InfoType::Envelopes).await
    }

    pub async fn get_labels_info(&mut self) -> Result<serde_json::Value> {
        self.get_info(InfoType::Labels).await
    }

    pub async fn get_boxes_info(&mut self) -> Result<serde_json::Value> {
        self.get_info(InfoType::Boxes).await
    }

    pub async fn tracks(&mut self) -> Result<Vec<TrackInfo>> {
        self.get_info_as(InfoType::Tracks).await
    }

    pub async fn labels(&mut self) -> Result<Vec<LabelTrack>> {
        self.get_info_as(InfoType::Labels).await
    }

    pub async fn clips(&mut self) -> Result<Vec<ClipInfo>> {
        self.get_info_as(InfoType::Clips).await
    }

    /// Lowercase scripting ids known to the host, from its command and
    /// menu listings, sorted and without duplicates
    pub async fn get_scripting_id_list(&mut self) -> Result<Vec<String>> {
        let mut ids = BTreeSet::new();
        for info_type in [InfoType::Commands, InfoType::Menus] {
            let entries = self.get_info(info_type).await?;
            let entries = entries.as_array().ok_or_else(|| {
                ScriptError::UnexpectedPayload(format!("{} info is not a list", info_type))
            })?;

            ids.extend(
                entries
                    .iter()
                    .filter_map(|entry| entry.get("id")?.as_str())
                    .map(str::to_lowercase),
            );
        }
        Ok(ids.into_iter().collect())
    }

    /// Wave tracks with their label-delimited spans.
    ///
    /// `filter` restricts the result to tracks with those names.
    pub async fn get_audio_tracks_info<S: AsRef<str>>(
        &mut self,
        filter: Option<&[S]>,
    ) -> Result<Vec<AudioTrack>> {
        let tracks = self.tracks().await?;
        let labels = self.labels().await?;
        audio_tracks(&tracks, &labels, filter)
    }

    // ==================== Editing ====================

    pub async fn join_all_clips(&mut self) -> Result<()> {
        self.select_none().await?;
        self.run_command(Command::new("SelectAll")).await?;
        self.run_command(Command::new("Join")).await?;
        self.select_none().await
    }

    pub async fn split_all_audio_on_labels(&mut self) -> Result<()> {
        self.select_none().await?;
        self.run_command(Command::new("SelectAll")).await?;
        self.run_command(Command::new("SplitLabels")).await?;
        self.select_none().await
    }

    pub async fn rename_track_by_num(&mut self, track_name: &str, track_num: usize) -> Result<()> {
        self.select_none().await?;
        self.select_track(track_num).await?;
        self.run_command(Command::new("SetTrackStatus").quoted("Name", track_name))
            .await?;
        self.select_none().await
    }

    /// Open the Export Multiple dialog; the user completes it
    pub async fn export_multiple_prompt(&mut self) -> Result<()> {
        self.select_none().await?;
        self.run_command(Command::new("ExportMultiple")).await?;
        Ok(())
    }

    /// Close the project, prompting to save if needed
    pub async fn close_project_prompt(&mut self) -> Result<()> {
        self.select_none().await?;
        self.run_command(Command::new("Close")).await?;
        Ok(())
    }

    /// Normalize every span of the named tracks separately
    pub async fn normalize_tracks_by_label<S: AsRef<str>>(
        &mut self,
        track_names: &[S],
        settings: NormalizeSettings,
    ) -> Result<()> {
        self.apply_by_label(track_names, settings.command()).await
    }

    /// Compress every span of the named tracks separately
    pub async fn compress_tracks_by_label<S: AsRef<str>>(
        &mut self,
        track_names: &[S],
        settings: CompressorSettings,
    ) -> Result<()> {
        self.apply_by_label(track_names, settings.command()).await
    }

    /// Gain of the named track in whole dB
    pub async fn get_track_gain(&mut self, track_name: &str) -> Result<f64> {
        Ok(self.find_audio_track(track_name).await?.gain)
    }

    /// Set the named track's gain in dB
    pub async fn set_track_gain(&mut self, track_name: &str, gain: f64) -> Result<()> {
        self.select_none().await?;
        let track = self.find_audio_track(track_name).await?;

        self.select_track(track.track_num).await?;
        self.run_command(Command::new("SetTrackAudio").arg("Gain", gain))
            .await?;
        self.select_none().await
    }

    /// Mix the named tracks down into a new track at the end of the project
    pub async fn mix_and_render_to_new_track<S: AsRef<str>>(
        &mut self,
        track_names: &[S],
    ) -> Result<()> {
        self.select_none().await?;
        let audio = self.get_audio_tracks_info(Some(track_names)).await?;

        for track in &audio {
            self.run_command(
                Command::new("SelectTracks")
                    .arg("Mode", "Add")
                    .arg("Track", track.track_num),
            )
            .await?;
        }
        self.run_command(Command::new("MixAndRenderToNewTrack"))
            .await?;
        self.select_none().await
    }

    // ==================== Helpers ====================

    async fn get_info_as<T: DeserializeOwned>(&mut self, info_type: InfoType) -> Result<T> {
        let command = Command::new("GetInfo").arg("Type", info_type).to_string();
        self.session.get_json_as(&command).await
    }

    async fn select_none(&mut self) -> Result<()> {
        self.run_command(Command::new("SelectNone")).await?;
        Ok(())
    }

    async fn select_track(&mut self, track_num: usize) -> Result<()> {
        self.run_command(
            Command::new("SelectTracks")
                .arg("Mode", "Set")
                .arg("Track", track_num),
        )
        .await?;
        Ok(())
    }

    async fn find_audio_track(&mut self, track_name: &str) -> Result<AudioTrack> {
        let mut matches = self
            .get_audio_tracks_info(Some(&[track_name][..]))
            .await?;
        if matches.len() > 1 {
            warn!(
                "{} audio tracks are named {:?}, using the first",
                matches.len(),
                track_name
            );
        }
        if matches.is_empty() {
            return Err(ScriptError::TrackNotFound(track_name.to_string()));
        }
        Ok(matches.swap_remove(0))
    }

    async fn apply_by_label<S: AsRef<str>>(
        &mut self,
        track_names: &[S],
        effect: Command,
    ) -> Result<()> {
        self.select_none().await?;
        let audio = self.get_audio_tracks_info(Some(track_names)).await?;

        for track in &audio {
            info!(
                "Applying {} to {:?} in {} spans",
                effect.id(),
                track.name,
                track.clips.len()
            );
            for clip in &track.clips {
                self.run_command(
                    Command::new("Select")
                        .arg("Mode", "Set")
                        .arg("Track", track.track_num)
                        .arg("Start", clip.start)
                        .arg("End", clip.end),
                )
                .await?;
                self.run_command(effect.clone()).await?;
            }
        }

        self.select_none().await
    }
}
