//! Player - consumes playback intents from the canvas
//!
//! Tracks which item's media is current and whether it is playing. Only one
//! item plays at a time: toggling a different item pauses the current one
//! and switches to the new source. Decoding and output are left to whatever
//! backend is attached; this viewer only keeps and shows the state.

use log::info;
use timeline_core::{ItemRef, MediaSource, PlaybackIntent};

#[derive(Debug, Clone, PartialEq)]
pub struct NowPlaying {
    pub item: ItemRef,
    pub media: MediaSource,
    pub playing: bool,
}

#[derive(Debug, Default)]
pub struct Player {
    current: Option<NowPlaying>,
}

impl Player {
    pub fn current(&self) -> Option<&NowPlaying> {
        self.current.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        self.current.as_ref().is_some_and(|c| c.playing)
    }

    pub fn handle(&mut self, intent: PlaybackIntent) {
        match intent {
            PlaybackIntent::Toggle { item, media } => self.toggle(item, media),
        }
    }

    fn toggle(&mut self, item: ItemRef, media: MediaSource) {
        let same = self
            .current
            .as_ref()
            .is_some_and(|c| c.item.lane == item.lane && c.item.title == item.title);

        if same {
            if let Some(current) = self.current.as_mut() {
                current.playing = !current.playing;
                info!(
                    "{} `{}`",
                    if current.playing { "resume" } else { "pause" },
                    current.item.title
                );
            }
            return;
        }

        self.pause();
        info!("play `{}` from {}", item.title, media.url);
        self.current = Some(NowPlaying {
            item,
            media,
            playing: true,
        });
    }

    pub fn pause(&mut self) {
        if let Some(current) = self.current.as_mut() {
            if current.playing {
                current.playing = false;
                info!("pause `{}`", current.item.title);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use timeline_core::MediaKind;

    fn toggle(title: &str) -> PlaybackIntent {
        PlaybackIntent::Toggle {
            item: ItemRef {
                lane: "lane".into(),
                title: title.into(),
                index: 0,
            },
            media: MediaSource {
                kind: MediaKind::Audio,
                url: format!("{}.ogg", title),
                looping: false,
                volume: None,
                start_time: None,
            },
        }
    }

    #[test]
    fn test_toggle_same_item_pauses_and_resumes() {
        let mut player = Player::default();
        player.handle(toggle("a"));
        assert!(player.is_playing());
        player.handle(toggle("a"));
        assert!(!player.is_playing());
        player.handle(toggle("a"));
        assert!(player.is_playing());
    }

    #[test]
    fn test_toggle_other_item_switches() {
        let mut player = Player::default();
        player.handle(toggle("a"));
        player.handle(toggle("b"));
        let current = player.current().unwrap();
        assert_eq!(current.item.title, "b");
        assert!(current.playing);
    }
}
