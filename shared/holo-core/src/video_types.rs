//! Video type decision rules
//!
//! Live broadcasts are split into Live Streams and Premieres by comparing the
//! broadcast duration with the nominal video duration: a Premiere plays a
//! countdown before the video, so its broadcast runs about two minutes longer.
//! Other uploads are Normal videos unless they are short enough to be Shorts,
//! which only an HTTP probe can confirm.

use crate::models::{VideoAttributes, VideoType};
use crate::time::parse_iso8601_duration;
use crate::Result;
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

/// Thresholds for the video type heuristics, in seconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationThresholds {
    /// Expected gap between broadcast and video duration for a Premiere
    pub premiere_countdown_secs: i64,

    /// Tolerance around the countdown, inclusive at both ends
    pub bounds_secs: i64,

    /// Videos at least this long are never Premieres
    pub premiere_cutoff_secs: i64,

    /// Broadcast videos at most this long are always Premieres
    pub live_stream_cutoff_secs: i64,

    /// Longest duration a Short can have
    pub short_ceiling_secs: i64,
}

impl Default for ClassificationThresholds {
    fn default() -> Self {
        Self {
            premiere_countdown_secs: 120,
            bounds_secs: 15,
            premiere_cutoff_secs: 3601,
            live_stream_cutoff_secs: 300,
            short_ceiling_secs: 60,
        }
    }
}

impl ClassificationThresholds {
    /// Lowest and highest duration difference still counted as a Premiere
    pub fn premiere_window(&self) -> (TimeDelta, TimeDelta) {
        let countdown = TimeDelta::seconds(self.premiere_countdown_secs);
        let bounds = TimeDelta::seconds(self.bounds_secs);
        (countdown - bounds, countdown + bounds)
    }

    pub fn premiere_cutoff(&self) -> TimeDelta {
        TimeDelta::seconds(self.premiere_cutoff_secs)
    }

    pub fn live_stream_cutoff(&self) -> TimeDelta {
        TimeDelta::seconds(self.live_stream_cutoff_secs)
    }

    pub fn short_ceiling(&self) -> TimeDelta {
        TimeDelta::seconds(self.short_ceiling_secs)
    }

    /// Check that every threshold is usable, returning a description of the first problem
    pub fn check(&self) -> std::result::Result<(), String> {
        let all = [
            ("premiere_countdown_secs", self.premiere_countdown_secs),
            ("bounds_secs", self.bounds_secs),
            ("premiere_cutoff_secs", self.premiere_cutoff_secs),
            ("live_stream_cutoff_secs", self.live_stream_cutoff_secs),
            ("short_ceiling_secs", self.short_ceiling_secs),
        ];
        if let Some((name, value)) = all.iter().find(|(_, value)| *value < 0) {
            return Err(format!("{} must not be negative (got {})", name, value));
        }
        if self.bounds_secs > self.premiere_countdown_secs {
            return Err("bounds_secs must not exceed premiere_countdown_secs".to_string());
        }
        if self.live_stream_cutoff_secs >= self.premiere_cutoff_secs {
            return Err("live_stream_cutoff_secs must be below premiere_cutoff_secs".to_string());
        }
        Ok(())
    }
}

/// Outcome of the Shorts probe request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStatus {
    /// The Shorts URL served the video
    Ok,
    /// The Shorts URL redirected to the regular watch page
    Redirect,
    /// Any other status code
    Other(u16),
}

impl ProbeStatus {
    pub fn from_status_code(code: u16) -> Self {
        match code {
            200 => ProbeStatus::Ok,
            300..=399 => ProbeStatus::Redirect,
            other => ProbeStatus::Other(other),
        }
    }

    /// Short on 200, Normal on a redirect, unknown otherwise
    pub fn video_type(&self) -> Option<VideoType> {
        match self {
            ProbeStatus::Ok => Some(VideoType::Short),
            ProbeStatus::Redirect => Some(VideoType::Normal),
            ProbeStatus::Other(_) => None,
        }
    }
}

/// Result of the offline rules for one video
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Classified(VideoType),
    /// Non-live video short enough to be a Short; the Shorts probe decides
    ProbeRequired,
}

/// Live Stream or Premiere for a live broadcast of the given nominal duration.
/// An absent broadcast duration always yields a Live Stream.
pub fn classify_live_broadcast(
    duration: TimeDelta,
    live_broadcast_duration: Option<TimeDelta>,
    thresholds: &ClassificationThresholds,
) -> VideoType {
    let Some(broadcast) = live_broadcast_duration else {
        return VideoType::LiveStream;
    };

    let (low, high) = thresholds.premiere_window();
    let difference = broadcast - duration;
    let mut video_type = if low <= difference && difference <= high {
        VideoType::Premiere
    } else {
        VideoType::LiveStream
    };

    if video_type == VideoType::Premiere && duration >= thresholds.premiere_cutoff() {
        video_type = VideoType::LiveStream;
    }
    if video_type == VideoType::LiveStream && duration <= thresholds.live_stream_cutoff() {
        video_type = VideoType::Premiere;
    }

    video_type
}

/// Normal when longer than the Short ceiling, otherwise the probe must decide
pub fn classify_non_live(duration: TimeDelta, thresholds: &ClassificationThresholds) -> Verdict {
    if duration > thresholds.short_ceiling() {
        Verdict::Classified(VideoType::Normal)
    } else {
        Verdict::ProbeRequired
    }
}

/// Apply the offline rules to one video's attributes
pub fn classify_attributes(
    attributes: &VideoAttributes,
    thresholds: &ClassificationThresholds,
) -> Result<Verdict> {
    let duration = parse_iso8601_duration(&attributes.duration)?;

    if attributes.live_broadcast {
        Ok(Verdict::Classified(classify_live_broadcast(
            duration,
            attributes.live_broadcast_duration(),
            thresholds,
        )))
    } else {
        Ok(classify_non_live(duration, thresholds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: i64) -> TimeDelta {
        TimeDelta::seconds(s)
    }

    #[test]
    fn test_premiere_window_is_inclusive() {
        let t = ClassificationThresholds::default();
        let duration = secs(1200);

        for difference in [105, 120, 135] {
            assert_eq!(
                classify_live_broadcast(duration, Some(duration + secs(difference)), &t),
                VideoType::Premiere,
                "difference {}",
                difference
            );
        }
        for difference in [104, 136, 0, 3600] {
            assert_eq!(
                classify_live_broadcast(duration, Some(duration + secs(difference)), &t),
                VideoType::LiveStream,
                "difference {}",
                difference
            );
        }
    }

    #[test]
    fn test_premiere_cutoff_forces_live_stream() {
        let t = ClassificationThresholds::default();
        let duration = secs(3601);
        assert_eq!(
            classify_live_broadcast(duration, Some(duration + secs(120)), &t),
            VideoType::LiveStream
        );

        let duration = secs(3600);
        assert_eq!(
            classify_live_broadcast(duration, Some(duration + secs(120)), &t),
            VideoType::Premiere
        );
    }

    #[test]
    fn test_live_stream_cutoff_forces_premiere() {
        let t = ClassificationThresholds::default();
        assert_eq!(
            classify_live_broadcast(secs(300), Some(secs(5000)), &t),
            VideoType::Premiere
        );
        assert_eq!(
            classify_live_broadcast(secs(301), Some(secs(5000)), &t),
            VideoType::LiveStream
        );
        assert_eq!(
            classify_live_broadcast(secs(30), None, &t),
            VideoType::LiveStream
        );
    }

    #[test]
    fn test_non_live_duration_rule() {
        let t = ClassificationThresholds::default();
        assert_eq!(
            classify_non_live(secs(61), &t),
            Verdict::Classified(VideoType::Normal)
        );
        assert_eq!(classify_non_live(secs(60), &t), Verdict::ProbeRequired);
        assert_eq!(classify_non_live(secs(0), &t), Verdict::ProbeRequired);
    }

    #[test]
    fn test_probe_status_mapping() {
        assert_eq!(ProbeStatus::from_status_code(200).video_type(), Some(VideoType::Short));
        assert_eq!(ProbeStatus::from_status_code(303).video_type(), Some(VideoType::Normal));
        assert_eq!(ProbeStatus::from_status_code(302).video_type(), Some(VideoType::Normal));
        assert_eq!(ProbeStatus::from_status_code(404).video_type(), None);
        assert_eq!(ProbeStatus::from_status_code(500), ProbeStatus::Other(500));
    }

    #[test]
    fn test_threshold_checks() {
        assert!(ClassificationThresholds::default().check().is_ok());

        let t = ClassificationThresholds {
            bounds_secs: 200,
            ..Default::default()
        };
        assert!(t.check().is_err());

        let t = ClassificationThresholds {
            short_ceiling_secs: -1,
            ..Default::default()
        };
        assert!(t.check().is_err());
    }
}
