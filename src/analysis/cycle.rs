//! Current-cycle segmentation over a channel's dated long-form videos.

use chrono::NaiveDate;

use crate::models::LongVideo;

use super::CYCLE_GAP_DAYS;

/// The current content cycle: the run of most-recent videos up to the first
/// publishing gap, plus its earliest upload date.
#[derive(Debug, Clone)]
pub struct CycleResult {
    pub start_date: Option<NaiveDate>,
    pub videos: Vec<LongVideo>,
}

/// Detect the current cycle based on the first gap >= `CYCLE_GAP_DAYS`.
///
/// Input must contain only long videos with a valid upload date, sorted by
/// upload_date DESC. Accumulates from the most recent video; the video
/// immediately before the gap is the cycle's last member, everything past
/// the gap is excluded.
pub fn detect_current_cycle(videos_desc: &[LongVideo]) -> CycleResult {
    if videos_desc.is_empty() {
        return CycleResult {
            start_date: None,
            videos: Vec::new(),
        };
    }

    let mut cycle: Vec<LongVideo> = Vec::new();
    for (i, video) in videos_desc.iter().enumerate() {
        cycle.push(video.clone());
        let Some(next) = videos_desc.get(i + 1) else {
            break;
        };
        let (Some(current_date), Some(next_date)) = (video.upload_date, next.upload_date) else {
            continue;
        };
        if (current_date - next_date).num_days() >= CYCLE_GAP_DAYS {
            break;
        }
    }

    let start_date = cycle.iter().filter_map(|v| v.upload_date).min();
    CycleResult { start_date, videos: cycle }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(id: &str, y: i32, m: u32, d: u32) -> LongVideo {
        LongVideo {
            video_id: id.to_string(),
            upload_date: NaiveDate::from_ymd_opt(y, m, d),
            duration_seconds: Some(1500),
            view_count: Some(100),
        }
    }

    #[test]
    fn test_no_gap_keeps_every_video() {
        let videos = vec![
            video("a", 2024, 6, 15),
            video("b", 2024, 5, 1),
            video("c", 2024, 3, 1),
        ];
        let cycle = detect_current_cycle(&videos);
        assert_eq!(cycle.videos.len(), 3);
        assert_eq!(cycle.start_date, NaiveDate::from_ymd_opt(2024, 3, 1));
    }

    #[test]
    fn test_gap_closes_cycle() {
        // 190 days between "b" and "c": the cycle is the two most recent.
        let videos = vec![
            video("a", 2024, 6, 15),
            video("b", 2024, 6, 5),
            video("c", 2023, 11, 28),
        ];
        let cycle = detect_current_cycle(&videos);
        assert_eq!(cycle.videos.len(), 2);
        assert_eq!(cycle.videos[0].video_id, "a");
        assert_eq!(cycle.videos[1].video_id, "b");
        assert_eq!(cycle.start_date, NaiveDate::from_ymd_opt(2024, 6, 5));
    }

    #[test]
    fn test_exact_threshold_gap_closes_cycle() {
        // Exactly 150 days still ends the cycle (>=, not >).
        let videos = vec![video("a", 2024, 6, 15), video("b", 2024, 1, 17)];
        let cycle = detect_current_cycle(&videos);
        assert_eq!(cycle.videos.len(), 1);
        assert_eq!(cycle.start_date, NaiveDate::from_ymd_opt(2024, 6, 15));
    }

    #[test]
    fn test_gap_just_under_threshold_keeps_going() {
        let videos = vec![video("a", 2024, 6, 15), video("b", 2024, 1, 18)];
        let cycle = detect_current_cycle(&videos);
        assert_eq!(cycle.videos.len(), 2);
    }

    #[test]
    fn test_empty_input() {
        let cycle = detect_current_cycle(&[]);
        assert!(cycle.videos.is_empty());
        assert_eq!(cycle.start_date, None);
    }
}
