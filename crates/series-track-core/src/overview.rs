use crate::error::Result;
use crate::library::UserLibrary;
use crate::store::ShowInfoOptions;
use chrono::NaiveDate;
use series_track_models::{Episode, Show};
use std::path::PathBuf;

/// One show's slice of the overview: the episodes past the watch marker,
/// split into aired-but-unwatched and not-yet-aired.
#[derive(Debug, Clone)]
pub struct OverviewEntry {
    pub show: Show,
    pub poster: Option<PathBuf>,
    pub unseen: Vec<Episode>,
    pub upcoming: Vec<Episode>,
}

#[derive(Debug, Default)]
pub struct Overview {
    pub unseen: Vec<OverviewEntry>,
    pub upcoming: Vec<OverviewEntry>,
}

/// Assemble the home-screen overview for one user. `today` is passed in
/// rather than read from the clock so the split is reproducible.
pub async fn build_overview(
    library: &UserLibrary,
    username: &str,
    today: NaiveDate,
) -> Result<Overview> {
    let store = library.store();
    let today_key = today.format("%Y-%m-%d").to_string();
    let options = ShowInfoOptions { with_episodes: true, only_unseen: true, episode_limit: None };

    let mut candidates = Vec::new();
    for show_id in library.show_list(username).await? {
        let info = store.get_show_info(username, &show_id, &options).await?;
        let episodes = info.episodes.unwrap_or_default();
        if episodes.is_empty() {
            continue;
        }

        let (unseen, upcoming) = partition_episodes(episodes, &today_key);
        candidates.push(OverviewEntry { show: info.show, poster: info.poster, unseen, upcoming });
    }

    Ok(assemble(candidates))
}

/// Split a show's unseen slice by air date. Episodes whose date is entirely
/// unknown land in neither bucket; they cannot be called aired or upcoming.
fn partition_episodes(episodes: Vec<Episode>, today_key: &str) -> (Vec<Episode>, Vec<Episode>) {
    let mut unseen = Vec::new();
    let mut upcoming = Vec::new();

    for episode in episodes {
        if episode.air_date.is_unknown() {
            continue;
        }
        if episode.air_date.sort_key().as_str() < today_key {
            unseen.push(episode);
        } else {
            upcoming.push(episode);
        }
    }

    (unseen, upcoming)
}

/// A show makes the upcoming list only when its next upcoming episode is
/// close enough to where the user actually is: either there is nothing
/// unseen, or the upcoming episode belongs to the season currently being
/// watched, or the user is mid-season (not stuck before a season premiere)
/// and the upcoming season is at most one ahead. This keeps "next season
/// announced" noise off the list for shows the user is far behind on, while
/// still surfacing a premiere that directly continues their progress.
fn belongs_in_upcoming(entry: &OverviewEntry) -> bool {
    let Some(next_upcoming) = entry.upcoming.first() else {
        return false;
    };
    let Some(next_unseen) = entry.unseen.first() else {
        return true;
    };

    next_upcoming.season() == next_unseen.season()
        || (next_unseen.number() > 1 && next_upcoming.season() <= next_unseen.season() + 1)
}

fn assemble(candidates: Vec<OverviewEntry>) -> Overview {
    let mut unseen: Vec<OverviewEntry> =
        candidates.iter().filter(|entry| !entry.unseen.is_empty()).cloned().collect();
    let mut upcoming: Vec<OverviewEntry> =
        candidates.into_iter().filter(belongs_in_upcoming).collect();

    // Most recently aired backlog first; nearest premiere first.
    unseen.sort_by(|a, b| {
        let ka = a.unseen[0].air_date.sort_key();
        let kb = b.unseen[0].air_date.sort_key();
        kb.cmp(&ka)
    });
    upcoming.sort_by(|a, b| {
        let ka = a.upcoming[0].air_date.sort_key();
        let kb = b.upcoming[0].air_date.sort_key();
        ka.cmp(&kb)
    });

    Overview { unseen, upcoming }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{episode, full_show, library_fixture};
    use series_track_models::ShowStatus;

    fn entry(name: &str, unseen: Vec<Episode>, upcoming: Vec<Episode>) -> OverviewEntry {
        OverviewEntry {
            show: Show {
                id: name.to_string(),
                name: name.to_string(),
                status: ShowStatus::Returning,
                country: None,
                network: None,
                seasons: 1,
                first_aired: None,
                last_aired: None,
            },
            poster: None,
            unseen,
            upcoming,
        }
    }

    #[test]
    fn partition_splits_on_today_and_drops_unknown_dates() {
        let episodes = vec![
            episode(1, 2, "2023-01-08"),
            episode(1, 3, "2023-01-15"),
            episode(1, 4, "0000-00-00"),
        ];

        let (unseen, upcoming) = partition_episodes(episodes, "2023-01-10");
        assert_eq!(unseen.len(), 1);
        assert_eq!(unseen[0].id.to_string(), "00010002");
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].id.to_string(), "00010003");
    }

    #[test]
    fn partial_date_counts_as_upcoming_until_period_ends() {
        // A "sometime in 2023" episode resolves to 2023-12-31.
        let episodes = vec![episode(1, 1, "2023-00-00")];
        let (unseen, upcoming) = partition_episodes(episodes.clone(), "2023-06-15");
        assert!(unseen.is_empty());
        assert_eq!(upcoming.len(), 1);

        let (unseen, upcoming) = partition_episodes(episodes, "2024-01-01");
        assert_eq!(unseen.len(), 1);
        assert!(upcoming.is_empty());
    }

    #[test]
    fn upcoming_same_season_is_included() {
        let e = entry(
            "a",
            vec![episode(1, 2, "2023-01-08")],
            vec![episode(1, 3, "2023-01-15")],
        );
        assert!(belongs_in_upcoming(&e));
    }

    #[test]
    fn upcoming_without_backlog_is_included() {
        let e = entry("a", vec![], vec![episode(4, 1, "2023-09-01")]);
        assert!(belongs_in_upcoming(&e));
    }

    #[test]
    fn next_season_premiere_suppressed_when_stuck_at_season_start() {
        // The user has not even started season 2; season 3 noise is hidden.
        let e = entry(
            "a",
            vec![episode(2, 1, "2022-05-01")],
            vec![episode(3, 1, "2023-09-01")],
        );
        assert!(!belongs_in_upcoming(&e));
    }

    #[test]
    fn next_season_premiere_shown_when_mid_season() {
        let e = entry(
            "a",
            vec![episode(2, 4, "2022-05-01")],
            vec![episode(3, 1, "2023-09-01")],
        );
        assert!(belongs_in_upcoming(&e));
    }

    #[test]
    fn seasons_far_ahead_stay_suppressed() {
        let e = entry(
            "a",
            vec![episode(2, 4, "2022-05-01")],
            vec![episode(4, 1, "2023-09-01")],
        );
        assert!(!belongs_in_upcoming(&e));
    }

    #[test]
    fn lists_are_sorted_by_nearest_episode() {
        let overview = assemble(vec![
            entry("old", vec![episode(1, 1, "2022-01-01")], vec![episode(1, 2, "2023-06-01")]),
            entry("new", vec![episode(1, 1, "2023-01-01")], vec![episode(1, 2, "2023-02-01")]),
        ]);

        // Unseen: most recent backlog first.
        let unseen_names: Vec<&str> =
            overview.unseen.iter().map(|e| e.show.name.as_str()).collect();
        assert_eq!(unseen_names, vec!["new", "old"]);

        // Upcoming: nearest premiere first.
        let upcoming_names: Vec<&str> =
            overview.upcoming.iter().map(|e| e.show.name.as_str()).collect();
        assert_eq!(upcoming_names, vec!["new", "old"]);
    }

    #[tokio::test]
    async fn overview_end_to_end() {
        let fx = library_fixture();
        fx.source.add_full_show(full_show(
            "5",
            "Night Shift",
            vec![
                episode(1, 1, "2023-01-01"),
                episode(1, 2, "2023-01-08"),
                episode(1, 3, "2023-01-15"),
            ],
            false,
        ));
        fx.library.subscribe("alice", "5", None).await.unwrap();
        fx.library
            .set_watch_marker("alice", "5", Some("00010001".parse().unwrap()))
            .await
            .unwrap();

        let today = NaiveDate::from_ymd_opt(2023, 1, 10).unwrap();
        let overview = build_overview(&fx.library, "alice", today).await.unwrap();

        assert_eq!(overview.unseen.len(), 1);
        let entry = &overview.unseen[0];
        assert_eq!(entry.unseen.len(), 1);
        assert_eq!(entry.unseen[0].id.to_string(), "00010002");

        // The upcoming episode continues the season being watched, so the
        // show is surfaced in the upcoming list as well.
        assert_eq!(overview.upcoming.len(), 1);
        assert_eq!(overview.upcoming[0].upcoming[0].id.to_string(), "00010003");
    }

    #[tokio::test]
    async fn fully_watched_show_disappears_from_overview() {
        let fx = library_fixture();
        fx.source.add_full_show(full_show(
            "5",
            "Done",
            vec![episode(1, 1, "2020-01-01"), episode(1, 2, "2020-01-08")],
            true,
        ));
        fx.library.subscribe("alice", "5", None).await.unwrap();
        fx.library
            .set_watch_marker("alice", "5", Some("00010002".parse().unwrap()))
            .await
            .unwrap();

        let today = NaiveDate::from_ymd_opt(2023, 1, 10).unwrap();
        let overview = build_overview(&fx.library, "alice", today).await.unwrap();
        assert!(overview.unseen.is_empty());
        assert!(overview.upcoming.is_empty());
    }
}
