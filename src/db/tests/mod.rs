use crate::catalog::ServiceId;
use crate::types::{MediaKind, NewItem, NextEpisode};
use chrono::NaiveDate;
use std::collections::BTreeSet;

mod migrations;
mod watchlist;

fn series(external_id: i64, title: &str) -> NewItem {
    NewItem {
        external_id,
        title: title.to_string(),
        media_kind: MediaKind::Series,
        providers: BTreeSet::from([ServiceId::Netflix]),
        release_date: None,
    }
}

fn film(external_id: i64, title: &str) -> NewItem {
    NewItem {
        external_id,
        title: title.to_string(),
        media_kind: MediaKind::Film,
        providers: BTreeSet::new(),
        release_date: NaiveDate::from_ymd_opt(2024, 3, 1),
    }
}

fn episode(date: (i32, u32, u32), season: u32, number: u32) -> NextEpisode {
    NextEpisode {
        air_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
        season_number: season,
        episode_number: number,
        name: Some(format!("Episode {number}")),
    }
}
