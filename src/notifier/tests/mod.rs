use super::*;
use crate::types::{MediaKind, NewItem, NextEpisode};
use chrono::{Days, NaiveDate, Utc};
use std::collections::BTreeSet;
use tokio::sync::broadcast::Receiver;


fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn yesterday() -> NaiveDate {
    today() - Days::new(1)
}

fn next_week() -> NaiveDate {
    today() + Days::new(7)
}

fn episode(air_date: NaiveDate, season: u32, number: u32) -> NextEpisode {
    NextEpisode {
        air_date,
        season_number: season,
        episode_number: number,
        name: None,
    }
}

fn new_series(external_id: i64, title: &str) -> NewItem {
    NewItem {
        external_id,
        title: title.to_string(),
        media_kind: MediaKind::Series,
        providers: BTreeSet::new(),
        release_date: None,
    }
}

fn new_film(external_id: i64, title: &str) -> NewItem {
    NewItem {
        media_kind: MediaKind::Film,
        ..new_series(external_id, title)
    }
}

/// Every event currently buffered for `rx`
fn drain(rx: &mut Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
