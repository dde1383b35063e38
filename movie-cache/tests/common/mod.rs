//! Shared fixtures for integration tests.

#![allow(dead_code)]

use movie_cache::{CachedPage, MovieDetail, MovieSummary};

pub fn summary(id: u64, title: &str) -> MovieSummary {
    MovieSummary {
        id,
        title: title.to_string(),
        poster_path: Some(format!("/posters/{id}.jpg")),
        overview: format!("{title} overview"),
        release_date: Some("2014-11-05".to_string()),
        rating: 8.4,
    }
}

pub fn page(page: u32, titles: &[&str]) -> CachedPage {
    let results = titles
        .iter()
        .enumerate()
        .map(|(i, t)| summary(u64::from(page) * 1000 + i as u64, t))
        .collect();
    CachedPage::new(page, 20, results)
}

pub fn detail(id: u64, title: &str, runtime: u32) -> MovieDetail {
    MovieDetail {
        id,
        title: title.to_string(),
        overview: format!("{title} overview"),
        tagline: Some("Mankind was born on Earth. It was never meant to die here.".into()),
        poster_path: Some(format!("/posters/{id}.jpg")),
        backdrop_path: Some(format!("/backdrops/{id}.jpg")),
        release_date: Some("2014-11-05".to_string()),
        runtime_minutes: Some(runtime),
        genres: vec!["Adventure".into(), "Drama".into()],
        rating: 8.4,
        vote_count: 36_000,
    }
}
