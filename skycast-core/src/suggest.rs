//! Debounced city search: raw keystrokes in, candidate city list out.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::{
    debounce::debouncer,
    model::CitySuggestion,
    provider::WeatherProvider,
};

/// How long the input must stay unchanged before a search fires.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Candidate cities requested per search.
pub const SUGGESTION_LIMIT: usize = 5;

/// Shortest settled text that triggers a provider call.
const MIN_QUERY_LEN: usize = 2;

type SearchFuture = Pin<Box<dyn Future<Output = Vec<CitySuggestion>> + Send>>;

/// City suggestion flow. Feed it keystrokes; it debounces them, runs the
/// provider search for settled text, and publishes the visible list.
///
/// A settled value supersedes any search still in flight: the stale call is
/// dropped, so only the most recent input ever updates the list. Dropping
/// the `CitySearch` tears the whole flow down.
#[derive(Debug)]
pub struct CitySearch {
    input: crate::debounce::DebounceInput<String>,
    suggestions_rx: watch::Receiver<Vec<CitySuggestion>>,
    searching_rx: watch::Receiver<bool>,
}

impl CitySearch {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        let (input, mut settled) = debouncer::<String>(SEARCH_DEBOUNCE);
        let (suggestions_tx, suggestions_rx) = watch::channel(Vec::new());
        let (searching_tx, searching_rx) = watch::channel(false);

        tokio::spawn(async move {
            let mut in_flight: Option<SearchFuture> = None;

            loop {
                tokio::select! {
                    biased;

                    text = settled.settled() => match text {
                        None => break,
                        Some(text) => {
                            if text.chars().count() < MIN_QUERY_LEN {
                                in_flight = None;
                                searching_tx.send_replace(false);
                                suggestions_tx.send_replace(Vec::new());
                            } else {
                                tracing::debug!(query = %text, "searching cities");
                                let provider = provider.clone();
                                in_flight = Some(Box::pin(async move {
                                    provider.search_cities(&text, SUGGESTION_LIMIT).await
                                }));
                                searching_tx.send_replace(true);
                            }
                        }
                    },

                    results = async { in_flight.as_mut().unwrap().await }, if in_flight.is_some() => {
                        in_flight = None;
                        searching_tx.send_replace(false);
                        suggestions_tx.send_replace(results);
                    }
                }
            }
        });

        Self { input, suggestions_rx, searching_rx }
    }

    /// Feed the current text of the search box.
    pub fn on_input(&self, text: impl Into<String>) {
        self.input.update(text.into());
    }

    /// Current visible suggestion list.
    pub fn suggestions(&self) -> Vec<CitySuggestion> {
        self.suggestions_rx.borrow().clone()
    }

    /// Whether a search call is currently in flight.
    pub fn is_searching(&self) -> bool {
        *self.searching_rx.borrow()
    }

    /// Subscribe to suggestion-list updates (for the presentation layer).
    pub fn subscribe(&self) -> watch::Receiver<Vec<CitySuggestion>> {
        self.suggestions_rx.clone()
    }
}
