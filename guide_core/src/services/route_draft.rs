//! Route draft state machine.
//!
//! ```text
//!            choose_mode                 select_time / toggle_site
//!   Unset ──────────────► Collecting ◄──────────────────────────────┐
//!     ▲                      │  ▲                                   │
//!     │                      │  │ (input no longer complete)        │
//!     │                      ▼  │                                   │
//!     │  cancel (any)      Ready ─────────────── begin_submit ──► Submitting
//!     ├───────────────────────────────────────────────────────────────┤
//!     │                                  success                      │
//!     └───────────────────────────────────────────────────────────────┘
//!                             failure: Submitting ─► Ready
//! ```
//!
//! The phase is derived from the collected input on every read, so a mutation
//! can never leave it stale. Each submission carries a [`GenerationToken`];
//! completions with any other token are discarded.

use std::fmt;

use tracing::{debug, info, warn};

use crate::models::{Route, RouteMode, Site, SiteId, TimeBudget};
use crate::services::route_generation::RouteError;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DraftPhase {
    /// No mode chosen.
    Unset,
    /// Mode chosen, input incomplete.
    Collecting,
    /// Input complete; submission allowed.
    Ready,
    /// One generation request in flight.
    Submitting,
}

/// Identifies one submission of a draft.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GenerationToken(u64);

impl GenerationToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for GenerationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The collected input, frozen at submission time.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftSnapshot {
    pub mode: RouteMode,
    pub time_budget: Option<TimeBudget>,
    /// Manually chosen sites in selection order (custom mode only).
    pub site_ids: Vec<SiteId>,
}

/// Handed out by [`RouteDraft::begin_submit`].
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub token: GenerationToken,
    pub draft: DraftSnapshot,
}

/// What [`RouteDraft::complete`] did with a generation result.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// The draft was reset; the route should become the active route.
    Succeeded(Route),
    /// The draft is back to `Ready`; the error is shown to the visitor.
    Failed(RouteError),
    /// The token did not match the in-flight submission; nothing changed.
    Stale,
}

/// Workflow rule violations. None of them change the draft.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DraftError {
    #[error("Choose guided or custom mode first")]
    NoMode,

    #[error("Sites can only be picked in custom mode")]
    NotCustomMode,

    #[error("Site {0} is not in the current catalog view")]
    SiteNotAvailable(SiteId),

    #[error("The draft is not ready to submit")]
    NotReady,

    #[error("A route is already being generated")]
    AlreadySubmitting,
}

#[derive(Debug, Clone, Default)]
pub struct RouteDraft {
    mode: Option<RouteMode>,
    time_budget: Option<TimeBudget>,
    selected_sites: Vec<SiteId>,
    in_flight: Option<GenerationToken>,
    last_error: Option<String>,
    // Never reset, so tokens from discarded submissions cannot match again.
    next_token: u64,
}

impl RouteDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> DraftPhase {
        if self.in_flight.is_some() {
            return DraftPhase::Submitting;
        }
        match self.mode {
            None => DraftPhase::Unset,
            Some(mode) if self.is_complete(mode) => DraftPhase::Ready,
            Some(_) => DraftPhase::Collecting,
        }
    }

    fn is_complete(&self, mode: RouteMode) -> bool {
        self.time_budget.is_some()
            && (mode == RouteMode::Guided || !self.selected_sites.is_empty())
    }

    pub fn mode(&self) -> Option<RouteMode> {
        self.mode
    }

    pub fn time_budget(&self) -> Option<TimeBudget> {
        self.time_budget
    }

    pub fn selected_sites(&self) -> &[SiteId] {
        &self.selected_sites
    }

    pub fn is_selected(&self, id: SiteId) -> bool {
        self.selected_sites.contains(&id)
    }

    pub fn in_flight(&self) -> Option<GenerationToken> {
        self.in_flight
    }

    /// Whether the submit action should be enabled.
    pub fn can_submit(&self) -> bool {
        self.phase() == DraftPhase::Ready
    }

    /// Error from the last failed submission, until dismissed.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    fn ensure_idle(&self) -> Result<(), DraftError> {
        if self.in_flight.is_some() {
            return Err(DraftError::AlreadySubmitting);
        }
        Ok(())
    }

    /// Enter `mode`. Switching modes discards the time and site choices.
    pub fn choose_mode(&mut self, mode: RouteMode) -> Result<(), DraftError> {
        self.ensure_idle()?;
        if self.mode == Some(mode) {
            return Ok(());
        }
        debug!(%mode, "Route draft mode chosen");
        self.mode = Some(mode);
        self.time_budget = None;
        self.selected_sites.clear();
        self.last_error = None;
        Ok(())
    }

    pub fn select_time(&mut self, budget: TimeBudget) -> Result<(), DraftError> {
        self.ensure_idle()?;
        if self.mode.is_none() {
            return Err(DraftError::NoMode);
        }
        self.time_budget = Some(budget);
        Ok(())
    }

    pub fn clear_time(&mut self) -> Result<(), DraftError> {
        self.ensure_idle()?;
        self.time_budget = None;
        Ok(())
    }

    /// Pick or unpick a site in custom mode.
    ///
    /// `available` is the category-filtered catalog the visitor is looking
    /// at; only its sites can be picked. Returns whether the site is now
    /// selected.
    pub fn toggle_site(&mut self, id: SiteId, available: &[Site]) -> Result<bool, DraftError> {
        self.ensure_idle()?;
        match self.mode {
            None => return Err(DraftError::NoMode),
            Some(RouteMode::Guided) => return Err(DraftError::NotCustomMode),
            Some(RouteMode::Custom) => {}
        }

        if let Some(pos) = self.selected_sites.iter().position(|s| *s == id) {
            self.selected_sites.remove(pos);
            return Ok(false);
        }
        if !available.iter().any(|s| s.id == id) {
            return Err(DraftError::SiteNotAvailable(id));
        }
        self.selected_sites.push(id);
        Ok(true)
    }

    /// Drop picked sites that are not in `available` any more (the filter or
    /// the catalog changed). Returns how many were dropped.
    pub fn retain_available(&mut self, available: &[Site]) -> usize {
        let before = self.selected_sites.len();
        self.selected_sites
            .retain(|id| available.iter().any(|s| s.id == *id));
        let dropped = before - self.selected_sites.len();
        if dropped > 0 {
            debug!(dropped, "Unpicked sites hidden by the category filter");
        }
        dropped
    }

    /// `Ready → Submitting`.
    pub fn begin_submit(&mut self) -> Result<Submission, DraftError> {
        match self.phase() {
            DraftPhase::Submitting => return Err(DraftError::AlreadySubmitting),
            DraftPhase::Ready => {}
            DraftPhase::Unset | DraftPhase::Collecting => return Err(DraftError::NotReady),
        }
        let Some(mode) = self.mode else {
            return Err(DraftError::NotReady);
        };

        self.next_token += 1;
        let token = GenerationToken(self.next_token);
        self.in_flight = Some(token);
        self.last_error = None;
        info!(%token, %mode, "Route generation submitted");

        Ok(Submission {
            token,
            draft: DraftSnapshot {
                mode,
                time_budget: self.time_budget,
                site_ids: self.selected_sites.clone(),
            },
        })
    }

    /// Apply the result of the submission identified by `token`.
    pub fn complete(
        &mut self,
        token: GenerationToken,
        result: Result<Route, RouteError>,
    ) -> Completion {
        if self.in_flight != Some(token) {
            warn!(%token, "Discarding stale route generation result");
            return Completion::Stale;
        }
        self.in_flight = None;

        match result {
            Ok(route) => {
                info!(%token, sites = route.len(), "Route generated");
                self.reset_input();
                Completion::Succeeded(route)
            }
            Err(e) => {
                warn!(%token, error = %e, "Route generation failed");
                self.last_error = Some(e.to_string());
                Completion::Failed(e)
            }
        }
    }

    /// Close the planner from any phase. Any in-flight result becomes stale.
    pub fn cancel(&mut self) {
        if let Some(token) = self.in_flight.take() {
            info!(%token, "Route draft cancelled while generating");
        }
        self.reset_input();
    }

    fn reset_input(&mut self) {
        self.mode = None;
        self.time_budget = None;
        self.selected_sites.clear();
        self.last_error = None;
    }
}

#[cfg(test)]
#[path = "route_draft_tests.rs"]
mod route_draft_tests;
