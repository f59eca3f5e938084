//! Visiting routes and the choices that produce them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::geo::Coordinates;
use super::site::{Site, SiteId};

/// How a route draft picks its sites.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteMode {
    /// The remote optimizer picks and orders the sites.
    Guided,
    /// The visitor picks the sites; selection order is visiting order.
    Custom,
}

impl fmt::Display for RouteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteMode::Guided => f.write_str("guided"),
            RouteMode::Custom => f.write_str("custom"),
        }
    }
}

/// The fixed set of time budgets offered to the visitor.
///
/// Every budget is encoded in hours on the wire, half day included.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBudget {
    OneHour,
    TwoHours,
    ThreeHours,
    HalfDay,
    FullDay,
}

impl TimeBudget {
    pub const ALL: [TimeBudget; 5] = [
        TimeBudget::OneHour,
        TimeBudget::TwoHours,
        TimeBudget::ThreeHours,
        TimeBudget::HalfDay,
        TimeBudget::FullDay,
    ];

    pub fn hours(&self) -> f64 {
        match self {
            TimeBudget::OneHour => 1.0,
            TimeBudget::TwoHours => 2.0,
            TimeBudget::ThreeHours => 3.0,
            TimeBudget::HalfDay => 4.0,
            TimeBudget::FullDay => 8.0,
        }
    }

    /// Maps an hour count back onto a budget; only the offered values match.
    pub fn from_hours(hours: f64) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|budget| (budget.hours() - hours).abs() < f64::EPSILON)
    }
}

impl FromStr for TimeBudget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "1" | "1h" | "one_hour" => Ok(TimeBudget::OneHour),
            "2" | "2h" | "two_hours" => Ok(TimeBudget::TwoHours),
            "3" | "3h" | "three_hours" => Ok(TimeBudget::ThreeHours),
            "4" | "4h" | "half_day" => Ok(TimeBudget::HalfDay),
            "8" | "8h" | "full_day" => Ok(TimeBudget::FullDay),
            other => Err(format!("Unknown time budget: {}", other)),
        }
    }
}

/// An ordered visiting sequence. Order is both visiting order and polyline
/// draw order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Route {
    sites: Vec<Site>,
}

impl Route {
    pub fn new(sites: Vec<Site>) -> Self {
        Self { sites }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn site_ids(&self) -> Vec<SiteId> {
        self.sites.iter().map(|s| s.id).collect()
    }

    pub fn coordinates(&self) -> Vec<Coordinates> {
        self.sites.iter().map(Site::coordinates).collect()
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_budget_hours() {
        assert_eq!(TimeBudget::HalfDay.hours(), 4.0);
        assert_eq!(TimeBudget::FullDay.hours(), 8.0);
        assert_eq!(TimeBudget::from_hours(3.0), Some(TimeBudget::ThreeHours));
        assert_eq!(TimeBudget::from_hours(0.5), None);
    }

    #[test]
    fn test_time_budget_from_str() {
        assert_eq!("half day".parse::<TimeBudget>(), Ok(TimeBudget::HalfDay));
        assert_eq!("8h".parse::<TimeBudget>(), Ok(TimeBudget::FullDay));
        assert!("5".parse::<TimeBudget>().is_err());
    }

    #[test]
    fn test_empty_route() {
        let route = Route::empty();
        assert!(route.is_empty());
        assert!(route.coordinates().is_empty());
    }
}
