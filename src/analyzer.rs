//! Wardrobe usage analysis: summary counts plus donation and storage suggestions.
//!
//! Pure over its inputs; the caller supplies `now`.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

use crate::models::ClothingItem;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AnalyzerSettings {
    /// Items not worn for longer than this are "rarely used".
    pub stale_after_days: i64,
    /// Out-of-season items worn within this window stay out of storage suggestions.
    pub recent_wear_days: i64,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        AnalyzerSettings {
            stale_after_days: 90,
            recent_wear_days: 30,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Spring, Season::Summer, Season::Fall, Season::Winter];

    /// Meteorological seasons, northern hemisphere.
    pub fn from_month(month: u32) -> Self {
        match month {
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            9..=11 => Season::Fall,
            _ => Season::Winter,
        }
    }

    pub fn at(now: DateTime<Utc>) -> Self {
        Season::from_month(now.month())
    }

    /// Interprets a free-text season label. Returns every season for all-season labels.
    pub fn parse_label(label: &str) -> Vec<Season> {
        let normalized = label.trim().to_lowercase();
        match normalized.as_str() {
            "spring" => vec![Season::Spring],
            "summer" => vec![Season::Summer],
            "fall" | "autumn" => vec![Season::Fall],
            "winter" => vec![Season::Winter],
            "all-season" | "all season" | "all seasons" | "all-seasons" | "year-round"
            | "year round" | "all" => Season::ALL.to_vec(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Season::Spring => write!(f, "spring"),
            Season::Summer => write!(f, "summer"),
            Season::Fall => write!(f, "fall"),
            Season::Winter => write!(f, "winter"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Donate,
    Store,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WardrobeSummary {
    pub total_items: usize,
    pub rarely_used_count: usize,
    pub seasonal_storage_count: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SuggestedItem {
    pub item: ClothingItem,
    pub reason: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SuggestionGroup {
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    pub message: String,
    pub items: Vec<SuggestedItem>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WardrobeAnalysis {
    pub summary: WardrobeSummary,
    pub recommendations: Vec<SuggestionGroup>,
}

enum Usage {
    RarelyUsed(String),
    SeasonalStorage(String),
    Active,
}

fn classify(
    item: &ClothingItem,
    now: DateTime<Utc>,
    season: Season,
    settings: &AnalyzerSettings,
) -> Usage {
    let days_since_worn = item.last_worn_at.map(|worn| (now - worn).num_days());

    match days_since_worn {
        None => return Usage::RarelyUsed("Never worn".to_string()),
        Some(days) if days > settings.stale_after_days => {
            return Usage::RarelyUsed(format!("Not worn in {} days", days))
        }
        _ => {}
    }

    let seasons: Vec<Season> = item
        .seasons
        .iter()
        .flat_map(|label| Season::parse_label(label))
        .collect();
    let worn_recently = matches!(days_since_worn, Some(days) if days <= settings.recent_wear_days);

    if !seasons.is_empty() && !seasons.contains(&season) && !worn_recently {
        Usage::SeasonalStorage(format!("Out of season: currently {}", season))
    } else {
        Usage::Active
    }
}

pub fn analyze(
    items: &[ClothingItem],
    now: DateTime<Utc>,
    settings: &AnalyzerSettings,
) -> WardrobeAnalysis {
    let season = Season::at(now);
    let mut donate = Vec::new();
    let mut store = Vec::new();

    for item in items {
        match classify(item, now, season, settings) {
            Usage::RarelyUsed(reason) => donate.push(SuggestedItem {
                item: item.clone(),
                reason,
            }),
            Usage::SeasonalStorage(reason) => store.push(SuggestedItem {
                item: item.clone(),
                reason,
            }),
            Usage::Active => {}
        }
    }

    let summary = WardrobeSummary {
        total_items: items.len(),
        rarely_used_count: donate.len(),
        seasonal_storage_count: store.len(),
    };

    let mut recommendations = Vec::new();
    if !donate.is_empty() {
        recommendations.push(SuggestionGroup {
            kind: SuggestionKind::Donate,
            message: format!(
                "You haven't worn {} item(s) in over {} days. Consider donating them.",
                donate.len(),
                settings.stale_after_days
            ),
            items: donate,
        });
    }
    if !store.is_empty() {
        recommendations.push(SuggestionGroup {
            kind: SuggestionKind::Store,
            message: format!(
                "{} item(s) are out of season this {}. Consider putting them in storage.",
                store.len(),
                season
            ),
            items: store,
        });
    }

    WardrobeAnalysis {
        summary,
        recommendations,
    }
}
