//! Store enumerations: collections, sort orders, age ranges, permission groups
//! and category ids.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const CATEGORY_APPLICATION: &str = "APPLICATION";

/// Every category id the store knows about.
pub const CATEGORIES: &[&str] = &[
    "APPLICATION",
    "ANDROID_WEAR",
    "ART_AND_DESIGN",
    "AUTO_AND_VEHICLES",
    "BEAUTY",
    "BOOKS_AND_REFERENCE",
    "BUSINESS",
    "COMICS",
    "COMMUNICATION",
    "DATING",
    "EDUCATION",
    "ENTERTAINMENT",
    "EVENTS",
    "FINANCE",
    "FOOD_AND_DRINK",
    "HEALTH_AND_FITNESS",
    "HOUSE_AND_HOME",
    "LIBRARIES_AND_DEMO",
    "LIFESTYLE",
    "MAPS_AND_NAVIGATION",
    "MEDICAL",
    "MUSIC_AND_AUDIO",
    "NEWS_AND_MAGAZINES",
    "PARENTING",
    "PERSONALIZATION",
    "PHOTOGRAPHY",
    "PRODUCTIVITY",
    "SHOPPING",
    "SOCIAL",
    "SPORTS",
    "TOOLS",
    "TRAVEL_AND_LOCAL",
    "VIDEO_PLAYERS",
    "WATCH_FACE",
    "WEATHER",
    "GAME",
    "GAME_ACTION",
    "GAME_ADVENTURE",
    "GAME_ARCADE",
    "GAME_BOARD",
    "GAME_CARD",
    "GAME_CASINO",
    "GAME_CASUAL",
    "GAME_EDUCATIONAL",
    "GAME_MUSIC",
    "GAME_PUZZLE",
    "GAME_RACING",
    "GAME_ROLE_PLAYING",
    "GAME_SIMULATION",
    "GAME_SPORTS",
    "GAME_STRATEGY",
    "GAME_TRIVIA",
    "GAME_WORD",
    "FAMILY",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Collection {
    #[default]
    TopFree,
    TopPaid,
    Grossing,
}

impl Collection {
    /// Name of the upstream cluster holding this collection.
    pub fn cluster_name(self) -> &'static str {
        match self {
            Collection::TopFree => "topselling_free",
            Collection::TopPaid => "topselling_paid",
            Collection::Grossing => "topgrossing",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Collection::TopFree => "TOP_FREE",
            Collection::TopPaid => "TOP_PAID",
            Collection::Grossing => "GROSSING",
        }
    }
}

impl FromStr for Collection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "TOP_FREE" => Ok(Collection::TopFree),
            "TOP_PAID" => Ok(Collection::TopPaid),
            "GROSSING" => Ok(Collection::Grossing),
            other => Err(Error::InvalidArgument(format!("invalid collection {other}"))),
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Review ordering, sent to the upstream as its numeric code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sort {
    Helpfulness,
    #[default]
    Newest,
    Rating,
}

impl Sort {
    pub fn code(self) -> u8 {
        match self {
            Sort::Helpfulness => 1,
            Sort::Newest => 2,
            Sort::Rating => 3,
        }
    }
}

impl FromStr for Sort {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "HELPFULNESS" | "1" => Ok(Sort::Helpfulness),
            "NEWEST" | "2" => Ok(Sort::Newest),
            "RATING" | "3" => Ok(Sort::Rating),
            other => Err(Error::InvalidArgument(format!("invalid sort {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Age {
    #[serde(rename = "AGE_RANGE1")]
    FiveUnder,
    #[serde(rename = "AGE_RANGE2")]
    SixEight,
    #[serde(rename = "AGE_RANGE3")]
    NineUp,
}

impl Age {
    pub fn as_str(self) -> &'static str {
        match self {
            Age::FiveUnder => "AGE_RANGE1",
            Age::SixEight => "AGE_RANGE2",
            Age::NineUp => "AGE_RANGE3",
        }
    }
}

impl FromStr for Age {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "AGE_RANGE1" => Ok(Age::FiveUnder),
            "AGE_RANGE2" => Ok(Age::SixEight),
            "AGE_RANGE3" => Ok(Age::NineUp),
            other => Err(Error::InvalidArgument(format!("invalid age range {other}"))),
        }
    }
}

/// Index of a permission group in the permissions payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionGroup {
    Common = 0,
    Other = 1,
}

/// Price filter for search, sent as `price=<code>`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchPrice {
    #[default]
    All,
    Free,
    Paid,
}

impl SearchPrice {
    pub fn code(self) -> u8 {
        match self {
            SearchPrice::All => 0,
            SearchPrice::Free => 1,
            SearchPrice::Paid => 2,
        }
    }
}

impl FromStr for SearchPrice {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(SearchPrice::All),
            "free" => Ok(SearchPrice::Free),
            "paid" => Ok(SearchPrice::Paid),
            other => Err(Error::InvalidArgument(format!("invalid price {other}"))),
        }
    }
}
