//! Wire DTOs for the PokeCollect API.
//!
//! # Design
//! These types mirror the server's JSON schema (camelCase keys) but are
//! defined independently from the mock-server crate; the integration tests
//! catch schema drift between the two.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation::{email_shape, reset_code, strong_password};

/// An account as returned by profile endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    pub email: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A printed expansion within a series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardSet {
    pub id: String,
    pub name: String,
    pub series: String,
    pub language: String,
    #[serde(default)]
    pub symbol_url: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    pub printed_total: u32,
    pub total_cards: u32,
    /// `yyyy-MM-dd`, kept as sent by the server.
    pub release_date: String,
}

impl CardSet {
    /// Release date as `MMM yyyy` (e.g. `May 2024`), or the raw string when
    /// it does not parse.
    pub fn formatted_release_date(&self) -> String {
        NaiveDate::parse_from_str(&self.release_date, "%Y-%m-%d")
            .map(|d| d.format("%b %Y").to_string())
            .unwrap_or_else(|_| self.release_date.clone())
    }
}

/// Sets sharing a `series` name, in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Series {
    pub name: String,
    pub sets: Vec<CardSet>,
}

/// Group sets by series, keeping first-seen series order and the relative
/// order of sets within each series.
pub fn group_into_series(sets: Vec<CardSet>) -> Vec<Series> {
    let mut grouped: Vec<Series> = Vec::new();
    for set in sets {
        match grouped.iter_mut().find(|s| s.name == set.series) {
            Some(series) => series.sets.push(set),
            None => grouped.push(Series {
                name: set.series.clone(),
                sets: vec![set],
            }),
        }
    }
    grouped
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub name: String,
    pub number: String,
    pub rarity: String,
    #[serde(default)]
    pub small_image_url: Option<String>,
    #[serde(default)]
    pub large_image_url: Option<String>,
}

impl Card {
    /// `"001/264"` displays as `"001"`.
    pub fn display_number(&self) -> &str {
        match self.number.split_once('/') {
            Some((prefix, _)) => prefix,
            None => &self.number,
        }
    }

    pub fn best_image_url(&self) -> Option<&str> {
        self.large_image_url
            .as_deref()
            .or(self.small_image_url.as_deref())
    }
}

/// Card data embedded in collection responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionCard {
    pub id: String,
    pub name: String,
    pub number: String,
    #[serde(default)]
    pub rarity: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub small_image_url: Option<String>,
    #[serde(default)]
    pub large_image_url: Option<String>,
}

/// Response to an add/update call. The server may omit the card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionEntry {
    pub id: i64,
    pub user_id: i64,
    pub quantity: i32,
    pub acquired_date: String,
    #[serde(default)]
    pub card: Option<CollectionCard>,
}

/// One row of a user's collection listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionItem {
    pub id: i64,
    pub user_id: i64,
    pub quantity: i32,
    pub acquired_date: String,
    pub card: CollectionCard,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(custom(function = "email_shape"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters."))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 2, max = 100, message = "Name must be 2-100 characters."))]
    pub name: String,

    #[validate(custom(function = "email_shape"))]
    pub email: String,

    #[validate(custom(function = "strong_password"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(custom(function = "email_shape"))]
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VerifyResetCodeRequest {
    #[validate(custom(function = "email_shape"))]
    pub email: String,

    #[validate(custom(function = "reset_code"))]
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[validate(custom(function = "email_shape"))]
    pub email: String,

    #[validate(custom(function = "reset_code"))]
    pub code: String,

    #[validate(custom(function = "strong_password"))]
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddEntryRequest {
    pub card_id: String,
    pub user_id: i64,
    pub quantity: i32,
}

/// Token envelope returned by login and register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
}

/// Generic `{message}` envelope returned by the password-reset endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}
