//! Typed bindings for the Challonge tournament bracket API (v1).
//!
//! The crate converts the service's loosely-typed JSON payloads into the
//! domain types below and builds the `Authorization` header value the API
//! requires. Issuing requests is the caller's job: hand a parsed
//! [`serde_json::Value`] to an [`Adapters`] context and get typed entities
//! back.

pub mod adapters;
pub mod auth;
pub mod decode;

pub use auth::Credentials;
pub use decode::{
    Adapters, Decode, DecodeError, DecodeResult, Entity, EntityKind, RawRecord,
};

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Domain types — clean model, independent of the Challonge wire envelopes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tournament {
    pub id: u64,
    pub name: String,
    /// URL slug, unique per subdomain.
    pub url: String,
    pub full_challonge_url: Option<String>,
    pub live_image_url: Option<String>,
    pub description: Option<String>,
    pub subdomain: Option<String>,
    pub game_name: Option<String>,
    pub tournament_type: TournamentType,
    pub state: TournamentState,
    pub ranked_by: Option<RankedBy>,
    pub signup_cap: Option<u32>,
    pub participants_count: u32,
    /// Completion percentage, 0–100.
    pub progress_meter: u32,
    pub private: bool,
    pub open_signup: bool,
    pub hold_third_place_match: bool,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
    pub started_at: Option<DateTime<FixedOffset>>,
    pub completed_at: Option<DateTime<FixedOffset>>,
    pub started_checking_in_at: Option<DateTime<FixedOffset>>,
    /// Embedded roster; empty unless the caller requested it from the API.
    pub participants: Vec<Participant>,
    /// Embedded bracket; empty unless the caller requested it from the API.
    pub matches: Vec<Match>,
}

impl Tournament {
    /// Find a participant by ID in the embedded roster.
    pub fn find_participant(&self, participant_id: u64) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == participant_id)
    }

    /// All embedded matches involving the given participant, in payload order.
    pub fn matches_for(&self, participant_id: u64) -> Vec<&Match> {
        self.matches
            .iter()
            .filter(|m| m.involves(participant_id))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.state == TournamentState::Complete
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Participant {
    pub id: u64,
    pub tournament_id: u64,
    /// Group stage group, when the tournament has one.
    pub group_id: Option<u64>,
    pub seed: u32,
    pub name: Option<String>,
    pub display_name_with_invitation_email_address: Option<String>,
    pub username: Option<String>,
    pub challonge_username: Option<String>,
    pub challonge_email_address_verified: Option<String>,
    pub invite_email: Option<String>,
    pub email_hash: Option<String>,
    pub misc: Option<String>,
    pub icon: Option<String>,
    pub attached_participatable_portrait_url: Option<String>,
    pub final_rank: Option<i32>,
    pub invitation_id: Option<u64>,
    pub active: bool,
    pub can_check_in: bool,
    pub checked_in: bool,
    pub checked_in_at: Option<DateTime<FixedOffset>>,
    pub confirm_remove: bool,
    pub invitation_pending: bool,
    pub on_waiting_list: bool,
    pub participatable_or_invitation_attached: bool,
    pub reactivatable: bool,
    pub removable: bool,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
    /// Embedded matches; empty unless the caller requested them from the API.
    pub matches: Vec<Match>,
}

impl Participant {
    /// Preferred display name: explicit name first, then account usernames.
    pub fn display_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .or(self.challonge_username.as_deref())
            .or(self.username.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match {
    pub id: u64,
    pub tournament_id: u64,
    pub group_id: Option<u64>,
    pub state: MatchState,
    /// Bracket round; negative in the losers bracket of double elimination.
    pub round: i32,
    /// Bracket letter ("A", "B", …).
    pub identifier: Option<String>,
    pub location: Option<String>,
    pub player1_id: Option<u64>,
    pub player2_id: Option<u64>,
    pub winner_id: Option<u64>,
    pub loser_id: Option<u64>,
    pub player1_votes: Option<u32>,
    pub player2_votes: Option<u32>,
    /// Set scores as reported, e.g. "3-1,2-3,3-0".
    pub scores_csv: Option<String>,
    pub has_attachment: bool,
    pub attachment_count: Option<u32>,
    pub suggested_play_order: Option<u32>,
    pub scheduled_time: Option<DateTime<FixedOffset>>,
    pub started_at: Option<DateTime<FixedOffset>>,
    pub underway_at: Option<DateTime<FixedOffset>>,
    pub completed_at: Option<DateTime<FixedOffset>>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
    /// Embedded attachments; empty unless the caller requested them.
    pub attachments: Vec<Attachment>,
}

impl Match {
    pub fn is_complete(&self) -> bool {
        self.state == MatchState::Complete
    }

    /// Whether the given participant plays in this match.
    pub fn involves(&self, participant_id: u64) -> bool {
        self.player1_id == Some(participant_id) || self.player2_id == Some(participant_id)
    }
}

/// File or link attached to a match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attachment {
    pub id: u64,
    pub match_id: u64,
    pub user_id: u64,
    pub description: Option<String>,
    pub url: Option<String>,
    pub original_file_name: Option<String>,
    pub asset_url: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

// ---------------------------------------------------------------------------
// Wire enums — closed sets of states the service reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TournamentType {
    #[serde(rename = "single elimination")]
    SingleElimination,
    #[serde(rename = "double elimination")]
    DoubleElimination,
    #[serde(rename = "round robin")]
    RoundRobin,
    #[serde(rename = "swiss")]
    Swiss,
}

impl TournamentType {
    /// Wire spelling used by the service.
    pub fn as_str(self) -> &'static str {
        match self {
            TournamentType::SingleElimination => "single elimination",
            TournamentType::DoubleElimination => "double elimination",
            TournamentType::RoundRobin => "round robin",
            TournamentType::Swiss => "swiss",
        }
    }

    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "single elimination" => Some(TournamentType::SingleElimination),
            "double elimination" => Some(TournamentType::DoubleElimination),
            "round robin" => Some(TournamentType::RoundRobin),
            "swiss" => Some(TournamentType::Swiss),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TournamentState {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "checking_in")]
    CheckingIn,
    #[serde(rename = "checked_in")]
    CheckedIn,
    #[serde(rename = "underway")]
    Underway,
    #[serde(rename = "awaiting_review")]
    AwaitingReview,
    #[serde(rename = "complete")]
    Complete,
}

impl TournamentState {
    pub fn as_str(self) -> &'static str {
        match self {
            TournamentState::Pending => "pending",
            TournamentState::CheckingIn => "checking_in",
            TournamentState::CheckedIn => "checked_in",
            TournamentState::Underway => "underway",
            TournamentState::AwaitingReview => "awaiting_review",
            TournamentState::Complete => "complete",
        }
    }

    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TournamentState::Pending),
            "checking_in" => Some(TournamentState::CheckingIn),
            "checked_in" => Some(TournamentState::CheckedIn),
            "underway" => Some(TournamentState::Underway),
            "awaiting_review" => Some(TournamentState::AwaitingReview),
            "complete" => Some(TournamentState::Complete),
            _ => None,
        }
    }
}

/// Final-standings ranking criterion for group and round-robin formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RankedBy {
    #[serde(rename = "match wins")]
    MatchWins,
    #[serde(rename = "game wins")]
    GameWins,
    #[serde(rename = "points scored")]
    PointsScored,
    #[serde(rename = "points difference")]
    PointsDifference,
    #[serde(rename = "custom")]
    Custom,
}

impl RankedBy {
    pub fn as_str(self) -> &'static str {
        match self {
            RankedBy::MatchWins => "match wins",
            RankedBy::GameWins => "game wins",
            RankedBy::PointsScored => "points scored",
            RankedBy::PointsDifference => "points difference",
            RankedBy::Custom => "custom",
        }
    }

    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "match wins" => Some(RankedBy::MatchWins),
            "game wins" => Some(RankedBy::GameWins),
            "points scored" => Some(RankedBy::PointsScored),
            "points difference" => Some(RankedBy::PointsDifference),
            "custom" => Some(RankedBy::Custom),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchState {
    /// Waiting on a prerequisite match.
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "open")]
    Open,
    #[serde(rename = "complete")]
    Complete,
}

impl MatchState {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchState::Pending => "pending",
            MatchState::Open => "open",
            MatchState::Complete => "complete",
        }
    }

    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(MatchState::Pending),
            "open" => Some(MatchState::Open),
            "complete" => Some(MatchState::Complete),
            _ => None,
        }
    }
}
