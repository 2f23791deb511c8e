//! Entity adapters: the per-type conversion from a raw JSON record to a
//! domain type. Each adapter pulls every field through the decode helpers
//! and re-invokes the context for embedded entities, so a whole payload
//! tree materializes from one call.

use crate::decode::{
    Adapters, Decode, DecodeError, DecodeResult, EntityKind, Fields, RawRecord, mismatch,
};
use crate::{
    Attachment, Match, MatchState, Participant, RankedBy, Tournament, TournamentState,
    TournamentType,
};
use serde_json::Value;

/// Reject non-objects and peel the service's single-key envelope when
/// present: the API delivers `{"participant": {...}}` and friends, but the
/// bare record form is accepted too.
fn entity_record<'a>(value: &'a Value, kind: EntityKind) -> DecodeResult<&'a RawRecord> {
    let record = value.as_object().ok_or_else(|| mismatch("object", value))?;
    match record.get(kind.tag()) {
        Some(inner) => inner.as_object().ok_or_else(|| mismatch("object", inner)),
        None => Ok(record),
    }
}

fn wire_enum<T>(
    value: &Value,
    expected: &'static str,
    parse: fn(&str) -> Option<T>,
) -> DecodeResult<T> {
    let raw = value.as_str().ok_or_else(|| mismatch(expected, value))?;
    parse(raw).ok_or_else(|| DecodeError::SchemaMismatch {
        expected,
        found: format!("\"{raw}\""),
    })
}

impl Decode for TournamentType {
    fn decode(value: &Value, _ctx: &Adapters) -> DecodeResult<Self> {
        wire_enum(value, "tournament type", TournamentType::from_wire)
    }
}

impl Decode for TournamentState {
    fn decode(value: &Value, _ctx: &Adapters) -> DecodeResult<Self> {
        wire_enum(value, "tournament state", TournamentState::from_wire)
    }
}

impl Decode for RankedBy {
    fn decode(value: &Value, _ctx: &Adapters) -> DecodeResult<Self> {
        wire_enum(value, "ranking criterion", RankedBy::from_wire)
    }
}

impl Decode for MatchState {
    fn decode(value: &Value, _ctx: &Adapters) -> DecodeResult<Self> {
        wire_enum(value, "match state", MatchState::from_wire)
    }
}

impl Decode for Tournament {
    fn decode(value: &Value, ctx: &Adapters) -> DecodeResult<Self> {
        let record = entity_record(value, EntityKind::Tournament)?;
        let f = Fields::new(record, "tournament", ctx);
        Ok(Tournament {
            id: f.require("id")?,
            name: f.require("name")?,
            url: f.require("url")?,
            full_challonge_url: f.optional("full_challonge_url")?,
            live_image_url: f.optional("live_image_url")?,
            description: f.optional("description")?,
            subdomain: f.optional("subdomain")?,
            game_name: f.optional("game_name")?,
            tournament_type: f.require("tournament_type")?,
            state: f.require("state")?,
            ranked_by: f.optional("ranked_by")?,
            signup_cap: f.optional("signup_cap")?,
            participants_count: f.require("participants_count")?,
            progress_meter: f.require("progress_meter")?,
            private: f.require("private")?,
            open_signup: f.require("open_signup")?,
            hold_third_place_match: f.require("hold_third_place_match")?,
            created_at: f.require("created_at")?,
            updated_at: f.require("updated_at")?,
            started_at: f.optional("started_at")?,
            completed_at: f.optional("completed_at")?,
            started_checking_in_at: f.optional("started_checking_in_at")?,
            participants: f.embedded("participants")?,
            matches: f.embedded("matches")?,
        })
    }
}

impl Decode for Participant {
    fn decode(value: &Value, ctx: &Adapters) -> DecodeResult<Self> {
        let record = entity_record(value, EntityKind::Participant)?;
        let f = Fields::new(record, "participant", ctx);
        Ok(Participant {
            id: f.require("id")?,
            tournament_id: f.require("tournament_id")?,
            group_id: f.optional("group_id")?,
            seed: f.require("seed")?,
            name: f.optional("name")?,
            display_name_with_invitation_email_address: f
                .optional("display_name_with_invitation_email_address")?,
            username: f.optional("username")?,
            challonge_username: f.optional("challonge_username")?,
            challonge_email_address_verified: f.optional("challonge_email_address_verified")?,
            invite_email: f.optional("invite_email")?,
            email_hash: f.optional("email_hash")?,
            misc: f.optional("misc")?,
            icon: f.optional("icon")?,
            attached_participatable_portrait_url: f
                .optional("attached_participatable_portrait_url")?,
            final_rank: f.optional("final_rank")?,
            invitation_id: f.optional("invitation_id")?,
            active: f.require("active")?,
            can_check_in: f.require("can_check_in")?,
            checked_in: f.require("checked_in")?,
            checked_in_at: f.optional("checked_in_at")?,
            confirm_remove: f.require("confirm_remove")?,
            invitation_pending: f.require("invitation_pending")?,
            on_waiting_list: f.require("on_waiting_list")?,
            participatable_or_invitation_attached: f
                .require("participatable_or_invitation_attached")?,
            reactivatable: f.require("reactivatable")?,
            removable: f.require("removable")?,
            created_at: f.require("created_at")?,
            updated_at: f.require("updated_at")?,
            matches: f.embedded("matches")?,
        })
    }
}

impl Decode for Match {
    fn decode(value: &Value, ctx: &Adapters) -> DecodeResult<Self> {
        let record = entity_record(value, EntityKind::Match)?;
        let f = Fields::new(record, "match", ctx);
        Ok(Match {
            id: f.require("id")?,
            tournament_id: f.require("tournament_id")?,
            group_id: f.optional("group_id")?,
            state: f.require("state")?,
            round: f.require("round")?,
            identifier: f.optional("identifier")?,
            location: f.optional("location")?,
            player1_id: f.optional("player1_id")?,
            player2_id: f.optional("player2_id")?,
            winner_id: f.optional("winner_id")?,
            loser_id: f.optional("loser_id")?,
            player1_votes: f.optional("player1_votes")?,
            player2_votes: f.optional("player2_votes")?,
            scores_csv: f.optional("scores_csv")?,
            has_attachment: f.require("has_attachment")?,
            attachment_count: f.optional("attachment_count")?,
            suggested_play_order: f.optional("suggested_play_order")?,
            scheduled_time: f.optional("scheduled_time")?,
            started_at: f.optional("started_at")?,
            underway_at: f.optional("underway_at")?,
            completed_at: f.optional("completed_at")?,
            created_at: f.require("created_at")?,
            updated_at: f.require("updated_at")?,
            attachments: f.embedded("attachments")?,
        })
    }
}

impl Decode for Attachment {
    fn decode(value: &Value, ctx: &Adapters) -> DecodeResult<Self> {
        let record = entity_record(value, EntityKind::Attachment)?;
        let f = Fields::new(record, "match_attachment", ctx);
        Ok(Attachment {
            id: f.require("id")?,
            match_id: f.require("match_id")?,
            user_id: f.require("user_id")?,
            description: f.optional("description")?,
            url: f.optional("url")?,
            original_file_name: f.optional("original_file_name")?,
            asset_url: f.optional("asset_url")?,
            created_at: f.require("created_at")?,
            updated_at: f.require("updated_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::parse_timestamp;
    use serde_json::json;

    fn participant_payload() -> Value {
        json!({
            "participant": {
                "id": 16543993u64,
                "tournament_id": 1086875,
                "group_id": null,
                "seed": 1,
                "name": "Stefan",
                "display_name_with_invitation_email_address": "Stefan",
                "username": null,
                "challonge_username": null,
                "challonge_email_address_verified": null,
                "invite_email": null,
                "email_hash": null,
                "misc": null,
                "icon": null,
                "attached_participatable_portrait_url": null,
                "final_rank": null,
                "invitation_id": null,
                "active": true,
                "can_check_in": false,
                "checked_in": false,
                "checked_in_at": null,
                "confirm_remove": true,
                "invitation_pending": false,
                "on_waiting_list": false,
                "participatable_or_invitation_attached": false,
                "reactivatable": false,
                "removable": true,
                "created_at": "2015-01-19T16:57:17-05:00",
                "updated_at": "2015-01-19T16:57:17-05:00",
            }
        })
    }

    fn match_payload(id: u64, round: i32) -> Value {
        json!({
            "match": {
                "id": id,
                "tournament_id": 1086875,
                "group_id": null,
                "state": "complete",
                "round": round,
                "identifier": "A",
                "location": null,
                "player1_id": 16543993u64,
                "player2_id": 16543997u64,
                "winner_id": 16543993u64,
                "loser_id": 16543997u64,
                "player1_votes": null,
                "player2_votes": null,
                "scores_csv": "3-1",
                "has_attachment": false,
                "attachment_count": null,
                "suggested_play_order": 1,
                "scheduled_time": null,
                "started_at": "2015-01-19T16:57:17-05:00",
                "underway_at": null,
                "completed_at": "2015-01-19T17:32:01-05:00",
                "created_at": "2015-01-19T16:57:17-05:00",
                "updated_at": "2015-01-19T17:32:01-05:00",
            }
        })
    }

    fn attachment_payload(id: u64) -> Value {
        json!({
            "match_attachment": {
                "id": id,
                "match_id": 404,
                "user_id": 7,
                "description": null,
                "url": "https://example.org/vod",
                "original_file_name": null,
                "asset_url": null,
                "created_at": "2015-01-19T18:00:00-05:00",
                "updated_at": "2015-01-19T18:00:00-05:00",
            }
        })
    }

    fn tournament_payload() -> Value {
        let mut final_match = match_payload(404, 1);
        final_match["match"]["has_attachment"] = json!(true);
        final_match["match"]["attachment_count"] = json!(2);
        final_match["match"]["attachments"] =
            json!([attachment_payload(91), attachment_payload(92)]);
        json!({
            "tournament": {
                "id": 1086875,
                "name": "Community Cup",
                "url": "communitycup",
                "full_challonge_url": "http://challonge.com/communitycup",
                "live_image_url": null,
                "description": "",
                "subdomain": null,
                "game_name": "Rocket League",
                "tournament_type": "single elimination",
                "state": "complete",
                "ranked_by": "match wins",
                "signup_cap": null,
                "participants_count": 2,
                "progress_meter": 100,
                "private": false,
                "open_signup": false,
                "hold_third_place_match": false,
                "created_at": "2015-01-19T16:47:30-05:00",
                "updated_at": "2015-01-19T17:32:01-05:00",
                "started_at": "2015-01-19T16:57:17-05:00",
                "completed_at": "2015-01-19T17:32:01-05:00",
                "started_checking_in_at": null,
                "participants": [participant_payload()],
                "matches": [final_match],
            }
        })
    }

    // -----------------------------------------------------------------------
    // Participant
    // -----------------------------------------------------------------------

    #[test]
    fn participant_resolves_optional_fields_to_none() {
        let ctx = Adapters::new();
        let mut payload = participant_payload();
        // Absent and explicit null must come out the same.
        payload["participant"]
            .as_object_mut()
            .unwrap()
            .remove("final_rank");
        let participant: Participant = ctx.decode(&payload).unwrap();
        assert_eq!(participant.id, 16543993);
        assert_eq!(participant.seed, 1);
        assert_eq!(participant.name.as_deref(), Some("Stefan"));
        assert_eq!(participant.group_id, None);
        assert_eq!(participant.final_rank, None);
        assert_eq!(participant.checked_in_at, None);
        assert!(participant.matches.is_empty());
        assert_eq!(
            participant.created_at,
            parse_timestamp("2015-01-19T16:57:17-05:00").unwrap()
        );
    }

    #[test]
    fn participant_missing_required_field_fails() {
        let ctx = Adapters::new();

        let mut nulled = participant_payload();
        nulled["participant"]["seed"] = Value::Null;
        assert_eq!(
            ctx.decode::<Participant>(&nulled),
            Err(DecodeError::MissingField {
                entity: "participant",
                field: "seed",
            })
        );

        let mut removed = participant_payload();
        removed["participant"].as_object_mut().unwrap().remove("id");
        assert_eq!(
            ctx.decode::<Participant>(&removed),
            Err(DecodeError::MissingField {
                entity: "participant",
                field: "id",
            })
        );
    }

    #[test]
    fn participant_embeds_matches_in_payload_order() {
        let ctx = Adapters::new();
        let mut payload = participant_payload();
        payload["participant"]["matches"] = json!([match_payload(102, 2), match_payload(101, 1)]);
        let participant: Participant = ctx.decode(&payload).unwrap();
        let ids: Vec<u64> = participant.matches.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![102, 101], "embedding must not re-sort");
    }

    #[test]
    fn wrapped_and_bare_records_decode_identically() {
        let ctx = Adapters::new();
        let wrapped = participant_payload();
        let bare = wrapped["participant"].clone();
        assert_eq!(
            ctx.decode::<Participant>(&wrapped).unwrap(),
            ctx.decode::<Participant>(&bare).unwrap()
        );
    }

    #[test]
    fn embedded_entities_may_be_wrapped_or_bare() {
        let ctx = Adapters::new();
        let bare = match_payload(102, 2)["match"].clone();
        let mut payload = participant_payload();
        payload["participant"]["matches"] = json!([match_payload(101, 1), bare]);
        let participant: Participant = ctx.decode(&payload).unwrap();
        let ids: Vec<u64> = participant.matches.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![101, 102]);
    }

    // -----------------------------------------------------------------------
    // Match
    // -----------------------------------------------------------------------

    #[test]
    fn match_decodes_states_and_ids() {
        let ctx = Adapters::new();
        let m: Match = ctx.decode(&match_payload(404, -2)).unwrap();
        assert_eq!(m.state, MatchState::Complete);
        assert!(m.is_complete());
        assert_eq!(m.round, -2);
        assert_eq!(m.winner_id, Some(16543993));
        assert_eq!(m.scheduled_time, None);
        assert!(m.involves(16543997));
        assert!(!m.involves(1));
    }

    #[test]
    fn unknown_wire_state_is_a_schema_mismatch() {
        let ctx = Adapters::new();
        let mut payload = match_payload(404, 1);
        payload["match"]["state"] = json!("closed");
        assert_eq!(
            ctx.decode::<Match>(&payload),
            Err(DecodeError::SchemaMismatch {
                expected: "match state",
                found: "\"closed\"".into(),
            })
        );
    }

    #[test]
    fn malformed_timestamp_in_record_fails() {
        let ctx = Adapters::new();
        let mut payload = match_payload(404, 1);
        payload["match"]["completed_at"] = json!("last tuesday");
        assert_eq!(
            ctx.decode::<Match>(&payload),
            Err(DecodeError::MalformedTimestamp("last tuesday".into()))
        );
    }

    #[test]
    fn non_object_payload_is_a_schema_mismatch() {
        let ctx = Adapters::new();
        assert_eq!(
            ctx.decode::<Match>(&json!("match 404")),
            Err(DecodeError::SchemaMismatch {
                expected: "object",
                found: "string".into(),
            })
        );
    }

    // -----------------------------------------------------------------------
    // Tournament — full tree
    // -----------------------------------------------------------------------

    #[test]
    fn tournament_materializes_three_levels_deep() {
        let ctx = Adapters::new();
        let tournament: Tournament = ctx.decode(&tournament_payload()).unwrap();
        assert_eq!(tournament.tournament_type, TournamentType::SingleElimination);
        assert_eq!(tournament.state, TournamentState::Complete);
        assert_eq!(tournament.ranked_by, Some(RankedBy::MatchWins));
        assert_eq!(tournament.description.as_deref(), Some(""));
        assert_eq!(tournament.participants.len(), 1);
        assert_eq!(tournament.matches.len(), 1);

        let final_match = &tournament.matches[0];
        assert!(final_match.has_attachment);
        let ids: Vec<u64> = final_match.attachments.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![91, 92]);
    }

    #[test]
    fn tournament_navigation_helpers_walk_embedded_entities() {
        let ctx = Adapters::new();
        let tournament: Tournament = ctx.decode(&tournament_payload()).unwrap();
        assert!(tournament.is_complete());
        let stefan = tournament.find_participant(16543993).unwrap();
        assert_eq!(stefan.display_name(), Some("Stefan"));
        assert!(tournament.find_participant(42).is_none());

        let played = tournament.matches_for(16543993);
        assert_eq!(played.len(), 1);
        assert_eq!(played[0].id, 404);
        assert!(tournament.matches_for(42).is_empty());
    }

    #[test]
    fn failure_in_a_nested_entity_aborts_the_whole_decode() {
        let ctx = Adapters::new();
        let mut payload = tournament_payload();
        payload["tournament"]["matches"][0]["match"]["state"] = Value::Null;
        assert_eq!(
            ctx.decode::<Tournament>(&payload),
            Err(DecodeError::MissingField {
                entity: "match",
                field: "state",
            })
        );
    }

    // -----------------------------------------------------------------------
    // Wire enums
    // -----------------------------------------------------------------------

    #[test]
    fn wire_spellings_round_trip() {
        for (wire, kind) in [
            ("single elimination", TournamentType::SingleElimination),
            ("double elimination", TournamentType::DoubleElimination),
            ("round robin", TournamentType::RoundRobin),
            ("swiss", TournamentType::Swiss),
        ] {
            assert_eq!(TournamentType::from_wire(wire), Some(kind));
            assert_eq!(kind.as_str(), wire);
        }
        assert_eq!(TournamentType::from_wire("ladder"), None);
        assert_eq!(MatchState::from_wire(MatchState::Open.as_str()), Some(MatchState::Open));
        assert_eq!(
            TournamentState::from_wire(TournamentState::AwaitingReview.as_str()),
            Some(TournamentState::AwaitingReview)
        );
        assert_eq!(RankedBy::from_wire(RankedBy::Custom.as_str()), Some(RankedBy::Custom));
    }

    #[test]
    fn serialized_enums_use_wire_spellings() {
        assert_eq!(
            serde_json::to_value(TournamentType::RoundRobin).unwrap(),
            json!("round robin")
        );
        assert_eq!(serde_json::to_value(MatchState::Open).unwrap(), json!("open"));
        assert_eq!(
            serde_json::to_value(TournamentState::AwaitingReview).unwrap(),
            json!("awaiting_review")
        );
    }

    // -----------------------------------------------------------------------
    // Concurrency
    // -----------------------------------------------------------------------

    #[test]
    fn concurrent_decodes_yield_equal_independent_instances() {
        let ctx = Adapters::new();
        let payload = tournament_payload();
        let (first, second) = std::thread::scope(|scope| {
            let a = scope.spawn(|| ctx.decode::<Tournament>(&payload).unwrap());
            let b = scope.spawn(|| ctx.decode::<Tournament>(&payload).unwrap());
            (a.join().unwrap(), b.join().unwrap())
        });
        assert_eq!(first, second);
    }
}
