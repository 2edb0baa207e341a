//! In-memory betting state of one room's table.

use rand::{Rng, rngs::StdRng};

use crate::{
    ids::{RoomCode, UserId},
    protocol::{BetPlayer, FrameOutcome, IgnoreReason, PlayerInfo, ServerFrame},
    store::Member,
};

/// Bet, confirmation and chip balance of one seated player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerBetState {
    pub bet: i64,
    pub confirmed: bool,
    pub total_chips: i64,
}

impl PlayerBetState {
    pub fn new(total_chips: i64) -> Self {
        Self {
            bet: 0,
            confirmed: false,
            total_chips,
        }
    }
}

#[derive(Debug, Clone)]
struct Seat {
    user_id: UserId,
    name: String,
    state: PlayerBetState,
}

/// Result of applying one bet command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BetOutcome {
    /// The bet was stored; `delta` chips moved from the stack into the pot
    /// (negative when chips were refunded)
    Applied { delta: i64 },
    Ignored(IgnoreReason),
}

impl BetOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, BetOutcome::Applied { .. })
    }
}

impl From<BetOutcome> for FrameOutcome {
    fn from(outcome: BetOutcome) -> Self {
        match outcome {
            BetOutcome::Applied { .. } => FrameOutcome::Applied,
            BetOutcome::Ignored(reason) => FrameOutcome::Ignored(reason),
        }
    }
}

/// Betting table for one room.
///
/// Seats keep the order in which players were first seen. The dealer is
/// drawn once from the table's own random source and never changes.
#[derive(Debug)]
pub struct GameTable {
    room: RoomCode,
    seats: Vec<Seat>,
    dealer_id: Option<UserId>,
    rng: StdRng,
}

impl GameTable {
    pub fn new(room: RoomCode, rng: StdRng) -> Self {
        Self {
            room,
            seats: Vec::new(),
            dealer_id: None,
            rng,
        }
    }

    pub fn room(&self) -> &RoomCode {
        &self.room
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    pub fn dealer_id(&self) -> Option<UserId> {
        self.dealer_id
    }

    pub fn player(&self, user_id: UserId) -> Option<&PlayerBetState> {
        self.seat(user_id).map(|seat| &seat.state)
    }

    /// Seat ids in seating order
    pub fn player_ids(&self) -> Vec<UserId> {
        self.seats.iter().map(|seat| seat.user_id).collect()
    }

    fn seat(&self, user_id: UserId) -> Option<&Seat> {
        self.seats.iter().find(|seat| seat.user_id == user_id)
    }

    fn seat_mut(&mut self, user_id: UserId) -> Option<&mut Seat> {
        self.seats.iter_mut().find(|seat| seat.user_id == user_id)
    }

    /// Seat a player with `starting_chips` unless already seated.
    ///
    /// Existing seats keep their bet and chips, so reconnecting never resets
    /// a player. Returns whether a new seat was created.
    pub fn seat_player(&mut self, user_id: UserId, name: &str, starting_chips: i64) -> bool {
        if self.seat(user_id).is_some() {
            return false;
        }
        self.seats.push(Seat {
            user_id,
            name: name.to_string(),
            state: PlayerBetState::new(starting_chips),
        });
        true
    }

    /// Seat every member not yet at the table. Returns how many were added.
    pub fn seat_members(&mut self, members: &[Member], starting_chips: i64) -> usize {
        members
            .iter()
            .filter(|m| self.seat_player(m.user_id, &m.name, starting_chips))
            .count()
    }

    /// Pick the dealer if none is set yet and return it.
    ///
    /// The choice is uniform over the seated players. Calling again returns
    /// the same id. `None` only while the table has no players.
    pub fn ensure_dealer(&mut self) -> Option<UserId> {
        if let Some(dealer) = self.dealer_id {
            return Some(dealer);
        }
        if self.seats.is_empty() {
            return None;
        }

        let index = self.rng.random_range(0..self.seats.len());
        let seat = &mut self.seats[index];
        seat.state.bet = 0;
        seat.state.confirmed = true;
        self.dealer_id = Some(seat.user_id);

        log::info!("room {}: dealer is user {}", self.room, seat.user_id);
        self.dealer_id
    }

    /// Apply a bet command from `user_id`.
    ///
    /// Raises draw the difference from the player's stack and require enough
    /// chips. Lowering a bet refunds the difference in full.
    pub fn apply_bet(&mut self, user_id: UserId, bet: i64, confirm: bool) -> BetOutcome {
        if self.dealer_id == Some(user_id) {
            return BetOutcome::Ignored(IgnoreReason::DealerBet);
        }
        if bet < 0 {
            return BetOutcome::Ignored(IgnoreReason::NegativeBet);
        }
        let Some(seat) = self.seat_mut(user_id) else {
            return BetOutcome::Ignored(IgnoreReason::UnknownPlayer);
        };

        let state = &mut seat.state;
        let delta = bet - state.bet;
        if delta > 0 {
            if state.total_chips < delta {
                return BetOutcome::Ignored(IgnoreReason::InsufficientChips);
            }
            state.total_chips -= delta;
        } else if delta < 0 {
            state.total_chips += -delta;
        }
        state.bet = bet;
        state.confirmed = confirm;

        BetOutcome::Applied { delta }
    }

    /// True when every non-dealer player has confirmed
    pub fn all_confirmed(&self) -> bool {
        self.seats
            .iter()
            .filter(|seat| Some(seat.user_id) != self.dealer_id)
            .all(|seat| seat.state.confirmed)
    }

    /// `bet_state` frame for the whole table
    pub fn bet_state(&self) -> ServerFrame {
        ServerFrame::BetState {
            room_code: self.room.clone(),
            players: self
                .seats
                .iter()
                .map(|seat| BetPlayer {
                    user_id: seat.user_id,
                    name: seat.name.clone(),
                    bet: seat.state.bet,
                    confirmed: seat.state.confirmed,
                    total_chips: seat.state.total_chips,
                })
                .collect(),
            all_confirmed: self.all_confirmed(),
        }
    }

    /// `player_order` frame in seating order.
    ///
    /// Ready and host flags come from `members`; players who are no longer
    /// members keep their seat and report both flags as false.
    pub fn player_order(&self, members: &[Member]) -> ServerFrame {
        let players = self
            .seats
            .iter()
            .map(|seat| {
                let member = members.iter().find(|m| m.user_id == seat.user_id);
                PlayerInfo {
                    user_id: seat.user_id,
                    name: seat.name.clone(),
                    is_ready: member.is_some_and(|m| m.is_ready),
                    is_host: member.is_some_and(|m| m.is_host),
                    is_dealer: Some(seat.user_id) == self.dealer_id,
                }
            })
            .collect();
        ServerFrame::PlayerOrder { players }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn table() -> GameTable {
        GameTable::new(
            RoomCode::parse("123456").unwrap(),
            StdRng::seed_from_u64(7),
        )
    }

    /// Table where user 1 is the dealer and user 2 a regular player
    fn dealt_table() -> GameTable {
        let mut table = table();
        table.seat_player(1, "dealer", 1000);
        assert_eq!(table.ensure_dealer(), Some(1));
        table.seat_player(2, "player", 1000);
        table
    }

    #[test]
    fn test_seat_player_keeps_existing_state() {
        let mut table = dealt_table();
        table.apply_bet(2, 200, false);

        assert!(!table.seat_player(2, "player", 1000));
        assert_eq!(
            table.player(2),
            Some(&PlayerBetState {
                bet: 200,
                confirmed: false,
                total_chips: 800
            })
        );
    }

    #[test]
    fn test_seat_members_preserves_member_order() {
        let mut table = table();
        let members = vec![
            Member {
                user_id: 5,
                name: "host".into(),
                is_ready: true,
                is_host: true,
            },
            Member {
                user_id: 3,
                name: "guest".into(),
                is_ready: false,
                is_host: false,
            },
        ];

        assert_eq!(table.seat_members(&members, 1000), 2);
        assert_eq!(table.seat_members(&members, 1000), 0);
        assert_eq!(table.player_ids(), vec![5, 3]);
    }

    #[test]
    fn test_dealer_is_sticky() {
        let mut table = table();
        for id in 1..=6 {
            table.seat_player(id, &format!("p{id}"), 1000);
        }

        let first = table.ensure_dealer();
        assert!(first.is_some());
        assert_eq!(table.ensure_dealer(), first);

        let dealer = table.player(first.unwrap()).unwrap();
        assert_eq!(dealer.bet, 0);
        assert!(dealer.confirmed);
    }

    #[test]
    fn test_no_dealer_without_players() {
        let mut table = table();
        assert_eq!(table.ensure_dealer(), None);
        assert_eq!(table.dealer_id(), None);
    }

    #[test]
    fn test_same_seed_same_dealer() {
        let pick = |seed| {
            let mut table = GameTable::new(
                RoomCode::parse("abc").unwrap(),
                StdRng::seed_from_u64(seed),
            );
            for id in 1..=8 {
                table.seat_player(id, "p", 1000);
            }
            table.ensure_dealer()
        };
        assert_eq!(pick(42), pick(42));
    }

    #[test]
    fn test_raise_and_refund() {
        let mut table = dealt_table();

        assert_eq!(table.apply_bet(2, 300, true), BetOutcome::Applied { delta: 300 });
        assert_eq!(table.player(2).unwrap().total_chips, 700);
        assert!(table.all_confirmed());

        assert_eq!(table.apply_bet(2, 100, true), BetOutcome::Applied { delta: -200 });
        assert_eq!(table.player(2).unwrap().total_chips, 900);

        assert_eq!(table.apply_bet(2, 100, false), BetOutcome::Applied { delta: 0 });
        assert_eq!(table.player(2).unwrap().total_chips, 900);
        assert!(!table.all_confirmed());
    }

    #[test]
    fn test_rejected_bets_leave_state_untouched() {
        let mut table = dealt_table();
        let before = *table.player(2).unwrap();

        assert_eq!(
            table.apply_bet(2, -1, true),
            BetOutcome::Ignored(IgnoreReason::NegativeBet)
        );
        assert_eq!(
            table.apply_bet(2, 1001, true),
            BetOutcome::Ignored(IgnoreReason::InsufficientChips)
        );
        assert_eq!(
            table.apply_bet(1, 50, true),
            BetOutcome::Ignored(IgnoreReason::DealerBet)
        );
        assert_eq!(
            table.apply_bet(99, 10, true),
            BetOutcome::Ignored(IgnoreReason::UnknownPlayer)
        );

        assert_eq!(table.player(2), Some(&before));
        let dealer = table.player(1).unwrap();
        assert_eq!((dealer.bet, dealer.confirmed), (0, true));
    }

    #[test]
    fn test_all_in_is_allowed() {
        let mut table = dealt_table();
        assert!(table.apply_bet(2, 1000, true).is_applied());
        assert_eq!(table.player(2).unwrap().total_chips, 0);
    }

    #[test]
    fn test_all_confirmed_is_vacuous_for_dealer_only() {
        let mut table = table();
        assert!(table.all_confirmed());
        table.seat_player(1, "dealer", 1000);
        table.ensure_dealer();
        assert!(table.all_confirmed());
    }

    #[test]
    fn test_bet_state_frame() {
        let mut table = dealt_table();
        table.apply_bet(2, 300, true);

        let ServerFrame::BetState {
            players,
            all_confirmed,
            ..
        } = table.bet_state()
        else {
            panic!("expected bet_state");
        };
        assert!(all_confirmed);
        assert_eq!(players.len(), 2);
        assert_eq!(players[1].total_chips, 700);
        assert_eq!(players[0].bet, 0);
    }

    #[test]
    fn test_player_order_flags() {
        let table = dealt_table();
        let members = vec![Member {
            user_id: 2,
            name: "player".into(),
            is_ready: true,
            is_host: true,
        }];

        let ServerFrame::PlayerOrder { players } = table.player_order(&members) else {
            panic!("expected player_order");
        };
        assert!(players[0].is_dealer);
        assert!(!players[0].is_host);
        assert!(players[1].is_host && players[1].is_ready && !players[1].is_dealer);
    }
}
