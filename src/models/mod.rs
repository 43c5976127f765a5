pub mod admin_model;
pub mod bet_model;
pub mod tables;

pub use admin_model::{Admin, AdminChanges};
pub use bet_model::{
    Bet, BetAggregate, BetChanges, BetStatus, BetWithOdds, Category, CategorySummary,
    CategoryWithStats, NewBet, NewOdd, Odd, OddResult, OddWithVotes, Vote,
};
