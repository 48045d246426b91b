pub mod league_config;
pub mod player_stat;
pub mod team;
