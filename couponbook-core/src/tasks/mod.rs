pub mod cooldown_clock;
