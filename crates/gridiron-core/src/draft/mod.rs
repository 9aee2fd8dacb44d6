// Draft tracking: positions, roster slots, picks, and the snake-draft session.

pub mod pick;
pub mod roster;
pub mod state;
