// Chip-level drivers, board-independent.
//
// Pin assignments and multi-chain wiring live in board/.

pub mod sipo;
