//! User interface: key grid rendering, text screens and touch edges.
//!
//! ## Components
//!
//! - **layout**: key and button geometry on the 320×240 panel
//! - **keypad**: background colour resolution and key drawing
//! - **display**: utility and error screens
//! - **input_logic**: per-key press/release edge tracking

pub mod display;
pub mod input_logic;
pub mod keypad;
pub mod layout;
