//! Cooperative modal UI contract.
//!
//! A surface renders to lines at a given width, receives decoded key
//! events, and completes exactly once. The host owns the render loop
//! and the terminal; this module owns none of the escape sequences,
//! only the contract between them.

pub mod handle;
pub mod input;
pub mod picker;
pub mod surface;
pub mod theme;

pub use handle::{NotifyLevel, NullUi, SurfaceBuilder, UiHandle, WidgetPlacement};
pub use input::{decode, InputEvent, Keybindings};
pub use picker::{LineEditor, OptionPicker, PickerItem, PickerMode};
pub use surface::{Done, ModalSession, Surface, SurfaceHandle};
pub use theme::{TextStyle, Theme};
