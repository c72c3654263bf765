//! Application state for CampusGuide
//!
//! This crate holds the stores the screens read and mutate: local accounts
//! and the current session, the favourites list and the theme preference.
//! All durable state goes through the `storage` key-value contract.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod account;
pub mod favourites;
pub mod password;
pub mod session;
pub mod theme;
pub mod validation;

pub use account::{AccountStore, AuthError, User};
pub use favourites::{FavouriteEvent, FavouriteItem, FavouritesStore};
pub use password::HashingConfig;
pub use session::SessionState;
pub use theme::{Palette, ThemeStore};
